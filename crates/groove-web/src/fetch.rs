//! Static asset loading. Every per-frame request is issued at once and
//! settles on its own; a failed frame leaves an empty slot.

use crate::dom;
use crate::overlay;
use futures::future::join_all;
use groove_core::{
    mesh_frame_from_json_str, settle_frame_parts, Analysis, AssetPaths, FrameStore, KeypointFrame,
    LoadProgress, MeshFrame, SynthConfig, Topology,
};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

fn js_err(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}

pub async fn fetch_text(url: &str) -> anyhow::Result<String> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let resp: web::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_err)?
        .dyn_into()
        .map_err(js_err)?;
    if !resp.ok() {
        anyhow::bail!("{}: HTTP {}", url, resp.status());
    }
    let body = JsFuture::from(resp.text().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    body.as_string()
        .ok_or_else(|| anyhow::anyhow!("{}: body is not text", url))
}

pub async fn load_image(url: &str) -> anyhow::Result<web::HtmlImageElement> {
    let img = web::HtmlImageElement::new().map_err(js_err)?;
    img.set_src(url);
    JsFuture::from(img.decode())
        .await
        .map_err(|e| anyhow::anyhow!("{}: {:?}", url, e))?;
    Ok(img)
}

pub async fn load_analysis(paths: &AssetPaths, id: &str) -> anyhow::Result<Analysis> {
    let text = fetch_text(&paths.analysis(id)).await?;
    let analysis = Analysis::from_json_str(&text)?;
    log::info!(
        "[loader] analysis '{}': {} spectral, {} pitch, {} beats, {} onsets",
        id,
        analysis.spectral.len(),
        analysis.pitch.len(),
        analysis.beats.len(),
        analysis.onsets.len()
    );
    Ok(analysis)
}

/// Tuning overrides from `config.json`; defaults when absent or invalid.
pub async fn load_config(paths: &AssetPaths) -> SynthConfig {
    let text = match fetch_text(&paths.config()).await {
        Ok(t) => t,
        Err(e) => {
            log::info!("[loader] no config ({:#}), using defaults", e);
            return SynthConfig::default();
        }
    };
    match SynthConfig::from_json_str(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("[loader] ignoring invalid config: {}", e);
            SynthConfig::default()
        }
    }
}

/// Load `count` frames concurrently, reporting progress on the loading overlay.
pub async fn load_frames<T, F, Fut>(count: usize, label: &str, load: F) -> FrameStore<T>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let progress = Rc::new(RefCell::new(LoadProgress::new(count)));
    let document = dom::window_document();
    if let Some(d) = &document {
        overlay::show_loading(d, label, &progress.borrow());
    }
    let pending = (0..count).map(|i| {
        let progress = progress.clone();
        let document = document.clone();
        let fut = load(i);
        async move {
            let res = fut.await;
            if let Err(e) = &res {
                log::warn!("[loader] {} frame {}: {:#}", label, i, e);
            }
            let mut p = progress.borrow_mut();
            p.record(res.is_ok());
            if let Some(d) = &document {
                overlay::show_loading(d, label, &p);
            }
            (i, res.ok())
        }
    });
    let mut store = FrameStore::new(count);
    for (i, value) in join_all(pending).await {
        if let Some(v) = value {
            store.insert(i, v);
        }
    }
    let p = *progress.borrow();
    log::info!(
        "[loader] {}: {} of {} frames loaded, {} failed",
        label,
        p.loaded,
        p.expected,
        p.failed
    );
    store
}

/// Keypoints plus the video still they were detected on.
pub struct KeypointAsset {
    pub keypoints: Option<KeypointFrame>,
    pub image: Option<web::HtmlImageElement>,
}

pub async fn load_keypoint_frame(
    paths: &AssetPaths,
    id: &str,
    index: usize,
) -> anyhow::Result<KeypointAsset> {
    let json_url = paths.keypoint_json(id, index);
    let image_url = paths.keypoint_image(id, index);
    let (text, image) = futures::join!(fetch_text(&json_url), load_image(&image_url));
    let doc = text.and_then(|t| Ok(KeypointFrame::from_json_str(&t)?));
    let (keypoints, image) = settle_frame_parts(index, doc, image)?;
    Ok(KeypointAsset {
        keypoints: keypoints.flatten(),
        image,
    })
}

/// Body meshes of one frame plus the video still they were fitted to.
pub struct MeshAsset {
    pub people: Option<MeshFrame>,
    pub image: Option<web::HtmlImageElement>,
}

pub async fn load_mesh_frame(paths: &AssetPaths, index: usize) -> anyhow::Result<MeshAsset> {
    let json_url = paths.mesh_json(index);
    let image_url = paths.mesh_image(index);
    let (text, image) = futures::join!(fetch_text(&json_url), load_image(&image_url));
    let doc = text.and_then(|t| Ok(mesh_frame_from_json_str(&t)?));
    let (people, image) = settle_frame_parts(index, doc, image)?;
    Ok(MeshAsset { people, image })
}

pub async fn load_topology(paths: &AssetPaths) -> anyhow::Result<Topology> {
    let text = fetch_text(&paths.topology()).await?;
    let topology = Topology::from_json_str(&text)?;
    log::info!(
        "[loader] topology: {} faces, {} vertices",
        topology.faces.len(),
        topology.num_vertices
    );
    Ok(topology)
}
