#![cfg(target_arch = "wasm32")]
use groove_core::{title_from_id, Analysis, AssetPaths, FrameStore, PlaybackClock, Session};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod audio;
mod constants;
mod dom;
mod events;
mod fetch;
mod frame;
mod input;
mod overlay;
mod render;
mod skeleton;

use constants::*;

/// What to show, from the page URL:
/// `?track=<analysis/audio id>&keypoints=<sequence id>&frames=<n>&mesh=1&fps=<n>&root=<dir>`.
/// `track=none` runs without audio on the stepped clock.
struct PageParams {
    track: Option<String>,
    keypoints: Option<String>,
    frames: usize,
    mesh: bool,
    fps: f64,
    paths: AssetPaths,
}

impl PageParams {
    fn from_search(search: &str) -> Self {
        let param = |key: &str| input::query_param(search, key).filter(|v| !v.is_empty());
        let track = match param("track") {
            Some(t) if t == "none" => None,
            Some(t) => Some(t),
            None => Some(DEFAULT_TRACK.to_string()),
        };
        Self {
            track,
            keypoints: param("keypoints"),
            frames: param("frames")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FRAME_COUNT),
            mesh: param("mesh").map_or(false, |v| v == "1" || v == "true"),
            fps: param("fps")
                .and_then(|v| v.parse().ok())
                .unwrap_or(groove_core::constants::DEFAULT_FPS),
            paths: param("root").map_or_else(AssetPaths::default, AssetPaths::new),
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("groove-web starting");

    static STARTED: AtomicBool = AtomicBool::new(false);
    if STARTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas = dom::canvas_by_id(&document, GPU_CANVAS_ID)?;
    dom::wire_canvas_resize(&canvas);

    let params = PageParams::from_search(&dom::location_search());
    let paths = &params.paths;
    let config = fetch::load_config(paths).await;

    let analysis = match &params.track {
        Some(id) => {
            overlay::set_title(&document, &title_from_id(id));
            fetch::load_analysis(paths, id).await.unwrap_or_else(|e| {
                log::warn!("[loader] analysis '{}' unavailable: {:#}", id, e);
                Analysis::default()
            })
        }
        None => Analysis::default(),
    };

    let keypoints = match &params.keypoints {
        Some(seq) => {
            fetch::load_frames(params.frames, "keypoints", |i| {
                fetch::load_keypoint_frame(paths, seq, i)
            })
            .await
        }
        None => FrameStore::new(0),
    };
    let (topology, meshes) = if params.mesh {
        let topology = fetch::load_topology(paths)
            .await
            .map_err(|e| log::warn!("[loader] topology unavailable: {:#}", e))
            .ok();
        let meshes =
            fetch::load_frames(params.frames, "meshes", |i| fetch::load_mesh_frame(paths, i)).await;
        (topology, meshes)
    } else {
        (None, FrameStore::new(0))
    };
    overlay::hide_loading(&document);

    let audio = params.track.as_ref().and_then(|id| {
        audio::AudioSurface::new(&paths.audio(id))
            .map_err(|e| log::warn!("[audio] {:#}", e))
            .ok()
    });
    let clock = if audio.is_some() {
        PlaybackClock::external()
    } else {
        PlaybackClock::stepped(params.fps, params.frames)
    };
    let session = Session::new(analysis, config, clock).with_frame_fps(params.fps);

    let skeleton = if params.keypoints.is_some() || params.mesh {
        dom::canvas_by_id(&document, SKELETON_CANVAS_ID)
            .and_then(skeleton::SkeletonOverlay::new)
            .map_err(|e| log::warn!("[skeleton] {:#}", e))
            .ok()
    } else {
        None
    };

    let mut gpu = frame::init_gpu(&canvas).await;
    if let (Some(g), Some(t)) = (&mut gpu, &topology) {
        g.set_topology(t);
    }

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        session,
        audio,
        gpu,
        skeleton,
        keypoints,
        meshes,
        topology,
        canvas,
        document: document.clone(),
        shown_mesh: None,
    }));

    events::wire_global_keydown(frame_ctx.clone());
    events::wire_timeline(&document, frame_ctx.clone());
    let handle = frame::start_loop(frame_ctx.clone());
    events::wire_pagehide(handle, frame_ctx);
    Ok(())
}
