use crate::audio::{AudioEvent, AudioSurface};
use crate::fetch::{KeypointAsset, MeshAsset};
use crate::overlay;
use crate::render;
use crate::skeleton::SkeletonOverlay;
use groove_core::{FrameStore, Session, Topology};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub session: Session,
    pub audio: Option<AudioSurface>,
    pub gpu: Option<render::GpuState>,
    pub skeleton: Option<SkeletonOverlay>,
    pub keypoints: FrameStore<KeypointAsset>,
    pub meshes: FrameStore<MeshAsset>,
    pub topology: Option<Topology>,
    pub canvas: web::HtmlCanvasElement,
    pub document: web::Document,
    pub shown_mesh: Option<usize>,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let now_ms = instant::now();
        if let Some(audio) = &self.audio {
            for ev in audio.drain_events() {
                match ev {
                    AudioEvent::Loaded { duration } => {
                        log::info!("[audio] duration {:.2}s", duration);
                        self.session.clock_mut().set_duration(duration);
                    }
                    AudioEvent::Play => self.session.play(),
                    AudioEvent::Pause => self.session.pause(),
                    AudioEvent::Ended => self.session.on_ended(),
                }
            }
        }

        let position = self.audio.as_ref().map(AudioSurface::position);
        let out = self.session.frame(now_ms, position);

        let index = out.frame_index;
        let mesh = self.meshes.get(index);
        if let Some(sk) = &mut self.skeleton {
            // keypoint sequences bring their own stills; mesh stills otherwise
            match self.keypoints.get(index) {
                Some(kp) => sk.draw(index, kp.image.as_ref(), kp.keypoints.as_ref()),
                None if self.keypoints.is_empty() => {
                    sk.draw(index, mesh.and_then(|m| m.image.as_ref()), None)
                }
                None => sk.draw(index, None, None),
            }
        }
        if let (Some(gpu), Some(topology)) = (&mut self.gpu, &self.topology) {
            if self.shown_mesh != Some(index) {
                gpu.set_mesh_frame(mesh.and_then(|m| m.people.as_ref()), topology);
                self.shown_mesh = Some(index);
            }
        }
        overlay::update_time(&self.document, out.time, self.session.clock().duration());

        if let Some(g) = &mut self.gpu {
            g.resize_if_needed(self.canvas.width(), self.canvas.height());
            let max_radius = self.session.synth().config().max_radius;
            match g.render(&out, max_radius) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => g.reconfigure(),
                Err(e) => log::error!("render error: {:?}", e),
            }
        }
    }

    pub fn toggle_play(&mut self) {
        match &self.audio {
            // the element's play/pause events reach the clock on the next frame
            Some(audio) => audio.toggle(),
            None => self.session.toggle(),
        }
    }

    pub fn seek(&mut self, t: f64) {
        let t = self.session.seek(t);
        if let Some(audio) = &self.audio {
            audio.set_position(t);
        }
        if let Some(sk) = &mut self.skeleton {
            sk.invalidate();
        }
        self.shown_mesh = None;
    }

    pub fn seek_by(&mut self, delta: f64) {
        let t = self.session.clock().time() + delta;
        self.seek(t);
    }

    pub fn toggle_boundary(&mut self) {
        let policy = self.session.boundary_policy().toggled();
        self.session.set_boundary_policy(policy);
    }

    /// Release the audio element and GPU resources.
    pub fn teardown(&mut self) {
        self.session.pause();
        if let Some(mut audio) = self.audio.take() {
            audio.unload();
        }
        self.gpu = None;
        self.skeleton = None;
        log::info!("[frame] torn down");
    }
}

pub async fn init_gpu(canvas: &web::HtmlCanvasElement) -> Option<render::GpuState> {
    match render::GpuState::new(canvas).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("WebGPU init error: {:?}", e);
            None
        }
    }
}

/// Running `requestAnimationFrame` loop; [`LoopHandle::stop`] cancels it.
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
    raf_id: Rc<Cell<Option<i32>>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl LoopHandle {
    pub fn stop(&self) {
        if !self.running.replace(false) {
            return;
        }
        if let (Some(id), Some(w)) = (self.raf_id.take(), web::window()) {
            _ = w.cancel_animation_frame(id);
        }
        // breaks the closure's reference to itself
        self.tick.borrow_mut().take();
        log::info!("[frame] loop stopped");
    }
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) -> Option<i32> {
    let w = web::window()?;
    let guard = tick.borrow();
    let closure = guard.as_ref()?;
    w.request_animation_frame(closure.as_ref().unchecked_ref()).ok()
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) -> LoopHandle {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let running = Rc::new(Cell::new(true));
    let raf_id = Rc::new(Cell::new(None));

    let tick_clone = tick.clone();
    let running_tick = running.clone();
    let raf_tick = raf_id.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !running_tick.get() {
            return;
        }
        frame_ctx.borrow_mut().frame();
        raf_tick.set(request_frame(&tick_clone));
    }) as Box<dyn FnMut()>));
    raf_id.set(request_frame(&tick));

    LoopHandle {
        running,
        raf_id,
        tick,
    }
}
