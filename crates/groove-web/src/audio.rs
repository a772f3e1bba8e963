//! HTML audio element wrapper. Media events are queued and drained by the
//! frame loop so the clock only changes on the animation tick.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioEvent {
    Loaded { duration: f64 },
    Play,
    Pause,
    Ended,
}

pub struct AudioSurface {
    element: web::HtmlAudioElement,
    events: Rc<RefCell<Vec<AudioEvent>>>,
    listeners: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl AudioSurface {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let element = web::HtmlAudioElement::new_with_src(url)
            .map_err(|e| anyhow::anyhow!("audio element: {:?}", e))?;
        element.set_preload("auto");
        let mut surface = Self {
            element,
            events: Rc::new(RefCell::new(Vec::new())),
            listeners: Vec::new(),
        };
        surface.listen("loadedmetadata", |el| AudioEvent::Loaded {
            duration: el.duration(),
        });
        surface.listen("play", |_| AudioEvent::Play);
        surface.listen("pause", |_| AudioEvent::Pause);
        surface.listen("ended", |_| AudioEvent::Ended);
        log::info!("[audio] source {}", url);
        Ok(surface)
    }

    fn listen(&mut self, name: &'static str, make: fn(&web::HtmlAudioElement) -> AudioEvent) {
        let events = self.events.clone();
        let el = self.element.clone();
        let closure = Closure::wrap(Box::new(move || {
            events.borrow_mut().push(make(&el));
        }) as Box<dyn FnMut()>);
        _ = self
            .element
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        self.listeners.push((name, closure));
    }

    /// Events received since the last call, oldest first.
    pub fn drain_events(&self) -> Vec<AudioEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.element.current_time()
    }

    #[inline]
    pub fn set_position(&self, t: f64) {
        self.element.set_current_time(t);
    }

    /// Known duration; `None` until metadata has loaded.
    pub fn duration(&self) -> Option<f64> {
        let d = self.element.duration();
        (d.is_finite() && d > 0.0).then_some(d)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        !self.element.paused() && !self.element.ended()
    }

    pub fn play(&self) {
        let promise = match self.element.play() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("[audio] play failed: {:?}", e);
                return;
            }
        };
        // autoplay policies reject the promise until the page has had a user gesture
        spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("[audio] play rejected: {:?}", e);
            }
        });
    }

    pub fn pause(&self) {
        _ = self.element.pause();
    }

    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop playback, detach listeners and release the media resource.
    pub fn unload(&mut self) {
        self.pause();
        for (name, closure) in self.listeners.drain(..) {
            _ = self
                .element
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        _ = self.element.remove_attribute("src");
        self.element.load();
        self.events.borrow_mut().clear();
        log::info!("[audio] unloaded");
    }
}

impl Drop for AudioSurface {
    fn drop(&mut self) {
        if !self.listeners.is_empty() {
            self.unload();
        }
    }
}
