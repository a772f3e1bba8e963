use crate::constants::TIMELINE_ID;
use crate::dom;
use crate::frame::{FrameContext, LoopHandle};
use crate::input::{self, KeyAction};
use crate::overlay;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub fn handle_global_keydown(ev: &web::KeyboardEvent, ctx: &Rc<RefCell<FrameContext>>) {
    if ev.repeat() && ev.key() == " " {
        return;
    }
    let Some(action) = input::action_for_key(&ev.key()) else {
        return;
    };
    ev.prevent_default();
    log::debug!("[keys] {:?}", action);
    let mut ctx = ctx.borrow_mut();
    match action {
        KeyAction::TogglePlay => ctx.toggle_play(),
        KeyAction::SeekBy(delta) => ctx.seek_by(delta),
        KeyAction::SeekTo(t) => ctx.seek(t),
        KeyAction::ToggleBoundary => ctx.toggle_boundary(),
        KeyAction::ToggleHelp => overlay::toggle_help(&ctx.document),
    }
}

pub fn wire_global_keydown(ctx: Rc<RefCell<FrameContext>>) {
    let closure = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        handle_global_keydown(&ev, &ctx);
    }) as Box<dyn FnMut(_)>);
    if let Some(w) = web::window() {
        _ = w.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

/// Clicking the timeline seeks to the matching fraction of the track.
pub fn wire_timeline(document: &web::Document, ctx: Rc<RefCell<FrameContext>>) {
    let doc = document.clone();
    dom::add_click_listener(document, TIMELINE_ID, move |ev| {
        let Some(el) = doc.get_element_by_id(TIMELINE_ID) else {
            return;
        };
        let (x, width) = dom::click_offset(&ev, &el);
        let mut ctx = ctx.borrow_mut();
        let duration = ctx.session.clock().duration().unwrap_or(0.0);
        if let Some(t) = input::timeline_time(x, width, duration) {
            ctx.seek(t);
        }
    });
}

/// Stop the loop and release resources when the page goes away.
pub fn wire_pagehide(handle: LoopHandle, ctx: Rc<RefCell<FrameContext>>) {
    let callback = Closure::once_into_js(move || {
        handle.stop();
        ctx.borrow_mut().teardown();
    });
    if let Some(w) = web::window() {
        _ = w.add_event_listener_with_callback("pagehide", callback.unchecked_ref());
    }
}
