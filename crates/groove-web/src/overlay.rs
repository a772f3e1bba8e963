use crate::constants::*;
use crate::dom;
use groove_core::{format_time, LoadProgress};
use web_sys as web;

pub fn show_loading(document: &web::Document, label: &str, progress: &LoadProgress) {
    dom::set_visible(document, LOADING_ID, true);
    let text = format!(
        "Loading {}: {:.0}% ({}/{}{})",
        label,
        progress.percent(),
        progress.settled(),
        progress.expected,
        if progress.failed > 0 {
            format!(", {} failed", progress.failed)
        } else {
            String::new()
        }
    );
    dom::set_text(document, LOADING_TEXT_ID, &text);
}

#[inline]
pub fn hide_loading(document: &web::Document) {
    dom::set_visible(document, LOADING_ID, false);
}

pub fn set_title(document: &web::Document, title: &str) {
    dom::set_text(document, TITLE_ID, title);
    document.set_title(&format!("{} · groove-viz", title));
}

/// Time label and timeline fill for the current position.
pub fn update_time(document: &web::Document, time: f64, duration: Option<f64>) {
    let label = match duration {
        Some(d) => format!("{} / {}", format_time(time), format_time(d)),
        None => format_time(time),
    };
    dom::set_text(document, TIME_LABEL_ID, &label);
    if let Some(el) = document.get_element_by_id(TIMELINE_FILL_ID) {
        let pct = duration
            .filter(|d| *d > 0.0)
            .map_or(0.0, |d| (time / d * 100.0).clamp(0.0, 100.0));
        _ = el.set_attribute("style", &format!("width:{:.2}%", pct));
    }
}

#[inline]
pub fn toggle_help(document: &web::Document) {
    let shown = dom::is_visible(document, HELP_ID);
    dom::set_visible(document, HELP_ID, !shown);
}
