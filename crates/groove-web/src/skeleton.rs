//! 2D canvas overlay: the video still for the current frame with its
//! detected skeleton on top.

use crate::constants::*;
use crate::input::scale_to_canvas;
use groove_core::constants::KEYPOINT_MIN_CONFIDENCE;
use groove_core::KeypointFrame;
use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct SkeletonOverlay {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
    shown: Option<usize>,
}

impl SkeletonOverlay {
    pub fn new(canvas: web::HtmlCanvasElement) -> anyhow::Result<Self> {
        canvas.set_width(SOURCE_WIDTH as u32);
        canvas.set_height(SOURCE_HEIGHT as u32);
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .ok_or_else(|| anyhow::anyhow!("no 2d context"))?
            .dyn_into::<web::CanvasRenderingContext2d>()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self {
            canvas,
            ctx,
            shown: None,
        })
    }

    /// Redraw for `index`; a no-op when that frame is already on screen.
    /// Either part may be missing; the still is drawn without a skeleton and
    /// a skeleton without its still.
    pub fn draw(
        &mut self,
        index: usize,
        image: Option<&web::HtmlImageElement>,
        keypoints: Option<&KeypointFrame>,
    ) {
        if self.shown == Some(index) {
            return;
        }
        self.shown = Some(index);
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        if let Some(img) = image {
            _ = self
                .ctx
                .draw_image_with_html_image_element_and_dw_and_dh(img, 0.0, 0.0, w, h);
        }
        let Some(frame) = keypoints else {
            return;
        };
        let to_canvas = |x: f32, y: f32| {
            let (cx, cy) =
                scale_to_canvas(x, y, (SOURCE_WIDTH, SOURCE_HEIGHT), (w as f32, h as f32));
            (cx as f64, cy as f64)
        };

        self.ctx.set_stroke_style_str(BONE_COLOR);
        self.ctx.set_line_width(BONE_WIDTH);
        for (a, b) in frame.visible_bones(KEYPOINT_MIN_CONFIDENCE) {
            let (ax, ay) = to_canvas(a.x, a.y);
            let (bx, by) = to_canvas(b.x, b.y);
            self.ctx.begin_path();
            self.ctx.move_to(ax, ay);
            self.ctx.line_to(bx, by);
            self.ctx.stroke();
        }

        self.ctx.set_fill_style_str(JOINT_COLOR);
        for kp in frame.visible_joints(KEYPOINT_MIN_CONFIDENCE) {
            let (x, y) = to_canvas(kp.x, kp.y);
            self.ctx.begin_path();
            _ = self.ctx.arc(x, y, JOINT_RADIUS, 0.0, TAU);
            self.ctx.fill();
        }
    }

    /// Force the next [`draw`](Self::draw) to repaint.
    #[inline]
    pub fn invalidate(&mut self) {
        self.shown = None;
    }
}
