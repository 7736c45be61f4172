use tracedrive_shared::{
    Capture, CaptureState, PathRequest, Point, SendError, Surface, Transition, SEND_MIN_DISTANCE,
};

use crate::render::CanvasSurface;

/// Everything the pad's listeners share: the capture, the canvas it draws on and
/// where finished paths go.
pub struct Controller {
    pub capture: Capture,
    pub surface: CanvasSurface,
    pub server: String,
    pub debug: bool,
}

impl Controller {
    pub fn new(surface: CanvasSurface, server: String, debug: bool) -> Self {
        Self {
            capture: Capture::new(),
            surface,
            server,
            debug,
        }
    }

    fn apply(&mut self, transition: Transition) {
        if let Some(rejection) = transition.rejected {
            web_sys::console::log_1(&rejection.message().into());
        }
        self.surface.apply(&transition.ops);
    }

    pub fn begin(&mut self, point: Point) {
        let transition = self.capture.begin(point);
        if transition.rejected.is_none() {
            web_sys::console::log_1(
                &format!("Starting drawing at: ({}, {})", point.x, point.y).into(),
            );
        }
        self.apply(transition);
    }

    pub fn extend(&mut self, point: Point) {
        let transition = self.capture.extend(point);
        if self.debug && !transition.ops.is_empty() {
            web_sys::console::log_1(&format!("point ({}, {})", point.x, point.y).into());
        }
        self.apply(transition);
    }

    pub fn end(&mut self) {
        let was_drawing = self.capture.state() == CaptureState::Drawing;
        let transition = self.capture.end();
        self.surface.close_path();
        if was_drawing && self.capture.state() == CaptureState::Completed {
            web_sys::console::log_1(
                &format!(
                    "Line complete with {} points. Press 'R' to reset canvas for a new line.",
                    self.capture.stroke().len()
                )
                .into(),
            );
        }
        self.apply(transition);
    }

    pub fn reset(&mut self) {
        let transition = self.capture.reset();
        self.apply(transition);
        web_sys::console::log_1(&"Canvas cleared. You can now draw a new line.".into());
    }

    pub fn prepare_send(&self) -> Result<PathRequest, SendError> {
        let simplified = self.capture.simplified(SEND_MIN_DISTANCE)?;
        web_sys::console::log_1(
            &format!(
                "Simplified from {} to {} points (min distance: {SEND_MIN_DISTANCE}px)",
                simplified.input_len,
                simplified.points.len()
            )
            .into(),
        );
        Ok(PathRequest {
            path_points: simplified.points,
        })
    }
}
