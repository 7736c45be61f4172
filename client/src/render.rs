use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use tracedrive_shared::{Point, Surface, CANVAS_HEIGHT, CANVAS_WIDTH};

pub const LINE_WIDTH: f64 = 5.0;
pub const STROKE_COLOR: &str = "#000000";

/// The drawing canvas as seen by the capture: fixed size, one black pencil.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        canvas.set_width(CANVAS_WIDTH);
        canvas.set_height(CANVAS_HEIGHT);
        ctx.set_line_width(LINE_WIDTH);
        ctx.set_line_cap("round");
        ctx.set_stroke_style_str(STROKE_COLOR);
        Self {
            ctx,
            width: CANVAS_WIDTH as f64,
            height: CANVAS_HEIGHT as f64,
        }
    }

    pub fn close_path(&self) {
        self.ctx.close_path();
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn move_to(&mut self, point: Point) {
        self.ctx.begin_path();
        self.ctx.move_to(point.x, point.y);
    }

    fn line_to(&mut self, point: Point) {
        self.ctx.line_to(point.x, point.y);
        self.ctx.stroke();
    }
}
