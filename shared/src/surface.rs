use crate::capture::SurfaceOp;
use crate::Point;

/// Something a stroke can be drawn on. `line_to` strokes the segment immediately.
pub trait Surface {
    fn clear(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);

    fn apply(&mut self, ops: &[SurfaceOp]) {
        for op in ops {
            match *op {
                SurfaceOp::Clear => self.clear(),
                SurfaceOp::MoveTo(point) => self.move_to(point),
                SurfaceOp::LineTo(point) => self.line_to(point),
            }
        }
    }
}
