use thiserror::Error;

use crate::simplify::{simplify_with_stats, Simplified};
use crate::{PathRequest, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Drawing,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CaptureEvent {
    Begin(Point),
    Extend(Point),
    End,
    Reset,
}

/// Drawing call the host surface should perform after a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear,
    MoveTo(Point),
    LineTo(Point),
}

/// Why an event was ignored. Ignored events never change the capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    AlreadyDrawing,
    StrokeCompleted,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::AlreadyDrawing => "A line is already being drawn.",
            Rejection::StrokeCompleted => {
                "Line already drawn. Press 'R' to reset and draw a new line."
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transition {
    pub ops: Vec<SurfaceOp>,
    pub rejected: Option<Rejection>,
}

impl Transition {
    fn draw(ops: Vec<SurfaceOp>) -> Self {
        Self {
            ops,
            rejected: None,
        }
    }

    fn ignored(reason: Rejection) -> Self {
        Self {
            ops: Vec::new(),
            rejected: Some(reason),
        }
    }

    fn none() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("no completed stroke to send")]
    NoCompletedStroke,
    #[error("stroke has {0} point(s), at least 2 are needed")]
    TooFewPoints(usize),
}

/// One-stroke-per-reset capture of a pointer drawing.
#[derive(Clone, Debug)]
pub struct Capture {
    state: CaptureState,
    stroke: Vec<Point>,
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

impl Capture {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            stroke: Vec::new(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn stroke(&self) -> &[Point] {
        &self.stroke
    }

    pub fn handle(&mut self, event: CaptureEvent) -> Transition {
        match (self.state, event) {
            (CaptureState::Idle, CaptureEvent::Begin(point)) => {
                self.state = CaptureState::Drawing;
                self.stroke = vec![point];
                Transition::draw(vec![SurfaceOp::MoveTo(point)])
            }
            (CaptureState::Drawing, CaptureEvent::Begin(_)) => {
                Transition::ignored(Rejection::AlreadyDrawing)
            }
            (CaptureState::Completed, CaptureEvent::Begin(_)) => {
                Transition::ignored(Rejection::StrokeCompleted)
            }
            (CaptureState::Drawing, CaptureEvent::Extend(point)) => {
                self.stroke.push(point);
                Transition::draw(vec![SurfaceOp::LineTo(point)])
            }
            (_, CaptureEvent::Extend(_)) => Transition::none(),
            (CaptureState::Drawing, CaptureEvent::End) => {
                if !self.stroke.is_empty() {
                    self.state = CaptureState::Completed;
                }
                Transition::none()
            }
            (_, CaptureEvent::End) => Transition::none(),
            (_, CaptureEvent::Reset) => {
                self.state = CaptureState::Idle;
                self.stroke.clear();
                Transition::draw(vec![SurfaceOp::Clear])
            }
        }
    }

    pub fn begin(&mut self, point: Point) -> Transition {
        self.handle(CaptureEvent::Begin(point))
    }

    pub fn extend(&mut self, point: Point) -> Transition {
        self.handle(CaptureEvent::Extend(point))
    }

    pub fn end(&mut self) -> Transition {
        self.handle(CaptureEvent::End)
    }

    pub fn reset(&mut self) -> Transition {
        self.handle(CaptureEvent::Reset)
    }

    fn check_sendable(&self) -> Result<(), SendError> {
        if self.state != CaptureState::Completed {
            return Err(SendError::NoCompletedStroke);
        }
        if self.stroke.len() < 2 {
            return Err(SendError::TooFewPoints(self.stroke.len()));
        }
        Ok(())
    }

    /// Simplifies the completed stroke for sending. The capture itself is left untouched.
    pub fn simplified(&self, min_distance: f64) -> Result<Simplified, SendError> {
        self.check_sendable()?;
        Ok(simplify_with_stats(&self.stroke, min_distance))
    }

    pub fn prepare_send(&self, min_distance: f64) -> Result<PathRequest, SendError> {
        let simplified = self.simplified(min_distance)?;
        Ok(PathRequest {
            path_points: simplified.points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn completed(points: &[Point]) -> Capture {
        let mut capture = Capture::new();
        capture.begin(points[0]);
        for point in &points[1..] {
            capture.extend(*point);
        }
        capture.end();
        capture
    }

    #[test]
    fn full_stroke_lifecycle() {
        let mut capture = Capture::new();
        assert_eq!(capture.state(), CaptureState::Idle);

        let begin = capture.begin(p(1.0, 2.0));
        assert_eq!(begin.ops, vec![SurfaceOp::MoveTo(p(1.0, 2.0))]);
        assert_eq!(capture.state(), CaptureState::Drawing);

        let extend = capture.extend(p(3.0, 4.0));
        assert_eq!(extend.ops, vec![SurfaceOp::LineTo(p(3.0, 4.0))]);

        capture.end();
        assert_eq!(capture.state(), CaptureState::Completed);
        assert_eq!(capture.stroke(), &[p(1.0, 2.0), p(3.0, 4.0)]);
    }

    #[test]
    fn second_begin_is_ignored() {
        let mut capture = Capture::new();
        capture.begin(p(1.0, 1.0));
        capture.extend(p(2.0, 2.0));

        let again = capture.begin(p(50.0, 50.0));
        assert_eq!(again.rejected, Some(Rejection::AlreadyDrawing));
        assert!(again.ops.is_empty());
        assert_eq!(capture.state(), CaptureState::Drawing);
        assert_eq!(capture.stroke(), &[p(1.0, 1.0), p(2.0, 2.0)]);
    }

    #[test]
    fn begin_after_completion_requires_reset() {
        let mut capture = completed(&[p(0.0, 0.0), p(5.0, 5.0)]);
        let transition = capture.begin(p(9.0, 9.0));
        assert_eq!(transition.rejected, Some(Rejection::StrokeCompleted));
        assert_eq!(capture.state(), CaptureState::Completed);
        assert_eq!(capture.stroke().len(), 2);

        capture.reset();
        let transition = capture.begin(p(9.0, 9.0));
        assert_eq!(transition.rejected, None);
        assert_eq!(capture.stroke(), &[p(9.0, 9.0)]);
    }

    #[test]
    fn extend_outside_drawing_is_noop() {
        let mut capture = Capture::new();
        assert_eq!(capture.extend(p(1.0, 1.0)), Transition::default());
        assert!(capture.stroke().is_empty());

        let mut capture = completed(&[p(0.0, 0.0), p(5.0, 5.0)]);
        assert!(capture.extend(p(6.0, 6.0)).ops.is_empty());
        assert_eq!(capture.stroke().len(), 2);
    }

    #[test]
    fn end_outside_drawing_is_noop() {
        let mut capture = Capture::new();
        capture.end();
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn single_point_stroke_completes() {
        let mut capture = Capture::new();
        capture.begin(p(4.0, 4.0));
        capture.end();
        assert_eq!(capture.state(), CaptureState::Completed);
    }

    #[test]
    fn reset_clears_from_any_state() {
        let mut idle = Capture::new();
        let mut drawing = Capture::new();
        drawing.begin(p(1.0, 1.0));
        drawing.extend(p(2.0, 2.0));
        let mut done = completed(&[p(0.0, 0.0), p(8.0, 8.0)]);

        for capture in [&mut idle, &mut drawing, &mut done] {
            let transition = capture.reset();
            assert_eq!(transition.ops, vec![SurfaceOp::Clear]);
            assert_eq!(capture.state(), CaptureState::Idle);
            assert!(capture.stroke().is_empty());
        }
    }

    #[test]
    fn stroke_only_grows_while_drawing() {
        let mut capture = Capture::new();
        capture.begin(p(0.0, 0.0));
        let mut last_len = capture.stroke().len();
        for i in 1..20 {
            capture.extend(p(i as f64, 0.0));
            assert!(capture.stroke().len() >= last_len);
            last_len = capture.stroke().len();
        }
        assert_eq!(last_len, 20);
    }

    #[test]
    fn send_requires_completed_stroke() {
        let mut capture = Capture::new();
        assert_eq!(
            capture.prepare_send(10.0),
            Err(SendError::NoCompletedStroke)
        );
        capture.begin(p(0.0, 0.0));
        capture.extend(p(40.0, 0.0));
        assert_eq!(
            capture.prepare_send(10.0),
            Err(SendError::NoCompletedStroke)
        );
    }

    #[test]
    fn send_requires_two_points() {
        let mut capture = Capture::new();
        capture.begin(p(0.0, 0.0));
        capture.end();
        assert_eq!(capture.prepare_send(10.0), Err(SendError::TooFewPoints(1)));
    }

    #[test]
    fn simplified_reports_input_size() {
        let capture = completed(&[p(0.0, 0.0), p(2.0, 0.0), p(4.0, 0.0), p(30.0, 0.0)]);
        let simplified = capture.simplified(10.0).unwrap();
        assert_eq!(simplified.input_len, 4);
        assert_eq!(simplified.points, vec![[0.0, 0.0], [30.0, 0.0]]);
        assert_eq!(
            capture.prepare_send(10.0).unwrap().path_points,
            simplified.points
        );
    }

    #[test]
    fn send_simplifies_without_touching_stroke() {
        let capture = completed(&[
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(20.0, 0.0),
            p(21.0, 0.0),
            p(50.0, 0.0),
        ]);
        let request = capture.prepare_send(10.0).unwrap();
        assert_eq!(
            request.path_points,
            vec![[0.0, 0.0], [20.0, 0.0], [50.0, 0.0]]
        );
        assert_eq!(capture.state(), CaptureState::Completed);
        assert_eq!(capture.stroke().len(), 5);
        assert_eq!(capture.prepare_send(10.0).unwrap(), request);
    }
}
