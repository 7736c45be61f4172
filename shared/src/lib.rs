use serde::{Deserialize, Serialize};

pub mod capture;
pub mod simplify;
pub mod surface;

pub use capture::{
    Capture, CaptureEvent, CaptureState, Rejection, SendError, SurfaceOp, Transition,
};
pub use simplify::{simplify, simplify_with_stats, Simplified};
pub use surface::Surface;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

/// Tolerance used when the pad sends a finished stroke.
pub const SEND_MIN_DISTANCE: f64 = 10.0;

pub const PATH_ENDPOINT: &str = "/path";
pub const DETECTION_START_ENDPOINT: &str = "/detection/start";
pub const DETECTION_STOP_ENDPOINT: &str = "/detection/stop";
pub const DETECTION_STATUS_ENDPOINT: &str = "/detection/status";
pub const STATUS_ENDPOINT: &str = "/status";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_pair(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PathRequest {
    #[serde(rename = "pathPoints")]
    pub path_points: Vec<[f64; 2]>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DetectionStatus {
    pub object_detected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerStatus {
    pub status: String,
    pub motor_library: String,
    pub object_detected: bool,
}
