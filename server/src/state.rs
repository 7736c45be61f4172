use std::sync::Arc;

use tokio::sync::Mutex;

use crate::detection::Detector;
use crate::drive::Drive;
use crate::motion::PlannerConfig;

#[derive(Clone)]
pub struct AppState {
    pub drive: Arc<dyn Drive>,
    /// Held for the whole execution of a path so two paths never interleave.
    pub drive_lock: Arc<Mutex<()>>,
    pub detector: Arc<Detector>,
    pub planner: Arc<PlannerConfig>,
    pub speed: i32,
}

impl AppState {
    pub fn new(
        drive: Arc<dyn Drive>,
        detector: Detector,
        planner: PlannerConfig,
        speed: i32,
    ) -> Self {
        Self {
            drive,
            drive_lock: Arc::new(Mutex::new(())),
            detector: Arc::new(detector),
            planner: Arc::new(planner),
            speed,
        }
    }
}
