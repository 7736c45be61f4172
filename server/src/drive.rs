use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::motion::{Direction, Move};

pub const DEFAULT_SPEED: i32 = 800;
const SETTLE_PAUSE: Duration = Duration::from_millis(150);

/// Wheel duties in the order front-left, back-left, front-right, back-right.
pub type MotorModel = [i32; 4];

pub const STOPPED: MotorModel = [0, 0, 0, 0];

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("motor command failed: {0}")]
    Command(String),
}

#[async_trait]
pub trait Drive: Send + Sync {
    fn name(&self) -> &str;
    async fn set_motor_model(&self, duties: MotorModel) -> Result<(), DriveError>;
}

pub fn motor_model(direction: Direction, speed: i32) -> MotorModel {
    match direction {
        Direction::Forward => [speed, speed, speed, speed],
        Direction::Backward => [-speed, -speed, -speed, -speed],
        Direction::Left => [-speed, -speed, speed, speed],
        Direction::Right => [speed, speed, -speed, -speed],
        Direction::Stop => STOPPED,
    }
}

/// Runs one move to completion, then stops the wheels and lets the chassis settle.
pub async fn execute_move(drive: &dyn Drive, step: Move, speed: i32) -> Result<(), DriveError> {
    tracing::info!(
        "Moving {} for {:.2}s (speed={speed})",
        step.direction,
        step.duration.as_secs_f64()
    );
    if step.direction == Direction::Stop {
        return drive.set_motor_model(STOPPED).await;
    }

    if let Err(error) = drive.set_motor_model(motor_model(step.direction, speed)).await {
        tracing::error!("Motor control error: {error}");
        if let Err(stop_error) = drive.set_motor_model(STOPPED).await {
            tracing::error!("Emergency stop failed: {stop_error}");
        }
        return Err(error);
    }
    tokio::time::sleep(step.duration).await;
    drive.set_motor_model(STOPPED).await?;
    tokio::time::sleep(SETTLE_PAUSE).await;
    Ok(())
}

/// Stand-in for the motor board: records every command and logs it.
#[derive(Default)]
pub struct SimulatedDrive {
    commands: Mutex<Vec<MotorModel>>,
}

impl SimulatedDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<MotorModel> {
        match self.commands.lock() {
            Ok(commands) => commands.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Drive for SimulatedDrive {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn set_motor_model(&self, duties: MotorModel) -> Result<(), DriveError> {
        tracing::debug!("motor model {duties:?}");
        self.commands
            .lock()
            .map_err(|_| DriveError::Command("command log poisoned".into()))?
            .push(duties);
        Ok(())
    }
}
