use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Move {
    pub direction: Direction,
    pub duration: Duration,
}

#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub min_distance: f64,
    pub pixels_per_second: f64,
    pub turn_threshold_deg: f64,
    pub turn_overshoot_deg: f64,
    pub seconds_per_quarter_turn: f64,
    pub min_forward_secs: f64,
    /// Canvas y grows downward, so 270 degrees points "up" the pad.
    pub initial_heading_deg: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_distance: 20.0,
            pixels_per_second: 100.0,
            turn_threshold_deg: 30.0,
            turn_overshoot_deg: 40.0,
            seconds_per_quarter_turn: 0.5,
            min_forward_secs: 0.2,
            initial_heading_deg: 270.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("cannot time a {direction} move of {secs}s")]
    Duration { direction: Direction, secs: f64 },
}

fn timed(direction: Direction, secs: f64) -> Result<Move, PlanError> {
    let duration = Duration::try_from_secs_f64(secs)
        .map_err(|_| PlanError::Duration { direction, secs })?;
    Ok(Move {
        direction,
        duration,
    })
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Keeps the first coordinate and every later one at least `min_distance` from the
/// previously kept coordinate. Unlike the pad's simplifier there is no endpoint pass.
pub fn filter_coordinates(coords: &[[f64; 2]], min_distance: f64) -> Vec<[f64; 2]> {
    let Some(&first) = coords.first() else {
        return Vec::new();
    };
    let mut kept = vec![first];
    let mut last = first;
    for &coord in &coords[1..] {
        if distance(last, coord) >= min_distance {
            kept.push(coord);
            last = coord;
        }
    }
    kept
}

fn normalize_heading(degrees: f64) -> f64 {
    (degrees + 360.0) % 360.0
}

fn heading_difference(target: f64, current: f64) -> f64 {
    let diff = target - current;
    if diff > 180.0 {
        diff - 360.0
    } else if diff < -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

pub fn plan_moves(coords: &[[f64; 2]], config: &PlannerConfig) -> Result<Vec<Move>, PlanError> {
    if coords.len() < 2 {
        return Ok(Vec::new());
    }
    let filtered = filter_coordinates(coords, config.min_distance);
    tracing::info!(
        "Simplified from {} to {} points",
        coords.len(),
        filtered.len()
    );
    if filtered.len() < 2 {
        return Ok(Vec::new());
    }

    let mut moves = Vec::new();
    let mut heading = config.initial_heading_deg;
    for pair in filtered.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let dx = to[0] - from[0];
        let dy = to[1] - from[1];
        let target = normalize_heading(dy.atan2(dx).to_degrees());
        let diff = heading_difference(target, heading);

        if diff.abs() > config.turn_threshold_deg {
            let direction = if diff > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            };
            let angle = diff.abs() + config.turn_overshoot_deg;
            let secs = angle / 90.0 * config.seconds_per_quarter_turn;
            tracing::debug!("Turn {direction} {angle:.1} deg ({secs:.2}s)");
            moves.push(timed(direction, secs)?);
            heading = target;
        }

        let dist = distance(from, to);
        let secs = (dist / config.pixels_per_second).max(config.min_forward_secs);
        tracing::debug!("Forward {dist:.1}px ({secs:.2}s)");
        moves.push(timed(Direction::Forward, secs)?);
    }
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_secs(actual: Duration, expected: f64) {
        assert!(
            (actual.as_secs_f64() - expected).abs() < 1e-6,
            "expected {expected}s, got {actual:?}"
        );
    }

    #[test]
    fn fewer_than_two_coordinates_plan_nothing() {
        let config = PlannerConfig::default();
        assert!(plan_moves(&[], &config).unwrap().is_empty());
        assert!(plan_moves(&[[10.0, 10.0]], &config).unwrap().is_empty());
    }

    #[test]
    fn coordinates_collapsing_to_one_plan_nothing() {
        let config = PlannerConfig::default();
        let coords = [[0.0, 0.0], [5.0, 0.0], [10.0, 5.0]];
        assert!(plan_moves(&coords, &config).unwrap().is_empty());
    }

    #[test]
    fn straight_up_needs_no_turn() {
        let plan =
            plan_moves(&[[100.0, 300.0], [100.0, 200.0]], &PlannerConfig::default()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].direction, Direction::Forward);
        assert_secs(plan[0].duration, 1.0);
    }

    #[test]
    fn path_to_the_right_turns_right_first() {
        let plan =
            plan_moves(&[[100.0, 100.0], [200.0, 100.0]], &PlannerConfig::default()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].direction, Direction::Right);
        assert_secs(plan[0].duration, 130.0 / 90.0 * 0.5);
        assert_eq!(plan[1].direction, Direction::Forward);
        assert_secs(plan[1].duration, 1.0);
    }

    #[test]
    fn path_to_the_left_turns_left() {
        let plan =
            plan_moves(&[[200.0, 100.0], [100.0, 100.0]], &PlannerConfig::default()).unwrap();
        assert_eq!(plan[0].direction, Direction::Left);
        assert_secs(plan[0].duration, 130.0 / 90.0 * 0.5);
    }

    #[test]
    fn small_heading_change_keeps_heading() {
        // 20 degrees off vertical is under the 30 degree threshold.
        let dx = 100.0 * 20f64.to_radians().sin();
        let dy = -100.0 * 20f64.to_radians().cos();
        let plan = plan_moves(&[[0.0, 0.0], [dx, dy]], &PlannerConfig::default()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].direction, Direction::Forward);
    }

    #[test]
    fn heading_carries_over_between_segments() {
        // Right, then right again: only the first segment turns.
        let coords = [[0.0, 100.0], [100.0, 100.0], [200.0, 100.0]];
        let plan = plan_moves(&coords, &PlannerConfig::default()).unwrap();
        let directions: Vec<_> = plan.iter().map(|m| m.direction).collect();
        assert_eq!(
            directions,
            vec![Direction::Right, Direction::Forward, Direction::Forward]
        );
    }

    #[test]
    fn forward_duration_has_a_floor() {
        let config = PlannerConfig {
            pixels_per_second: 1000.0,
            ..PlannerConfig::default()
        };
        let plan = plan_moves(&[[0.0, 100.0], [0.0, 50.0]], &config).unwrap();
        assert_secs(plan[0].duration, 0.2);
    }

    #[test]
    fn untimeable_forward_move_is_an_error() {
        let plan = plan_moves(&[[0.0, 0.0], [0.0, -1e300]], &PlannerConfig::default());
        assert!(matches!(
            plan,
            Err(PlanError::Duration {
                direction: Direction::Forward,
                ..
            })
        ));

        let stalled = PlannerConfig {
            pixels_per_second: 0.0,
            ..PlannerConfig::default()
        };
        assert!(plan_moves(&[[0.0, 100.0], [0.0, 0.0]], &stalled).is_err());
    }

    #[test]
    fn filter_has_no_endpoint_pass() {
        let coords = [[0.0, 0.0], [30.0, 0.0], [35.0, 0.0]];
        assert_eq!(
            filter_coordinates(&coords, 20.0),
            vec![[0.0, 0.0], [30.0, 0.0]]
        );
    }
}
