//! Simplified train kinematics: bounded acceleration up to the lowest applicable speed
//! limit and a banded braking profile on the approach to a stop.

use smallvec::SmallVec;
use std::f64::INFINITY;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccelerationStatus {
    Accelerating,
    Decelerating,
    Constant,
}

#[derive(Copy, Clone, Debug)]
pub struct TrainParams {
    pub max_acc: f64,
    pub max_vel: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistanceVelocity {
    pub dx: f64,
    pub v: f64,
}

/// (lower speed bound in m/s, deceleration in m/s^2), fastest band first.
const BRAKING_BANDS: [(f64, f64); 3] = [(30.0, 0.9), (15.0, 0.7), (0.0, 0.5)];

/// Below this distance to the stop the approach speed floor drops.
const CLOSE_DISTANCE: f64 = 200.0;
const MIN_APPROACH_VELOCITY: f64 = 8.0;
const MIN_CLOSE_VELOCITY: f64 = 2.0;

pub fn braking_deceleration(train: &TrainParams, velocity: f64) -> f64 {
    let band = BRAKING_BANDS.iter()
        .find(|&&(above, _)| velocity > above)
        .map(|&(_, dec)| dec)
        .unwrap_or(BRAKING_BANDS[BRAKING_BANDS.len() - 1].1);
    // Trains that accelerate hard are assumed to brake at least as hard.
    band.max(train.max_acc)
}

/// Distance from the stop at which braking starts: the braking distance plus
/// what is covered during one more step.
pub fn braking_threshold(train: &TrainParams, velocity: f64, dt: f64) -> f64 {
    let dec = braking_deceleration(train, velocity);
    velocity * velocity / (2.0 * dec) + velocity * dt
}

/// Target velocity for the next step when approaching a stop `distance` meters
/// ahead, or `None` outside the braking envelope. `braking` keeps a train that has
/// already started braking on the braking profile.
pub fn calculate_arriving_velocity(train: &TrainParams, velocity: f64, distance: f64,
                                   dt: f64, braking: bool) -> Option<f64> {
    if !braking && distance > braking_threshold(train, velocity, dt) {
        return None;
    }
    let floor = if distance < CLOSE_DISTANCE { MIN_CLOSE_VELOCITY } else { MIN_APPROACH_VELOCITY };
    let dec = braking_deceleration(train, velocity);
    Some((velocity - dec * dt).max(floor))
}

/// One integration step. The new velocity is the lowest of the static limits,
/// the acceleration bound and the braking target; the distance advanced uses the
/// new velocity.
pub fn velocity_step(train: &TrainParams, velocity: f64, limits: &[f64],
                     braking_target: Option<f64>, dt: f64) -> (DistanceVelocity, AccelerationStatus) {
    let mut bounds: SmallVec<[f64; 4]> = SmallVec::from_slice(limits);
    bounds.push(train.max_vel);
    bounds.push(velocity + train.max_acc * dt);
    if let Some(v) = braking_target {
        bounds.push(v);
    }
    let v = bounds.iter().cloned().fold(INFINITY, f64::min).max(0.0);

    let status = if braking_target.is_some() && v <= velocity {
        AccelerationStatus::Decelerating
    } else if v > velocity + 1e-6 {
        AccelerationStatus::Accelerating
    } else if v < velocity - 1e-6 {
        AccelerationStatus::Decelerating
    } else {
        AccelerationStatus::Constant
    };

    (DistanceVelocity { dx: v * dt, v }, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IC: TrainParams = TrainParams { max_acc: 0.4, max_vel: 44.4 };

    #[test]
    fn accelerates_within_bounds() {
        let (dv, status) = velocity_step(&IC, 0.0, &[30.0], None, 15.0);
        assert!((dv.v - 6.0).abs() < 1e-9);
        assert!((dv.dx - 90.0).abs() < 1e-9);
        assert_eq!(status, AccelerationStatus::Accelerating);

        let (dv, status) = velocity_step(&IC, 28.0, &[30.0], None, 15.0);
        assert_eq!(dv.v, 30.0);
        assert_eq!(status, AccelerationStatus::Accelerating);

        let (dv, status) = velocity_step(&IC, 30.0, &[30.0], None, 15.0);
        assert_eq!(dv.v, 30.0);
        assert_eq!(status, AccelerationStatus::Constant);
    }

    #[test]
    fn lower_speed_limit_slows_train() {
        let (dv, status) = velocity_step(&IC, 30.0, &[20.0], None, 15.0);
        assert_eq!(dv.v, 20.0);
        assert_eq!(status, AccelerationStatus::Decelerating);
    }

    #[test]
    fn braking_envelope() {
        // Far away: no braking.
        assert_eq!(calculate_arriving_velocity(&IC, 30.0, 5000.0, 15.0, false), None);
        // 30 m/s in the 15..30 band: 0.7 m/s^2 -> 643 m + 450 m.
        assert!((braking_threshold(&IC, 30.0, 15.0) - 1092.857).abs() < 0.01);
        let v = calculate_arriving_velocity(&IC, 30.0, 1000.0, 15.0, false).unwrap();
        assert!((v - 19.5).abs() < 1e-9);
        // Floors depend on proximity.
        assert_eq!(calculate_arriving_velocity(&IC, 9.0, 500.0, 15.0, true), Some(8.0));
        assert_eq!(calculate_arriving_velocity(&IC, 9.0, 100.0, 15.0, true), Some(2.0));
    }

    #[test]
    fn braking_status_is_kept_at_floor() {
        let target = calculate_arriving_velocity(&IC, 8.0, 400.0, 15.0, true);
        let (dv, status) = velocity_step(&IC, 8.0, &[30.0], target, 15.0);
        assert_eq!(dv.v, 8.0);
        assert_eq!(status, AccelerationStatus::Decelerating);
    }
}
