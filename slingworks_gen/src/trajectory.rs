// Ballistic shot fan.
//
// The slingshot fires `number_shots` trajectories at angles spaced evenly
// over a half turn, starting from -pi/2. Each sweep angle is turned into a
// virtual release point `release_distance` behind the sling, and the launch
// angle is read back from that point. The empirical calibration table then
// corrects the angle and supplies a launch velocity. Two lookup modes exist:
// piecewise-linear interpolation between calibration points (clamped to the
// end values outside the table), or bracket lookup, where an angle strictly
// inside `(angles[i-1], angles[i])` takes `corrections[i-1]`, anything else
// takes the last correction, and the velocity is that of the bracket below
// the corrected angle.
//
// With the corrected angle `theta` and velocity `v`, the curve is the
// parabola `y = a*x^2 + b*x` where `a = -0.5 / (v cos theta)^2` and
// `b = tan theta`, sampled at `sample_step` intervals over `[0, max_x)`,
// rounded, then translated to the sling's world position and rounded again.
//
// The fan depends only on `TrajectoryParams`, so a level builds it once and
// every reachability query reuses it.
//
// See also: `reachability.rs` for the queries that intersect the fan with a
// scene, `config.rs` for `TrajectoryParams` and its default calibration.

use crate::config::TrajectoryParams;
use crate::geometry::{Segment, round_to};
use crate::types::Point;
use std::f64::consts::{FRAC_PI_2, PI};

/// One sampled shot, in world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    /// Sweep angle the shot was fired at (radians, before calibration).
    pub sweep_angle: f64,
    pub points: Vec<Point>,
}

impl Trajectory {
    /// Consecutive sample pairs, in flight order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }
}

/// Every shot the slingshot can fire, lowest sweep angle first.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotFan {
    pub shots: Vec<Trajectory>,
}

impl ShotFan {
    pub fn new(params: &TrajectoryParams) -> Self {
        let n = params.number_shots.max(2);
        let interval = PI / f64::from(n - 1);
        let shots = (0..n)
            .map(|i| {
                let sweep = -FRAC_PI_2 + f64::from(i) * interval;
                Trajectory {
                    sweep_angle: sweep,
                    points: sample(params, sweep),
                }
            })
            .collect();
        Self { shots }
    }
}

/// Launch angle read from the release point for sweep angle `sweep`.
fn release_angle(params: &TrajectoryParams, sweep: f64) -> f64 {
    let x = -params.release_distance * sweep.cos();
    let y = -params.release_distance * sweep.sin();
    y.atan2(x)
}

/// Linear interpolation of `values` over ascending `keys`, clamped to the
/// end values outside the keyed range.
fn interpolate(keys: &[f64], values: &[f64], at: f64) -> f64 {
    let (Some(&first), Some(&last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if at <= first {
        return values[0];
    }
    if at >= last {
        return values[values.len() - 1];
    }
    let i = keys.partition_point(|&k| k <= at);
    let (k0, k1) = (keys[i - 1], keys[i]);
    let t = (at - k0) / (k1 - k0);
    values[i - 1] + t * (values[i] - values[i - 1])
}

/// Calibrated launch angle and velocity for a raw launch angle.
pub fn calibrate(params: &TrajectoryParams, theta: f64) -> (f64, f64) {
    let angles = &params.launch_angles;
    let corrections = &params.angle_corrections;
    let velocities = &params.launch_velocities;
    let n = angles.len();
    if n == 0 {
        return (theta, 0.0);
    }

    if params.interpolate {
        let corrected = theta + interpolate(angles, corrections, theta);
        let velocity = interpolate(angles, velocities, corrected);
        return (corrected, params.velocity_scale * velocity);
    }

    let correction = (1..n)
        .find(|&i| theta > angles[i - 1] && theta < angles[i])
        .map_or(corrections[n - 1], |i| corrections[i - 1]);
    let corrected = theta + correction;
    let velocity = if corrected < angles[0] {
        velocities[0]
    } else {
        (1..n)
            .find(|&i| corrected < angles[i])
            .map_or(velocities[n - 1], |i| velocities[i - 1])
    };
    (corrected, params.velocity_scale * velocity)
}

/// Sample the shot fired at sweep angle `sweep`, in world coordinates.
fn sample(params: &TrajectoryParams, sweep: f64) -> Vec<Point> {
    let (theta, velocity) = calibrate(params, release_angle(params, sweep));
    let ux = velocity * theta.cos();
    let uy = velocity * theta.sin();
    let a = -0.5 / (ux * ux);
    let b = uy / ux;

    let sling = params.slingshot;
    let mut points = Vec::new();
    let mut x = 0.0;
    while x < params.max_x {
        let xn = x * params.scale;
        let y = (a * xn * xn + b * xn) * params.scale;
        points.push(Point::new(
            round_to(round_to(x) + sling.x),
            round_to(round_to(y) + sling.y),
        ));
        x += params.sample_step;
    }
    points
}
