//! Longitudinal speed-profile segments
//!
//! A trip is a sequence of segment descriptors. Each descriptor is
//! activated with the state tuple `(time, position, speed, accel)` at the
//! instant the previous segment ended, and the active realization is then
//! sampled with the same tuple, yielding the commanded speed,
//! acceleration and jerk, or end-of-segment.

use crate::utils::interp::lerp;
use crate::{Result, TramlineError};

// ============================================================================
// Samples and descriptors
// ============================================================================

/// Longitudinal drive sample produced by a speed segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryDrive {
    /// Commanded speed
    pub speed: f64,
    /// Commanded acceleration
    pub accel: f64,
    /// Commanded jerk
    pub jerk: f64,
}

impl TrajectoryDrive {
    const REST: Self = Self { speed: 0.0, accel: 0.0, jerk: 0.0 };

    fn coasting(speed: f64) -> Self {
        Self { speed, accel: 0.0, jerk: 0.0 }
    }
}

/// Descriptor of one piece of the longitudinal speed profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedSegment {
    /// Stand still for `duration` seconds
    Stop { duration: f64 },
    /// Ramp linearly to `to_speed` at the given acceleration magnitude
    Accelerate { to_speed: f64, acceleration: f64 },
    /// Ramp to `to_speed` with a jerk-limited trapezoidal acceleration
    /// profile
    SmoothlyAccelerate { to_speed: f64, acceleration: f64, jerk: f64 },
    /// Hold `speed` over `distance` meters
    ConstantSpeed { speed: f64, distance: f64 },
}

impl SpeedSegment {
    /// Stands still for `duration` seconds.
    pub fn stop(duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(TramlineError::InvalidArgument("stop duration must be nonnegative"));
        }
        Ok(SpeedSegment::Stop { duration })
    }

    /// Ramps linearly from the activation speed to `to_speed` with
    /// acceleration magnitude `acceleration`.
    pub fn accelerate(to_speed: f64, acceleration: f64) -> Result<Self> {
        if !to_speed.is_finite() {
            return Err(TramlineError::InvalidArgument("target speed must be finite"));
        }
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(TramlineError::InvalidArgument("acceleration must be positive"));
        }
        Ok(SpeedSegment::Accelerate { to_speed, acceleration })
    }

    /// Ramps from the activation speed to `to_speed` with acceleration
    /// bounded by `acceleration` and jerk bounded by `jerk`.
    ///
    /// Zero jerk has no finite-time realization, so it is rejected here
    /// rather than producing a division by zero at activation.
    pub fn smoothly_accelerate(to_speed: f64, acceleration: f64, jerk: f64) -> Result<Self> {
        if !to_speed.is_finite() {
            return Err(TramlineError::InvalidArgument("target speed must be finite"));
        }
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(TramlineError::InvalidArgument("acceleration must be positive"));
        }
        if !jerk.is_finite() || jerk <= 0.0 {
            return Err(TramlineError::InvalidArgument("jerk must be positive"));
        }
        Ok(SpeedSegment::SmoothlyAccelerate { to_speed, acceleration, jerk })
    }

    /// Holds `speed` until `distance` meters have been covered.
    pub fn constant_speed(speed: f64, distance: f64) -> Result<Self> {
        if !speed.is_finite() {
            return Err(TramlineError::InvalidArgument("speed must be finite"));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(TramlineError::InvalidArgument("distance must be nonnegative"));
        }
        Ok(SpeedSegment::ConstantSpeed { speed, distance })
    }

    /// Realizes this descriptor at the activation state tuple
    /// `(time, position, speed, accel)`.
    pub fn activate(&self, time: f64, position: f64, speed: f64, _accel: f64) -> ActiveSpeedSegment {
        match *self {
            SpeedSegment::Stop { duration } => {
                ActiveSpeedSegment::Stop { until: time + duration }
            }
            SpeedSegment::Accelerate { to_speed, acceleration } => {
                let dv = to_speed - speed;
                let duration = dv.abs() / acceleration;
                ActiveSpeedSegment::Accelerate {
                    t0: time,
                    v0: speed,
                    t1: time + duration,
                    v1: to_speed,
                    accel: acceleration * dv.signum(),
                }
            }
            SpeedSegment::SmoothlyAccelerate { to_speed, acceleration, jerk } => {
                let dv = (to_speed - speed).abs();
                let sign = (to_speed - speed).signum();

                let nominal_ramp = acceleration / jerk;
                let (ramp, peak, cruise) = if nominal_ramp * acceleration < dv {
                    (nominal_ramp, acceleration, (dv - nominal_ramp * acceleration) / acceleration)
                } else {
                    // Ramps alone cover the speed change; the peak drops
                    // below the acceleration bound.
                    let peak = (jerk * dv).sqrt();
                    (peak / jerk, peak, 0.0)
                };

                let t1 = time + ramp;
                let t2 = t1 + cruise;
                ActiveSpeedSegment::SmoothlyAccelerate {
                    t0: time,
                    v0: speed,
                    sign,
                    jerk,
                    peak,
                    t1,
                    t2,
                    t3: t2 + ramp,
                    v1: speed + sign * 0.5 * peak * ramp,
                    v2: speed + sign * (0.5 * peak * ramp + peak * cruise),
                }
            }
            SpeedSegment::ConstantSpeed { speed, distance } => {
                ActiveSpeedSegment::ConstantSpeed { speed, until: position + distance }
            }
        }
    }
}

// ============================================================================
// Active realizations
// ============================================================================

/// Time/position-parameterized realization of a [`SpeedSegment`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveSpeedSegment {
    Stop {
        until: f64,
    },
    Accelerate {
        t0: f64,
        v0: f64,
        t1: f64,
        v1: f64,
        accel: f64,
    },
    SmoothlyAccelerate {
        t0: f64,
        v0: f64,
        sign: f64,
        jerk: f64,
        peak: f64,
        t1: f64,
        t2: f64,
        t3: f64,
        v1: f64,
        v2: f64,
    },
    ConstantSpeed {
        speed: f64,
        until: f64,
    },
}

impl ActiveSpeedSegment {
    /// Samples the drive at the given state, or `None` past the segment.
    pub fn drive(&self, time: f64, position: f64, _speed: f64, _accel: f64) -> Option<TrajectoryDrive> {
        match *self {
            ActiveSpeedSegment::Stop { until } => {
                if time < until {
                    Some(TrajectoryDrive::REST)
                } else {
                    None
                }
            }
            ActiveSpeedSegment::Accelerate { t0, v0, t1, v1, accel } => {
                if time < t1 {
                    Some(TrajectoryDrive {
                        speed: lerp(t0, v0, t1, v1, time),
                        accel,
                        jerk: 0.0,
                    })
                } else {
                    None
                }
            }
            ActiveSpeedSegment::SmoothlyAccelerate {
                t0,
                v0,
                sign,
                jerk,
                peak,
                t1,
                t2,
                t3,
                v1,
                v2,
            } => {
                if time < t0 {
                    // Sampled before the activation instant: hold the
                    // entry speed.
                    Some(TrajectoryDrive::coasting(v0))
                } else if time < t1 {
                    let tau = time - t0;
                    Some(TrajectoryDrive {
                        speed: v0 + sign * 0.5 * jerk * tau * tau,
                        accel: sign * jerk * tau,
                        jerk: sign * jerk,
                    })
                } else if time < t2 {
                    let tau = time - t1;
                    Some(TrajectoryDrive {
                        speed: v1 + sign * peak * tau,
                        accel: sign * peak,
                        jerk: 0.0,
                    })
                } else if time < t3 {
                    let tau = time - t2;
                    Some(TrajectoryDrive {
                        speed: v2 + sign * (peak * tau - 0.5 * jerk * tau * tau),
                        accel: sign * (peak - jerk * tau),
                        jerk: -sign * jerk,
                    })
                } else {
                    None
                }
            }
            ActiveSpeedSegment::ConstantSpeed { speed, until } => {
                if position < until {
                    Some(TrajectoryDrive::coasting(speed))
                } else {
                    None
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
