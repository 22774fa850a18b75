//! Track geometry segments
//!
//! A track is a sequence of segment descriptors, each activated at the
//! position where the previous one ended. Sampling an active segment
//! yields the curvature and its slope with respect to arc length, or
//! end-of-segment once the position passes the segment.
//!
//! Turns carry clothoid transitions: the curvature ramps linearly from
//! zero to the arc value over the transition length, so the lateral
//! acceleration of a vehicle following the track stays continuous.

use crate::utils::interp::lerp;
use crate::{Result, TramlineError};

// ============================================================================
// Samples and descriptors
// ============================================================================

/// Curvature sample produced by a track segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackCurvature {
    /// Signed curvature (positive turns left)
    pub curvature: f64,
    /// Curvature slope with respect to arc length
    pub dcurvature: f64,
}

/// Descriptor of one piece of track geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackSegment {
    /// Straight track of the given length
    Straight { length: f64 },
    /// Turn by `angle` at `radius`, entered and left through clothoid
    /// transitions of the given length
    Turn { angle: f64, radius: f64, transition: f64 },
}

impl TrackSegment {
    /// Straight track covering `length` meters.
    pub fn straight(length: f64) -> Result<Self> {
        if !length.is_finite() || length < 0.0 {
            return Err(TramlineError::InvalidArgument("straight length must be nonnegative"));
        }
        Ok(TrackSegment::Straight { length })
    }

    /// Turn by `angle` radians (signed, positive left) on a circular arc
    /// of `radius`, with clothoid transitions of length `transition` on
    /// both ends.
    ///
    /// When the transitions alone would sweep more than the whole angle,
    /// they are shortened so the two clothoids meet at a reduced peak
    /// curvature and the constant arc disappears.
    pub fn turn(angle: f64, radius: f64, transition: f64) -> Result<Self> {
        if !angle.is_finite() || angle == 0.0 {
            return Err(TramlineError::InvalidArgument("turn angle must be finite and nonzero"));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(TramlineError::InvalidArgument("turn radius must be positive"));
        }
        if !transition.is_finite() || transition < 0.0 {
            return Err(TramlineError::InvalidArgument(
                "transition length must be nonnegative",
            ));
        }
        Ok(TrackSegment::Turn { angle, radius, transition })
    }

    /// Realizes this descriptor at the activation position.
    pub fn activate(&self, position: f64) -> ActiveTrackSegment {
        match *self {
            TrackSegment::Straight { length } => {
                ActiveTrackSegment::Straight { end: position + length }
            }
            TrackSegment::Turn { angle, radius, transition } => {
                let kappa_max = 1.0 / radius;
                let swept_by_transitions = transition * kappa_max;

                let (ramp, peak) = if swept_by_transitions <= angle.abs() {
                    (transition, angle.signum() * kappa_max)
                } else {
                    // Transitions dominate: shorten them so the two
                    // clothoids alone sweep the whole angle at the same
                    // curvature slope.
                    let ramp = (angle.abs() * radius * transition).sqrt();
                    (ramp, angle / ramp)
                };
                let arc = (angle.abs() - swept_by_transitions).max(0.0) * radius;

                let arc_start = position + ramp;
                let ramp_out_start = arc_start + arc;
                ActiveTrackSegment::Turn {
                    start: position,
                    arc_start,
                    ramp_out_start,
                    end: ramp_out_start + ramp,
                    peak,
                }
            }
        }
    }
}

// ============================================================================
// Active realizations
// ============================================================================

/// Position-parameterized realization of a [`TrackSegment`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveTrackSegment {
    /// Straight span ending at `end`
    Straight { end: f64 },
    /// Trapezoidal curvature profile with breakpoints at `arc_start`,
    /// `ramp_out_start` and `end`
    Turn {
        start: f64,
        arc_start: f64,
        ramp_out_start: f64,
        end: f64,
        peak: f64,
    },
}

impl ActiveTrackSegment {
    /// Samples the curvature at `position`, or `None` past the segment.
    pub fn curvature(&self, position: f64) -> Option<TrackCurvature> {
        match *self {
            ActiveTrackSegment::Straight { end } => {
                if position < end {
                    Some(TrackCurvature { curvature: 0.0, dcurvature: 0.0 })
                } else {
                    None
                }
            }
            ActiveTrackSegment::Turn { start, arc_start, ramp_out_start, end, peak } => {
                if position < arc_start {
                    Some(TrackCurvature {
                        curvature: lerp(start, 0.0, arc_start, peak, position),
                        dcurvature: peak / (arc_start - start),
                    })
                } else if position < ramp_out_start {
                    Some(TrackCurvature { curvature: peak, dcurvature: 0.0 })
                } else if position < end {
                    Some(TrackCurvature {
                        curvature: lerp(ramp_out_start, peak, end, 0.0, position),
                        dcurvature: -peak / (end - ramp_out_start),
                    })
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

#[cfg(test)]
mod tests {
    use super::*;
    use ::core::f64::consts::FRAC_PI_2;

    #[test]
    fn test_descriptor_validation() {
        assert!(TrackSegment::straight(-1.0).is_err());
        assert!(TrackSegment::straight(f64::INFINITY).is_err());
        assert!(TrackSegment::turn(0.0, 10.0, 1.0).is_err());
        assert!(TrackSegment::turn(1.0, 0.0, 1.0).is_err());
        assert!(TrackSegment::turn(1.0, -5.0, 1.0).is_err());
        assert!(TrackSegment::turn(1.0, 10.0, -0.5).is_err());
        assert!(TrackSegment::turn(-1.0, 10.0, 0.0).is_ok());
    }

    #[test]
    fn test_straight_spans_its_length() {
        let active = TrackSegment::straight(100.0).unwrap().activate(50.0);
        let sample = active.curvature(149.0).unwrap();
        assert_eq!(sample, TrackCurvature { curvature: 0.0, dcurvature: 0.0 });
        assert!(active.curvature(150.0).is_none());
    }

    #[test]
    fn test_turn_with_clothoid_profile() {
        // Quarter turn at radius 10 with 1 m transitions: the curvature
        // ramps at 0.1 per meter, holds 0.1 over the arc, and ramps back.
        let active = TrackSegment::turn(FRAC_PI_2, 10.0, 1.0).unwrap().activate(0.0);

        let entry = active.curvature(0.0).unwrap();
        assert!((entry.curvature - 0.0).abs() < 1e-12);
        assert!((entry.dcurvature - 0.1).abs() < 1e-12);

        // Arc spans [1, 1 + (π/2 - 0.1)·10); sample its midpoint.
        let arc_len = (FRAC_PI_2 - 0.1) * 10.0;
        let mid = active.curvature(1.0 + arc_len / 2.0).unwrap();
        assert!((mid.curvature - 0.1).abs() < 1e-12);
        assert!(mid.dcurvature.abs() < 1e-12);

        // Exit ramp has the opposite slope.
        let exit = active.curvature(1.0 + arc_len + 0.5).unwrap();
        assert!((exit.curvature - 0.05).abs() < 1e-12);
        assert!((exit.dcurvature + 0.1).abs() < 1e-12);

        assert!(active.curvature(2.0 + arc_len).is_none());
    }

    #[test]
    fn test_right_turn_has_negative_curvature() {
        let active = TrackSegment::turn(-FRAC_PI_2, 10.0, 1.0).unwrap().activate(0.0);
        let mid = active.curvature(5.0).unwrap();
        assert!(mid.curvature < 0.0);
    }

    #[test]
    fn test_transition_dominated_turn() {
        // A tiny angle with a long transition: no constant arc, shortened
        // ramps, reduced peak, same curvature slope.
        let angle = 0.01;
        let radius = 10.0;
        let transition = 2.0;
        let active = TrackSegment::turn(angle, radius, transition).unwrap().activate(0.0);

        let ramp = (angle * radius * transition).sqrt();
        let peak = angle / ramp;
        match active {
            ActiveTrackSegment::Turn { arc_start, ramp_out_start, end, peak: p, .. } => {
                assert!((arc_start - ramp).abs() < 1e-12);
                // Arc collapses onto the exit ramp start.
                assert!((ramp_out_start - arc_start).abs() < 1e-12);
                assert!((end - 2.0 * ramp).abs() < 1e-12);
                assert!((p - peak).abs() < 1e-12);
                // Curvature slope is preserved from the nominal clothoid.
                assert!((p / ramp - 1.0 / (radius * transition)).abs() < 1e-12);
            }
            _ => unreachable!(),
        }

        // Total swept angle is the ramp-up plus ramp-down sweep.
        let sweep = peak * ramp;
        assert!((sweep - angle).abs() < 1e-12);
    }

    #[test]
    fn test_zero_transition_is_a_pure_arc() {
        let active = TrackSegment::turn(FRAC_PI_2, 10.0, 0.0).unwrap().activate(0.0);
        let sample = active.curvature(0.0).unwrap();
        assert!((sample.curvature - 0.1).abs() < 1e-12);
        assert!(sample.dcurvature.abs() < 1e-12);
        assert!(active.curvature(FRAC_PI_2 * 10.0).is_none());
    }
}
