// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Pulse-to-pulse phase of a coherent pulse train.
//!
//! With a free running carrier, the phase at the start of pulse `p` advances
//! by `carrier_frequency * pri * 360` degrees per PRI. A phase coherent train
//! is built from as many distinct pulses as it takes for that accumulated
//! phase to wrap to a multiple of 360 degrees.

use crate::{Error, Result};

const STEPS_PER_DEGREE: f64 = 10.0;

/// Phase resolution of the device in degrees.
pub const PHASE_RESOLUTION_DEG: f64 = 1.0 / STEPS_PER_DEGREE;

/// Upper bound of the wraparound search.
pub const MAX_WRAPAROUND_PULSES: u32 = 3600;

const WRAP_TOLERANCE_DEG: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseCoherence {
    /// Phase step between consecutive pulses in degrees, in `[0, 360)`.
    pub delta_phi: f64,
    /// Number of pulses after which the phase wraps to a multiple of 360 degrees.
    pub pulse_count: u32,
}

impl PhaseCoherence {
    /// Phase offset of pulse `pulse` in degrees, in `[0, 360)`.
    pub fn phase_offset(&self, pulse: u32) -> f64 {
        round_to_resolution((f64::from(pulse) * self.delta_phi).rem_euclid(360.0))
    }
}

fn round_to_resolution(degrees: f64) -> f64 {
    (degrees * STEPS_PER_DEGREE).round() / STEPS_PER_DEGREE
}

/// Phase step per PRI in degrees, rounded to the phase resolution of the device.
pub fn phase_step(carrier_frequency: f64, pri: f64) -> f64 {
    let absolute = round_to_resolution(carrier_frequency * pri * 360.0);
    round_to_resolution(absolute.rem_euclid(360.0))
}

/// Smallest positive number of pulses `n` with `delta_phi * n` a multiple of 360 degrees.
pub fn wraparound_pulse_count(delta_phi: f64) -> Result<u32> {
    if delta_phi.is_finite() {
        for n in 1..=MAX_WRAPAROUND_PULSES {
            let residual = (delta_phi * f64::from(n)).rem_euclid(360.0);
            if residual < WRAP_TOLERANCE_DEG || 360.0 - residual < WRAP_TOLERANCE_DEG {
                return Ok(n);
            }
        }
    }
    Err(Error::Convergence {
        delta_phi,
        max_pulses: MAX_WRAPAROUND_PULSES,
    })
}

/// Phase step and wraparound pulse count of a coherent pulse train.
pub fn coherent_plan(carrier_frequency: f64, pri: f64) -> Result<PhaseCoherence> {
    if !carrier_frequency.is_finite() || carrier_frequency < 0.0 {
        return Err(Error::Timing(format!(
            "Carrier frequency must be a non-negative finite value, got {carrier_frequency}"
        )));
    }
    if !pri.is_finite() || pri <= 0.0 {
        return Err(Error::Timing(format!(
            "PRI must be a positive finite value, got {pri}"
        )));
    }
    let delta_phi = phase_step(carrier_frequency, pri);
    let pulse_count = wraparound_pulse_count(delta_phi)?;
    awg_log::diagnostic!(
        "Phase step per PRI: {} deg, pulses needed for wraparound: {}",
        delta_phi,
        pulse_count
    );
    Ok(PhaseCoherence {
        delta_phi,
        pulse_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coherent_every_pulse() {
        // 100 MHz * 20 us * 360 = 720000 deg
        let plan = coherent_plan(100e6, 20e-6).unwrap();
        assert_eq!(plan.delta_phi, 0.0);
        assert_eq!(plan.pulse_count, 1);
    }

    #[test]
    fn test_quarter_cycle_step() {
        // 2000.25 carrier cycles per PRI
        let plan = coherent_plan(100e6, 20.0025e-6).unwrap();
        assert!((plan.delta_phi - 90.0).abs() < 1e-9);
        assert_eq!(plan.pulse_count, 4);
        assert_eq!(plan.phase_offset(0), 0.0);
        assert!((plan.phase_offset(3) - 270.0).abs() < 1e-9);
        assert!(plan.phase_offset(4).abs() < 1e-9);
    }

    #[test]
    fn test_wraparound_is_minimal() {
        for (delta_phi, expected) in [(90.0, 4), (120.0, 3), (45.5, 720), (0.1, 3600), (180.0, 2)] {
            let n = wraparound_pulse_count(delta_phi).unwrap();
            assert_eq!(n, expected, "delta_phi = {delta_phi}");
            for m in 1..n {
                let residual = (delta_phi * f64::from(m)).rem_euclid(360.0);
                assert!(residual > WRAP_TOLERANCE_DEG && 360.0 - residual > WRAP_TOLERANCE_DEG);
            }
        }
    }

    #[test]
    fn test_phase_step_rounding() {
        assert!((phase_step(1e9, 1.00001e-6) - 3.6).abs() < 1e-9);
        assert!((phase_step(100e6, 20.00001e-6) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_convergence_failure() {
        assert!(matches!(
            wraparound_pulse_count(std::f64::consts::PI),
            Err(Error::Convergence { max_pulses: 3600, .. })
        ));
        assert!(matches!(
            wraparound_pulse_count(f64::NAN),
            Err(Error::Convergence { .. })
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(coherent_plan(100e6, 0.0), Err(Error::Timing(_))));
        assert!(matches!(coherent_plan(-1.0, 1e-6), Err(Error::Timing(_))));
    }
}
