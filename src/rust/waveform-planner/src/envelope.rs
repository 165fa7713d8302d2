// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Baseband pulse envelopes for digital up-conversion.
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Shape of the rising and falling pulse edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PulseShape {
    /// Hard step, the edges are zero valued.
    Rectangular,
    /// Linear ramp.
    Trapezoidal,
    /// `(1 + cos(theta)) / 2` ramp.
    RaisedCosine,
}

impl PulseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            PulseShape::Rectangular => "rectangular",
            PulseShape::Trapezoidal => "trapezoidal",
            PulseShape::RaisedCosine => "raised-cosine",
        }
    }
}

impl fmt::Display for PulseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PulseShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rectangular" => Ok(PulseShape::Rectangular),
            "trapezoidal" => Ok(PulseShape::Trapezoidal),
            "raised-cosine" => Ok(PulseShape::RaisedCosine),
            _ => Err(Error::InvalidShape(s.to_string())),
        }
    }
}

impl TryFrom<String> for PulseShape {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PulseShape> for String {
    fn from(value: PulseShape) -> Self {
        value.as_str().to_string()
    }
}

/// Timing of a shaped pulse.
///
/// Rise and fall times are 0% to 100% transition times. The pulse width is
/// measured between the 50% points of the edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseEnvelope {
    pub rise_time: f64,
    pub fall_time: f64,
    pub pulse_width: f64,
    pub shape: PulseShape,
}

/// `n` evenly spaced points from `start` to `stop`, both included.
fn linspace(start: f64, stop: f64, n: usize) -> impl Iterator<Item = f64> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |k| start + (stop - start) * (k as f64 / last))
}

fn edges(shape: PulseShape, rise: usize, fall: usize) -> (Vec<f64>, Vec<f64>) {
    match shape {
        PulseShape::Rectangular => (vec![0.0; rise], vec![0.0; fall]),
        PulseShape::Trapezoidal => (
            linspace(0.0, 1.0, rise).collect(),
            linspace(1.0, 0.0, fall).collect(),
        ),
        PulseShape::RaisedCosine => (
            linspace(-PI, 0.0, rise)
                .map(|theta| (1.0 + theta.cos()) / 2.0)
                .collect(),
            linspace(0.0, PI, fall)
                .map(|theta| (1.0 + theta.cos()) / 2.0)
                .collect(),
        ),
    }
}

/// Sample the envelope of `pulse` at `sampling_rate`.
///
/// Returns the I and Q sample streams; the envelope is carried entirely on I
/// and Q is zero.
pub fn envelope(sampling_rate: f64, pulse: &PulseEnvelope) -> Result<(Vec<f64>, Vec<f64>)> {
    if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
        return Err(Error::Timing(format!(
            "Sample rate must be a positive finite value, got {sampling_rate}"
        )));
    }
    let invalid = |t: f64| !t.is_finite() || t < 0.0;
    if invalid(pulse.rise_time) || invalid(pulse.fall_time) {
        return Err(Error::Timing(format!(
            "Rise and fall times must be non-negative finite values, got {} s and {} s",
            pulse.rise_time, pulse.fall_time
        )));
    }
    if !pulse.pulse_width.is_finite() {
        return Err(Error::Timing(format!(
            "Pulse width must be a finite value, got {}",
            pulse.pulse_width
        )));
    }
    let rise_samples = (pulse.rise_time * sampling_rate) as usize;
    let fall_samples = (pulse.fall_time * sampling_rate) as usize;
    let flat_top = pulse.pulse_width * sampling_rate
        - rise_samples as f64 / 2.0
        - fall_samples as f64 / 2.0;
    if invalid(flat_top) {
        return Err(Error::Timing(format!(
            "Pulse width {} s is shorter than half of the rise and fall times combined",
            pulse.pulse_width
        )));
    }
    let flat_samples = flat_top as usize;
    let total = rise_samples
        .checked_add(flat_samples)
        .and_then(|n| n.checked_add(fall_samples))
        .ok_or_else(|| {
            Error::Timing(format!(
                "Pulse of {} s does not fit into memory at {sampling_rate} Sa/s",
                pulse.pulse_width
            ))
        })?;

    let (rise, fall) = edges(pulse.shape, rise_samples, fall_samples);
    let mut i = Vec::with_capacity(total);
    i.extend(rise);
    i.extend(std::iter::repeat_n(1.0, flat_samples));
    i.extend(fall);
    let q = vec![0.0; i.len()];
    Ok((i, q))
}

/// Interleave two sample streams as `i0, q0, i1, q1, ...`.
pub fn iq_combine<T: Copy>(i: &[T], q: &[T]) -> Result<Vec<T>> {
    if i.len() != q.len() {
        return Err(Error::LengthMismatch {
            i: i.len(),
            q: q.len(),
        });
    }
    Ok(i.iter().zip(q).flat_map(|(&i, &q)| [i, q]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(shape: PulseShape) -> PulseEnvelope {
        PulseEnvelope {
            rise_time: 100e-9,
            fall_time: 50e-9,
            pulse_width: 1e-6,
            shape,
        }
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(
            "raised-cosine".parse::<PulseShape>().unwrap(),
            PulseShape::RaisedCosine
        );
        assert!(matches!(
            "gaussian".parse::<PulseShape>(),
            Err(Error::InvalidShape(s)) if s == "gaussian"
        ));
    }

    #[test]
    fn test_envelope_length() {
        // 100 rise + (1000 - 50 - 25) flat + 50 fall
        let (i, q) = envelope(1e9, &pulse(PulseShape::Trapezoidal)).unwrap();
        assert_eq!(i.len(), 100 + 925 + 50);
        assert_eq!(q.len(), i.len());
        assert!(q.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_trapezoidal_edges() {
        let (i, _) = envelope(1e9, &pulse(PulseShape::Trapezoidal)).unwrap();
        assert_eq!(i[0], 0.0);
        assert_eq!(i[99], 1.0);
        assert!((i[50] - 50.0 / 99.0).abs() < 1e-12);
        assert_eq!(i[i.len() - 50], 1.0);
        assert_eq!(*i.last().unwrap(), 0.0);
    }

    #[test]
    fn test_envelope_rejects_invalid_sample_rate() {
        for fs in [0.0, -1e9, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                envelope(fs, &pulse(PulseShape::Trapezoidal)),
                Err(Error::Timing(_))
            ));
        }
    }

    #[test]
    fn test_envelope_rejects_infinite_times() {
        let base = pulse(PulseShape::Rectangular);
        let cases = [
            PulseEnvelope {
                pulse_width: f64::INFINITY,
                ..base
            },
            PulseEnvelope {
                rise_time: f64::INFINITY,
                ..base
            },
            PulseEnvelope {
                fall_time: f64::INFINITY,
                ..base
            },
        ];
        for case in cases {
            assert!(matches!(envelope(1e9, &case), Err(Error::Timing(_))));
        }
    }

    #[test]
    fn test_raised_cosine_edges() {
        let (i, _) = envelope(1e9, &pulse(PulseShape::RaisedCosine)).unwrap();
        assert!(i[0].abs() < 1e-12);
        assert!((i[99] - 1.0).abs() < 1e-12);
        assert!(i[..100].windows(2).all(|w| w[0] <= w[1]));
        assert!(i.last().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_rectangular_edges_are_zero() {
        let (i, _) = envelope(1e9, &pulse(PulseShape::Rectangular)).unwrap();
        assert!(i[..100].iter().all(|&v| v == 0.0));
        assert!(i[100..1025].iter().all(|&v| v == 1.0));
        assert!(i[1025..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pulse_too_short_for_edges() {
        let short = PulseEnvelope {
            pulse_width: 10e-9,
            ..pulse(PulseShape::Trapezoidal)
        };
        assert!(matches!(envelope(1e9, &short), Err(Error::Timing(_))));
    }

    #[test]
    fn test_iq_combine() {
        assert_eq!(iq_combine(&[1, 2, 3], &[4, 5, 6]).unwrap(), vec![1, 4, 2, 5, 3, 6]);
        assert!(matches!(
            iq_combine(&[1, 2], &[3]),
            Err(Error::LengthMismatch { i: 2, q: 1 })
        ));
    }
}
