// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Sample grid helpers.
use crate::{Error, Result};

/// Relative deviation from an integer still accepted as a whole sample count.
const WHOLE_SAMPLE_TOLERANCE: f64 = 1e-9;

pub fn ceil_to_grid(value: u64, grid: u64) -> u64 {
    value + (grid - (value % grid)) % grid
}

/// Number of zero samples to append to a waveform of `length` samples so that it
/// satisfies the minimum length and granularity of the sequencer.
///
/// Waveforms shorter than `min_length` are padded to exactly `min_length`.
/// Longer waveforms are padded up to the next multiple of `granularity`;
/// a waveform already on the grid gets no padding.
pub fn padding_to_grid(length: usize, min_length: usize, granularity: usize) -> usize {
    if length < min_length {
        return min_length - length;
    }
    match length % granularity {
        0 => 0,
        remainder => granularity - remainder,
    }
}

/// Convert a duration to samples, rounding to the nearest sample.
pub fn length_to_samples(t: f64, sampling_rate: f64) -> i64 {
    (t * sampling_rate).round() as i64
}

/// Convert a duration to samples, truncating towards zero.
pub fn truncate_to_samples(t: f64, sampling_rate: f64) -> i64 {
    (t * sampling_rate) as i64
}

/// Length in samples of `periods` carrier periods of `frequency` at
/// `sampling_rate`. Fails unless the length is a whole number of samples.
pub fn periods_to_samples(sampling_rate: f64, frequency: f64, periods: usize) -> Result<usize> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(Error::Timing(format!(
            "Carrier frequency must be a positive finite value, got {frequency}"
        )));
    }
    let length = sampling_rate / frequency * periods as f64;
    let samples = length.round();
    if !length.is_finite()
        || samples < 1.0
        || (length - samples).abs() > WHOLE_SAMPLE_TOLERANCE * samples
    {
        return Err(Error::Timing(format!(
            "{periods} periods of {frequency} Hz at {sampling_rate} Sa/s span {length} samples, not a whole number"
        )));
    }
    Ok(samples as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rounding() {
        assert_eq!(ceil_to_grid(100, 24), 120);
        assert_eq!(ceil_to_grid(96, 24), 96);
        assert_eq!(ceil_to_grid(0, 8), 0);
    }

    #[test]
    fn test_padding_to_grid() {
        // Below minimum length
        assert_eq!(padding_to_grid(100, 320, 64), 220);
        assert_eq!(padding_to_grid(0, 240, 48), 240);
        // Off grid
        assert_eq!(padding_to_grid(10000, 320, 64), 48);
        assert_eq!(padding_to_grid(321, 320, 64), 63);
        // Already on grid, no extra granule
        assert_eq!(padding_to_grid(320, 320, 64), 0);
        assert_eq!(padding_to_grid(9984, 320, 64), 0);
    }

    #[test]
    fn test_periods_to_samples() {
        assert_eq!(periods_to_samples(10e9, 100e6, 64).unwrap(), 6400);
        assert_eq!(periods_to_samples(2.4e9, 100e6, 24).unwrap(), 576);
        assert!(matches!(
            periods_to_samples(10e9, 3e9, 64),
            Err(Error::Timing(_))
        ));
        assert!(matches!(
            periods_to_samples(10e9, 0.0, 64),
            Err(Error::Timing(_))
        ));
        assert!(matches!(
            periods_to_samples(10e9, f64::NAN, 64),
            Err(Error::Timing(_))
        ));
    }

    #[test]
    fn test_seconds_to_samples() {
        assert_eq!(length_to_samples(0.0, 10e9), 0);
        assert_eq!(length_to_samples(10.153e-6, 10e9), 101530);
        assert_eq!(length_to_samples(20e-6, 2.4e9), 48000);
        assert_eq!(truncate_to_samples(1e-6, 10e9), 10000);
        assert_eq!(truncate_to_samples(12e-9, 1.8e9), 21);
    }
}
