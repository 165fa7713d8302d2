// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Conversion of normalized samples into the DAC binary format.
use crate::resolution::ResolutionMode;
use crate::waveform::Waveform;
use crate::{Error, Result};

/// Check a waveform length against the minimum length and granularity of `resolution`.
pub fn check_length(length: usize, resolution: ResolutionMode) -> Result<()> {
    let min_length = resolution.min_length();
    if length < min_length {
        return Err(Error::Length {
            length,
            min_length,
            resolution,
        });
    }
    let granularity = resolution.granularity();
    if length % granularity != 0 {
        return Err(Error::Granularity {
            length,
            granularity,
            resolution,
        });
    }
    Ok(())
}

/// Quantize normalized samples in `[-1, 1]` into the binary format of `resolution`.
///
/// Each sample is scaled by the mode's `bin_mult`, truncated towards zero to a
/// signed 16 bit integer and shifted left by `bin_shift`. The result is not
/// meant to be quantized again.
pub fn quantize(samples: &[f64], resolution: ResolutionMode) -> Result<Waveform> {
    check_length(samples.len(), resolution)?;
    let traits = resolution.traits();
    let bin_mult = f64::from(traits.bin_mult);
    let words = samples
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if !value.is_finite() || value.abs() > 1.0 {
                return Err(Error::Amplitude { index, value });
            }
            Ok(((bin_mult * value) as i16) << traits.bin_shift)
        })
        .collect::<Result<Vec<i16>>>()?;
    Ok(Waveform::new_real(words, resolution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InterpolationFactor;
    use proptest::prelude::*;

    #[test]
    fn test_min_length_boundary() {
        for mode in ResolutionMode::ALL {
            let min_length = mode.min_length();
            assert!(quantize(&vec![0.0; min_length], mode).is_ok());
            assert!(matches!(
                quantize(&vec![0.0; min_length - 1], mode),
                Err(Error::Length { .. })
            ));
        }
    }

    #[test]
    fn test_granularity_boundary() {
        for mode in ResolutionMode::ALL {
            let min_length = mode.min_length();
            assert!(quantize(&vec![0.0; min_length + mode.granularity()], mode).is_ok());
            assert!(matches!(
                quantize(&vec![0.0; min_length + 1], mode),
                Err(Error::Granularity { .. })
            ));
        }
    }

    #[test]
    fn test_binary_format() {
        let samples: Vec<f64> = [1.0, -1.0, 0.5, -0.5, 0.0001, -0.9999]
            .into_iter()
            .cycle()
            .take(240)
            .collect();
        let wfm = quantize(&samples, ResolutionMode::Precision).unwrap();
        assert_eq!(
            &wfm.words()[..6],
            &[8191 << 2, -8191 << 2, 4095 << 2, -4095 << 2, 0, -8190 << 2]
        );

        let wfm = quantize(&vec![1.0; 320], ResolutionMode::Speed).unwrap();
        assert_eq!(wfm.words()[0], 32752);

        let mode = ResolutionMode::Interpolated(InterpolationFactor::X48);
        let wfm = quantize(&vec![-1.0; 120], mode).unwrap();
        assert_eq!(wfm.words()[0], -32766);
    }

    #[test]
    fn test_out_of_range_sample() {
        let mut samples = vec![0.0; 320];
        samples[17] = 1.5;
        assert!(matches!(
            quantize(&samples, ResolutionMode::Speed),
            Err(Error::Amplitude { index: 17, .. })
        ));
        samples[17] = f64::NAN;
        assert!(quantize(&samples, ResolutionMode::Speed).is_err());
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<f64> = (0..480).map(|n| (n as f64 * 0.01).sin()).collect();
        let a = quantize(&samples, ResolutionMode::Precision).unwrap();
        let b = quantize(&samples, ResolutionMode::Precision).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn quantized_length_is_legal(mode_index in 0usize..6, length in 0usize..2000) {
            let mode = ResolutionMode::ALL[mode_index];
            let result = quantize(&vec![0.25; length], mode);
            let legal = length >= mode.min_length() && length % mode.granularity() == 0;
            prop_assert_eq!(result.is_ok(), legal);
            if let Ok(wfm) = result {
                prop_assert_eq!(wfm.len(), length);
            }
        }

        #[test]
        fn decode_recovers_truncated_code(mode_index in 0usize..6, value in -1.0f64..=1.0) {
            let mode = ResolutionMode::ALL[mode_index];
            let wfm = quantize(&vec![value; mode.min_length()], mode).unwrap();
            let expected = (f64::from(mode.traits().bin_mult) * value) as i16;
            prop_assert!(wfm.dac_codes().iter().all(|&c| c == expected));
        }
    }
}
