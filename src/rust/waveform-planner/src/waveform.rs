// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::ops::Range;

use crate::envelope::iq_combine;
use crate::resolution::ResolutionMode;
use crate::{Error, Result};

/// How the words of a [`Waveform`] map to DAC samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleLayout {
    /// One word per sample.
    Real,
    /// Interleaved I/Q pairs, `I0, Q0, I1, Q1, ...`.
    Iq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Sample,
    Sync,
}

/// A quantized waveform in the device binary format.
///
/// Lengths are reported in the unit the sequencer defines segments in:
/// samples for [`SampleLayout::Real`] and I/Q pairs for [`SampleLayout::Iq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    words: Vec<i16>,
    resolution: ResolutionMode,
    layout: SampleLayout,
}

impl Waveform {
    pub(crate) fn new_real(words: Vec<i16>, resolution: ResolutionMode) -> Self {
        Waveform {
            words,
            resolution,
            layout: SampleLayout::Real,
        }
    }

    /// Interleave two quantized waveforms into a single I/Q waveform.
    pub fn interleave(i: Waveform, q: Waveform) -> Result<Waveform> {
        if i.layout != SampleLayout::Real || q.layout != SampleLayout::Real {
            return Err(Error::new("Only real waveforms can be interleaved into I/Q"));
        }
        if i.resolution != q.resolution {
            return Err(Error::new(format!(
                "I and Q waveforms use different resolutions ('{}' vs '{}')",
                i.resolution, q.resolution
            )));
        }
        let words = iq_combine(&i.words, &q.words)?;
        Ok(Waveform {
            words,
            resolution: i.resolution,
            layout: SampleLayout::Iq,
        })
    }

    pub fn resolution(&self) -> ResolutionMode {
        self.resolution
    }

    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    /// Raw 16 bit words as transferred to the segment memory.
    pub fn words(&self) -> &[i16] {
        &self.words
    }

    /// Segment length in samples, or in I/Q pairs for [`SampleLayout::Iq`].
    pub fn len(&self) -> usize {
        match self.layout {
            SampleLayout::Real => self.words.len(),
            SampleLayout::Iq => self.words.len() / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Scaled DAC codes with the marker bits removed.
    ///
    /// For a sample `x` this recovers `(bin_mult * x) as i16`.
    pub fn dac_codes(&self) -> Vec<i16> {
        let shift = self.resolution.traits().bin_shift;
        self.words.iter().map(|w| w >> shift).collect()
    }

    fn marker_position(&self, marker: Marker) -> Result<(usize, u8)> {
        // (word offset within a sample, bit)
        let position = match (self.layout, marker) {
            (SampleLayout::Real, Marker::Sample) => (0, 0),
            (SampleLayout::Real, Marker::Sync) => (0, 1),
            (SampleLayout::Iq, Marker::Sample) => (0, 0),
            (SampleLayout::Iq, Marker::Sync) => (1, 0),
        };
        if position.1 >= self.resolution.traits().bin_shift {
            return Err(Error::new(format!(
                "Resolution '{}' has no free bit for the {:?} marker of a {:?} waveform",
                self.resolution, marker, self.layout
            )));
        }
        Ok(position)
    }

    /// Set `marker` on the samples (or I/Q pairs) in `range`.
    pub fn with_marker(mut self, marker: Marker, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(Error::MarkerRange {
                start: range.start,
                end: range.end,
                length: self.len(),
            });
        }
        let (offset, bit) = self.marker_position(marker)?;
        let stride = match self.layout {
            SampleLayout::Real => 1,
            SampleLayout::Iq => 2,
        };
        for index in range {
            self.words[index * stride + offset] |= 1 << bit;
        }
        Ok(self)
    }

    pub fn has_marker(&self, marker: Marker, index: usize) -> bool {
        let Ok((offset, bit)) = self.marker_position(marker) else {
            return false;
        };
        let stride = match self.layout {
            SampleLayout::Real => 1,
            SampleLayout::Iq => 2,
        };
        self.words
            .get(index * stride + offset)
            .is_some_and(|w| w & (1 << bit) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::quantize;

    #[test]
    fn test_interleave_counts_pairs() {
        let mode = "intx3".parse::<ResolutionMode>().unwrap();
        let i = quantize(&vec![1.0; 120], mode).unwrap();
        let q = quantize(&vec![0.0; 120], mode).unwrap();
        let iq = Waveform::interleave(i, q).unwrap();
        assert_eq!(iq.layout(), SampleLayout::Iq);
        assert_eq!(iq.len(), 120);
        assert_eq!(iq.words().len(), 240);
        assert_eq!(&iq.words()[..4], &[16383 << 1, 0, 16383 << 1, 0]);
    }

    #[test]
    fn test_interleave_length_mismatch() {
        let mode = ResolutionMode::Interpolated(crate::InterpolationFactor::X24);
        let i = quantize(&vec![0.0; 120], mode).unwrap();
        let q = quantize(&vec![0.0; 144], mode).unwrap();
        assert!(matches!(
            Waveform::interleave(i, q),
            Err(Error::LengthMismatch { i: 120, q: 144 })
        ));
    }

    #[test]
    fn test_real_markers() {
        let wfm = quantize(&vec![-1.0; 320], ResolutionMode::Speed)
            .unwrap()
            .with_marker(Marker::Sample, 0..160)
            .unwrap()
            .with_marker(Marker::Sync, 100..101)
            .unwrap();
        assert!(wfm.has_marker(Marker::Sample, 0));
        assert!(wfm.has_marker(Marker::Sample, 159));
        assert!(!wfm.has_marker(Marker::Sample, 160));
        assert!(wfm.has_marker(Marker::Sync, 100));
        assert!(!wfm.has_marker(Marker::Sync, 99));
        assert_eq!(wfm.words()[0], (-2047i16 << 4) | 1);
        // Markers are dropped when decoding
        assert!(wfm.dac_codes().iter().all(|&c| c == -2047));
    }

    #[test]
    fn test_iq_markers() {
        let mode = ResolutionMode::Interpolated(crate::InterpolationFactor::X12);
        let i = quantize(&vec![0.0; 120], mode).unwrap();
        let q = quantize(&vec![0.0; 120], mode).unwrap();
        let iq = Waveform::interleave(i, q)
            .unwrap()
            .with_marker(Marker::Sample, 0..120)
            .unwrap()
            .with_marker(Marker::Sync, 10..20)
            .unwrap();
        assert_eq!(iq.words()[0], 1);
        assert_eq!(iq.words()[1], 0);
        assert_eq!(iq.words()[20], 1);
        assert_eq!(iq.words()[21], 1);
        assert!(iq.has_marker(Marker::Sync, 19));
        assert!(!iq.has_marker(Marker::Sync, 20));
    }

    #[test]
    fn test_marker_out_of_range() {
        let wfm = quantize(&vec![0.0; 240], ResolutionMode::Precision).unwrap();
        assert!(matches!(
            wfm.with_marker(Marker::Sample, 200..241),
            Err(Error::MarkerRange { end: 241, .. })
        ));
    }

    #[test]
    fn test_no_free_sync_bit_on_real_interpolated_waveform() {
        let mode = ResolutionMode::Interpolated(crate::InterpolationFactor::X3);
        let wfm = quantize(&vec![0.0; 120], mode).unwrap();
        assert!(wfm.clone().with_marker(Marker::Sample, 0..1).is_ok());
        assert!(wfm.with_marker(Marker::Sync, 0..1).is_err());
    }
}
