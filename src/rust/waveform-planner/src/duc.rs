// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Segments for the digital up-conversion (interpolated) modes.
//!
//! In these modes the waveform memory holds baseband I/Q pairs and the
//! carrier is applied by the DAC. Parameter changes are triggered from the
//! action table by playing a configuration segment; the action fires at the
//! first sample marker after the first [`CONFIG_SEGMENT_PAIRS`] pairs.
use crate::device_config::DeviceConfig;
use crate::envelope::{PulseEnvelope, envelope};
use crate::grid::{ceil_to_grid, padding_to_grid, periods_to_samples, truncate_to_samples};
use crate::quantize::quantize;
use crate::resolution::ResolutionMode;
use crate::waveform::{Marker, Waveform};
use crate::{Error, Result, Samples};

/// Minimum length of a configuration segment in I/Q pairs.
pub const CONFIG_SEGMENT_PAIRS: usize = 240;

/// A configuration segment that is played on its own must satisfy the minimum
/// linear playtime of `257 * granularity` pairs.
pub const LINEAR_PLAYTIME_GRANULES: usize = 257;

#[derive(Debug, Clone, PartialEq)]
pub struct IqPulsePlan {
    /// Shaped pulse, marked over its whole length.
    pub pulse: Waveform,
    /// Empty configuration segment played ahead of each pulse.
    pub config_segment: Waveform,
    pub idle_samples: Samples,
    /// Idle before the closing configuration segment.
    pub end_idle_samples: Samples,
}

fn require_interpolated(resolution: ResolutionMode) -> Result<()> {
    if !resolution.is_interpolated() {
        return Err(Error::UnsupportedResolution {
            resolution,
            reason: "digital up-conversion requires an interpolated mode ('intx<factor>')",
        });
    }
    Ok(())
}

/// Round an idle count up to the idle granularity of `resolution`.
pub fn round_up_to_idle_granularity(idle_samples: Samples, resolution: ResolutionMode) -> Samples {
    let rounded = ceil_to_grid(idle_samples, resolution.idle_granularity());
    if rounded != idle_samples {
        awg_log::warn!(
            "Idle granularity of {} not met, idle count increased by {} to {}",
            resolution.idle_granularity(),
            rounded - idle_samples,
            rounded
        );
    }
    rounded
}

fn iq_segment(i: &[f64], q: &[f64], resolution: ResolutionMode) -> Result<Waveform> {
    Waveform::interleave(quantize(i, resolution)?, quantize(q, resolution)?)
}

/// Plan a shaped pulse for a frequency agile pulse train.
///
/// The envelope is computed at the baseband rate, padded to the length rules
/// and marked with sample and sync markers over the whole pulse. The idle
/// counts realize `pri` for a period of config segment, pulse and idle.
pub fn plan_iq_pulse(config: &DeviceConfig, pulse: &PulseEnvelope, pri: f64) -> Result<IqPulsePlan> {
    config.validate()?;
    let resolution = config.resolution;
    require_interpolated(resolution)?;
    if !pri.is_finite() || pri <= 0.0 {
        return Err(Error::Timing(format!(
            "PRI must be a positive finite value, got {pri}"
        )));
    }
    let fs = config.baseband_sample_rate();

    let (mut i, mut q) = envelope(fs, pulse)?;
    let padding = padding_to_grid(i.len(), resolution.min_length(), resolution.granularity());
    i.resize(i.len() + padding, 0.0);
    q.resize(q.len() + padding, 0.0);
    let length = i.len();
    let pulse = iq_segment(&i, &q, resolution)?
        .with_marker(Marker::Sample, 0..length)?
        .with_marker(Marker::Sync, 0..length)?;

    let zeros = vec![0.0; CONFIG_SEGMENT_PAIRS];
    let config_segment = iq_segment(&zeros, &zeros, resolution)?;

    let pri_samples = truncate_to_samples(pri, fs);
    let idle = pri_samples - (pulse.len() + config_segment.len()) as i64;
    let end_idle = idle - config_segment.len() as i64;
    if end_idle < 0 {
        return Err(Error::Timing(format!(
            "PRI of {pri} s ({pri_samples} pairs) is too short for a {} pair pulse and two {} pair configuration segments",
            pulse.len(),
            config_segment.len()
        )));
    }
    let idle_samples = round_up_to_idle_granularity(idle as Samples, resolution);
    let end_idle_samples = round_up_to_idle_granularity(end_idle as Samples, resolution);
    awg_log::diagnostic!(
        "I/Q pulse: {} pairs ({} padding), idle {} / {} pairs",
        pulse.len(),
        padding,
        idle_samples,
        end_idle_samples
    );
    Ok(IqPulsePlan {
        pulse,
        config_segment,
        idle_samples,
        end_idle_samples,
    })
}

/// Configuration segment for a sequence of action table entries.
///
/// Full scale I and Q, with sample and sync markers over the pairs
/// `[240, 480)`, long enough to satisfy the minimum linear playtime.
pub fn action_config_segment(config: &DeviceConfig) -> Result<Waveform> {
    config.validate()?;
    let resolution = config.resolution;
    require_interpolated(resolution)?;
    let length = LINEAR_PLAYTIME_GRANULES * resolution.granularity();
    let ones = vec![1.0; length];
    let markers = CONFIG_SEGMENT_PAIRS..2 * CONFIG_SEGMENT_PAIRS;
    iq_segment(&ones, &ones, resolution)?
        .with_marker(Marker::Sample, markers.clone())?
        .with_marker(Marker::Sync, markers)
}

/// Unmodulated full scale carrier: `granularity` carrier periods of constant
/// I = Q = 1 at the baseband rate, with sample and sync markers on the first
/// half of the segment.
pub fn cw_iq_waveform(config: &DeviceConfig, carrier_frequency: f64) -> Result<Waveform> {
    config.validate()?;
    let resolution = config.resolution;
    require_interpolated(resolution)?;
    let length = periods_to_samples(
        config.baseband_sample_rate(),
        carrier_frequency,
        resolution.granularity(),
    )?;
    let ones = vec![1.0; length];
    let half = length / 2;
    iq_segment(&ones, &ones, resolution)?
        .with_marker(Marker::Sample, 0..half)?
        .with_marker(Marker::Sync, 0..half)
}
