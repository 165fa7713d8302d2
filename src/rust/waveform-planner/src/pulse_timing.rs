// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! On-time waveforms and idle durations of pulsed CW signals.
//!
//! A pulse is played as a waveform segment followed by an idle segment that
//! repeats a single DAC value for the rest of the PRI. Idle segments cannot
//! start or end a sequence, so every plan also carries a minimal all-zero
//! end cap waveform.
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::device_config::DeviceConfig;
use crate::grid::{length_to_samples, padding_to_grid, periods_to_samples, truncate_to_samples};
use crate::phase_coherence::{PhaseCoherence, coherent_plan};
use crate::quantize::quantize;
use crate::resolution::ResolutionMode;
use crate::waveform::{Marker, Waveform};
use crate::{Error, Result, Samples};

/// Idle segments shorter than three sequencer clock cycles give undefined
/// trigger-to-output timing.
const MIN_IDLE_CLOCK_CYCLES: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CwPulse {
    pub carrier_frequency: f64,
    pub pulse_width: f64,
    /// Pulse repetition interval in seconds.
    pub pri: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CwPulsePlan {
    pub on_waveform: Waveform,
    pub end_cap: Waveform,
    /// Idle samples between the on waveform and the end cap.
    pub idle_samples: Samples,
    /// Zero samples appended to the pulse to meet the length rules.
    pub padding: usize,
}

/// Output of the pulse train planners, consumed by the sequence table assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseTrainPlan {
    pub pulses: Vec<Waveform>,
    pub end_cap: Waveform,
    /// Idle samples following each pulse. The last entry is followed by the end cap.
    pub idle_samples: Vec<Samples>,
    pub coherence: Option<PhaseCoherence>,
}

impl PulseTrainPlan {
    pub fn pulse_count(&self) -> usize {
        self.pulses.len()
    }
}

impl From<CwPulsePlan> for PulseTrainPlan {
    fn from(plan: CwPulsePlan) -> Self {
        PulseTrainPlan {
            pulses: vec![plan.on_waveform],
            end_cap: plan.end_cap,
            idle_samples: vec![plan.idle_samples],
            coherence: None,
        }
    }
}

/// Minimum idle duration in samples, three sequencer clock cycles of
/// `granularity` samples each.
pub fn min_idle_samples(resolution: ResolutionMode) -> Samples {
    MIN_IDLE_CLOCK_CYCLES * resolution.granularity() as Samples
}

/// Returns whether `idle_samples` satisfies the minimum idle duration.
/// Violations are reported but not rejected, the device still accepts the sequence.
pub fn check_min_idle(idle_samples: Samples, resolution: ResolutionMode) -> bool {
    let min_idle = min_idle_samples(resolution);
    if idle_samples < min_idle {
        awg_log::warn!(
            "Minimum idle time not satisfied ({} < {} samples). Unexpected trigger-to-output behavior likely.",
            idle_samples,
            min_idle
        );
        return false;
    }
    true
}

fn require_direct_mode(resolution: ResolutionMode) -> Result<()> {
    if resolution.is_interpolated() {
        return Err(Error::UnsupportedResolution {
            resolution,
            reason: "CW pulses are synthesized for direct DAC modes ('wpr' or 'wsp')",
        });
    }
    Ok(())
}

fn pulse_samples(config: &DeviceConfig, pulse: &CwPulse) -> Result<usize> {
    if !pulse.pri.is_finite() || pulse.pri <= 0.0 {
        return Err(Error::Timing(format!(
            "PRI must be a positive finite value, got {}",
            pulse.pri
        )));
    }
    if !pulse.pulse_width.is_finite() || pulse.pulse_width <= 0.0 {
        return Err(Error::Timing(format!(
            "Pulse width must be a positive finite value, got {}",
            pulse.pulse_width
        )));
    }
    let samples = truncate_to_samples(pulse.pulse_width, config.sample_rate);
    if samples <= 0 {
        return Err(Error::Timing(format!(
            "Pulse width {} s is shorter than one sample at {} Sa/s",
            pulse.pulse_width, config.sample_rate
        )));
    }
    Ok(samples as usize)
}

/// Sine burst of `samples` points followed by `padding` zeros.
fn sine_burst(
    sample_rate: f64,
    carrier_frequency: f64,
    samples: usize,
    padding: usize,
    phase_deg: f64,
) -> Vec<f64> {
    let phase = phase_deg.to_radians();
    (0..samples)
        .map(|n| (TAU * carrier_frequency * n as f64 / sample_rate + phase).sin())
        .chain(std::iter::repeat_n(0.0, padding))
        .collect()
}

fn end_cap(resolution: ResolutionMode) -> Result<Waveform> {
    quantize(&vec![0.0; resolution.min_length()], resolution)
}

fn idle_after(pri_samples: i64, occupied: usize, pri: f64) -> Result<Samples> {
    let idle = pri_samples - occupied as i64;
    if idle < 0 {
        return Err(Error::Timing(format!(
            "PRI of {pri} s ({pri_samples} samples) is too short for {occupied} samples of waveform data"
        )));
    }
    Ok(idle as Samples)
}

/// Plan a single CW pulse: padded on waveform, end cap and the idle duration
/// between them that realizes the PRI.
pub fn plan_cw_pulse(config: &DeviceConfig, pulse: &CwPulse) -> Result<CwPulsePlan> {
    config.validate()?;
    let resolution = config.resolution;
    require_direct_mode(resolution)?;

    let pw_samples = pulse_samples(config, pulse)?;
    let padding = padding_to_grid(pw_samples, resolution.min_length(), resolution.granularity());
    let samples = sine_burst(
        config.sample_rate,
        pulse.carrier_frequency,
        pw_samples,
        padding,
        0.0,
    );
    let on_waveform = quantize(&samples, resolution)?;
    let end_cap = end_cap(resolution)?;

    let pri_samples = length_to_samples(pulse.pri, config.sample_rate);
    let idle_samples = idle_after(pri_samples, on_waveform.len() + end_cap.len(), pulse.pri)?;
    check_min_idle(idle_samples, resolution);
    awg_log::diagnostic!(
        "CW pulse: {} samples + {} padding, {} idle samples",
        pw_samples,
        padding,
        idle_samples
    );
    Ok(CwPulsePlan {
        on_waveform,
        end_cap,
        idle_samples,
        padding,
    })
}

/// Plan a phase coherent pulse train.
///
/// Pulse `p` starts at phase `p * delta_phi`, so that after the last pulse
/// the carrier phase has wrapped to a multiple of 360 degrees and the train
/// can be looped seamlessly. The first pulse carries a sample marker over its
/// first half.
pub fn plan_coherent_pulse_train(config: &DeviceConfig, pulse: &CwPulse) -> Result<PulseTrainPlan> {
    config.validate()?;
    let resolution = config.resolution;
    require_direct_mode(resolution)?;

    let pw_samples = pulse_samples(config, pulse)?;
    let padding = padding_to_grid(pw_samples, resolution.min_length(), resolution.granularity());
    let coherence = coherent_plan(pulse.carrier_frequency, pulse.pri)?;

    let pulses = (0..coherence.pulse_count)
        .map(|p| {
            let samples = sine_burst(
                config.sample_rate,
                pulse.carrier_frequency,
                pw_samples,
                padding,
                coherence.phase_offset(p),
            );
            let wfm = quantize(&samples, resolution)?;
            if p == 0 {
                let half = wfm.len() / 2;
                return wfm.with_marker(Marker::Sample, 0..half);
            }
            Ok(wfm)
        })
        .collect::<Result<Vec<_>>>()?;
    let end_cap = end_cap(resolution)?;

    let pulse_length = pw_samples + padding;
    let pri_samples = length_to_samples(pulse.pri, config.sample_rate);
    let idle = idle_after(pri_samples, pulse_length, pulse.pri)?;
    let end_idle = idle_after(pri_samples, pulse_length + end_cap.len(), pulse.pri)?;
    check_min_idle(end_idle.min(idle), resolution);

    let mut idle_samples = vec![idle; pulses.len() - 1];
    idle_samples.push(end_idle);
    Ok(PulseTrainPlan {
        pulses,
        end_cap,
        idle_samples,
        coherence: Some(coherence),
    })
}

/// Continuous sine of `granularity` whole carrier periods, to be looped as a
/// single segment. The length must be a whole number of samples that meets
/// the length rules of the resolution.
pub fn cw_waveform(config: &DeviceConfig, carrier_frequency: f64) -> Result<Waveform> {
    config.validate()?;
    let resolution = config.resolution;
    require_direct_mode(resolution)?;
    let samples = periods_to_samples(
        config.sample_rate,
        carrier_frequency,
        resolution.granularity(),
    )?;
    quantize(
        &sine_burst(config.sample_rate, carrier_frequency, samples, 0, 0.0),
        resolution,
    )
}
