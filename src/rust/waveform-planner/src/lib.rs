// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Planning of hardware-legal waveform segments for the sequencer of an
//! arbitrary waveform generator.
//!
//! The crate turns floating point waveform descriptions (CW bursts, phase
//! coherent pulse trains, shaped I/Q envelopes) into quantized [`Waveform`]s
//! that satisfy the length, granularity and binary format rules of the
//! selected [`ResolutionMode`], together with the idle durations needed to
//! realize a pulse repetition interval.

pub mod device_config;
pub mod duc;
pub mod envelope;
pub mod grid;
pub mod phase_coherence;
pub mod pulse_timing;
pub mod quantize;
pub mod resolution;
pub mod waveform;

pub use device_config::DeviceConfig;
pub use duc::{IqPulsePlan, action_config_segment, cw_iq_waveform, plan_iq_pulse};
pub use envelope::{PulseEnvelope, PulseShape, envelope, iq_combine};
pub use phase_coherence::{PhaseCoherence, coherent_plan};
pub use pulse_timing::{
    CwPulse, CwPulsePlan, PulseTrainPlan, cw_waveform, min_idle_samples, plan_coherent_pulse_train,
    plan_cw_pulse,
};
pub use quantize::quantize;
pub use resolution::{InterpolationFactor, ResolutionMode, ResolutionTraits};
pub use waveform::{Marker, SampleLayout, Waveform};

/// Sample counts on the sequencer side (idle durations, PRI lengths).
pub type Samples = u64;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(
        "Waveform length {length} is below the minimum of {min_length} samples for resolution '{resolution}'"
    )]
    Length {
        length: usize,
        min_length: usize,
        resolution: ResolutionMode,
    },
    #[error(
        "Waveform length {length} is not a multiple of the {granularity} sample granularity of resolution '{resolution}'"
    )]
    Granularity {
        length: usize,
        granularity: usize,
        resolution: ResolutionMode,
    },
    #[error("Sample {value} at index {index} is outside of the normalized range [-1, 1]")]
    Amplitude { index: usize, value: f64 },
    #[error("I and Q sample streams differ in length ({i} vs {q})")]
    LengthMismatch { i: usize, q: usize },
    #[error(
        "Invalid pulse shape '{0}'. Choose 'rectangular', 'trapezoidal' or 'raised-cosine'"
    )]
    InvalidShape(String),
    #[error("Invalid resolution '{0}'. Choose 'wpr', 'wsp', 'intx3', 'intx12', 'intx24' or 'intx48'")]
    InvalidResolution(String),
    #[error("Resolution '{resolution}' is not supported here: {reason}")]
    UnsupportedResolution {
        resolution: ResolutionMode,
        reason: &'static str,
    },
    #[error(
        "Phase coherency cycle calculation failed to converge within {max_pulses} pulses for a phase step of {delta_phi} degrees"
    )]
    Convergence { delta_phi: f64, max_pulses: u32 },
    #[error("Marker range {start}..{end} exceeds the waveform length {length}")]
    MarkerRange {
        start: usize,
        end: usize,
        length: usize,
    },
    #[error("{0}")]
    Timing(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new(msg: impl Into<String>) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.into()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
