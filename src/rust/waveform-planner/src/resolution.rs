// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! DAC output resolution modes and their hardware constants.
//!
//! Every mode is described by a [`ResolutionTraits`] entry. The values are
//! hardware contract values of the M8190A-class sequencer and must not be
//! tuned.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Mode specific waveform and sequencer constraints.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolutionTraits {
    pub type_str: &'static str,
    pub dac_bits: u8,
    /// Waveform lengths must be a multiple of this many samples.
    pub granularity: u16,
    /// Minimum waveform length in samples.
    pub min_length: u16,
    /// Full scale value a normalized sample of 1.0 maps to before shifting.
    pub bin_mult: i16,
    /// Left shift applied to the scaled value. The freed low bits carry markers.
    pub bin_shift: u8,
    /// Digital up-conversion interpolation factor, 1 for direct DAC modes.
    pub interpolation_factor: u8,
    /// Idle durations must be a multiple of this many samples.
    pub idle_granularity: u16,
}

pub const WPR_TRAITS: ResolutionTraits = ResolutionTraits {
    type_str: "wpr",
    dac_bits: 14,
    granularity: 48,
    min_length: 240,
    bin_mult: 8191,
    bin_shift: 2,
    interpolation_factor: 1,
    idle_granularity: 1,
};

pub const WSP_TRAITS: ResolutionTraits = ResolutionTraits {
    type_str: "wsp",
    dac_bits: 12,
    granularity: 64,
    min_length: 320,
    bin_mult: 2047,
    bin_shift: 4,
    interpolation_factor: 1,
    idle_granularity: 1,
};

// Granularity, minimum length and binary format are shared by all interpolated modes.
pub const INTX3_TRAITS: ResolutionTraits = ResolutionTraits {
    type_str: "intx3",
    dac_bits: 15,
    granularity: 24,
    min_length: 120,
    bin_mult: 16383,
    bin_shift: 1,
    interpolation_factor: 3,
    idle_granularity: 8,
};

pub const INTX12_TRAITS: ResolutionTraits = ResolutionTraits {
    type_str: "intx12",
    interpolation_factor: 12,
    idle_granularity: 2,
    ..INTX3_TRAITS
};

pub const INTX24_TRAITS: ResolutionTraits = ResolutionTraits {
    type_str: "intx24",
    interpolation_factor: 24,
    idle_granularity: 1,
    ..INTX3_TRAITS
};

pub const INTX48_TRAITS: ResolutionTraits = ResolutionTraits {
    type_str: "intx48",
    interpolation_factor: 48,
    idle_granularity: 1,
    ..INTX3_TRAITS
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolationFactor {
    X3,
    X12,
    X24,
    X48,
}

/// Output resolution of a channel.
///
/// Serialized as the instrument's resolution string, e.g. `"wsp"` or `"intx12"`.
/// Only 16-bit word formats are modelled; 8-bit formats leave no bits for markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResolutionMode {
    /// 14 bit direct mode.
    Precision,
    /// 12 bit direct mode.
    Speed,
    /// Digital up-conversion with the given interpolation factor.
    Interpolated(InterpolationFactor),
}

impl ResolutionMode {
    pub const ALL: [ResolutionMode; 6] = [
        ResolutionMode::Precision,
        ResolutionMode::Speed,
        ResolutionMode::Interpolated(InterpolationFactor::X3),
        ResolutionMode::Interpolated(InterpolationFactor::X12),
        ResolutionMode::Interpolated(InterpolationFactor::X24),
        ResolutionMode::Interpolated(InterpolationFactor::X48),
    ];

    pub const fn traits(&self) -> &'static ResolutionTraits {
        match self {
            ResolutionMode::Precision => &WPR_TRAITS,
            ResolutionMode::Speed => &WSP_TRAITS,
            ResolutionMode::Interpolated(InterpolationFactor::X3) => &INTX3_TRAITS,
            ResolutionMode::Interpolated(InterpolationFactor::X12) => &INTX12_TRAITS,
            ResolutionMode::Interpolated(InterpolationFactor::X24) => &INTX24_TRAITS,
            ResolutionMode::Interpolated(InterpolationFactor::X48) => &INTX48_TRAITS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.traits().type_str
    }

    pub fn granularity(&self) -> usize {
        self.traits().granularity.into()
    }

    pub fn min_length(&self) -> usize {
        self.traits().min_length.into()
    }

    pub fn idle_granularity(&self) -> u64 {
        self.traits().idle_granularity.into()
    }

    pub fn interpolation_factor(&self) -> u32 {
        self.traits().interpolation_factor.into()
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, ResolutionMode::Interpolated(_))
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ResolutionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| Error::InvalidResolution(s.to_string()))
    }
}

impl TryFrom<String> for ResolutionMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResolutionMode> for String {
    fn from(value: ResolutionMode) -> Self {
        value.as_str().to_string()
    }
}
