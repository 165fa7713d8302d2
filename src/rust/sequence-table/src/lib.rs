// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Sequencer programs for an arbitrary waveform generator.
//!
//! Planned waveforms are bound to segment ids, arranged into sequence table
//! entries with their bit packed control words, and optionally paired with
//! an action table that changes playback parameters at marker edges. A
//! [`SequenceProgram`] bundles all of it for one channel and loads it through
//! an [`AwgDevice`].

pub mod action_table;
pub mod control_word;
pub mod device;
pub mod pulse_train;
pub mod scpi;
pub mod segment_tracker;
pub mod sequence_table;

pub use action_table::{ActionCommand, ActionEntry, ActionIndex, ActionParameter, ActionTableBuilder};
pub use control_word::{CommandCode, CommandSelector, ControlWord};
pub use device::{AwgDevice, SequenceProgram};
pub use pulse_train::{
    action_sweep_program, cw_pulse_program, frequency_agile_program, pulse_train_program,
};
pub use scpi::{ScpiCommand, ScpiScript};
pub use segment_tracker::{SegmentId, SegmentInfo, SegmentTracker};
pub use sequence_table::{
    EntryDescriptor, IdleDescriptor, SegmentDescriptor, SegmentRange, SequenceEntry,
    SequenceTableBuilder, build,
};
pub use waveform_planner::Samples;

/// Smallest number of entries the sequencer accepts in a sequence.
pub const MIN_SEQUENCE_LENGTH: usize = 2;
/// Capacity of the sequence table.
pub const MAX_SEQUENCE_LENGTH: usize = 512_000;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid sequence structure: {0}")]
    Structural(String),
    #[error("{0}")]
    LengthBounds(String),
    #[error(
        "Unknown action table parameter '{0}'. Choose 'amplitude', 'phase-offset', 'phase-reset', 'carrier-frequency', 'sample-rate', 'run', 'restart' or 'hold'"
    )]
    UnknownParameter(String),
    #[error("Action table entry {0} has not been defined")]
    UnknownAction(ActionIndex),
    #[error("Invalid value for action parameter '{parameter}': {reason}")]
    ActionValue {
        parameter: ActionParameter,
        reason: String,
    },
    #[error("Segment {0} has not been defined")]
    UnknownSegment(SegmentId),
    #[error(transparent)]
    Planner(#[from] waveform_planner::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new(msg: impl Into<String>) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.into()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
