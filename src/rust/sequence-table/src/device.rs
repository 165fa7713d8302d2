// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use waveform_planner::Waveform;

use crate::action_table::ActionEntry;
use crate::segment_tracker::SegmentId;
use crate::sequence_table::SequenceEntry;

/// Transport to the instrument.
///
/// Implementations own the connection and the command syntax; errors are
/// returned to the caller of [`SequenceProgram::load`] unchanged.
pub trait AwgDevice {
    type Error: std::error::Error;

    /// Define segment `segment_id` with the length of `waveform` and transfer its data.
    fn download_segment(
        &mut self,
        channel: u8,
        segment_id: SegmentId,
        waveform: &Waveform,
    ) -> Result<(), Self::Error>;

    /// Define a new sequence sized to `entries` and write one row per entry, in order.
    fn load_sequence_table(
        &mut self,
        channel: u8,
        entries: &[SequenceEntry],
    ) -> Result<(), Self::Error>;

    /// Define one action table entry per element of `actions` and append its commands.
    fn load_action_table(&mut self, channel: u8, actions: &[ActionEntry]) -> Result<(), Self::Error>;

    fn select_and_arm(&mut self, channel: u8, sequence_index: u32) -> Result<(), Self::Error>;

    fn start_playback(&mut self, channel: u8, continuous: bool) -> Result<(), Self::Error>;
}

/// Everything one channel needs to play a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceProgram {
    /// Segments in download order.
    pub segments: Vec<(SegmentId, Waveform)>,
    pub sequence: Vec<SequenceEntry>,
    pub actions: Vec<ActionEntry>,
}

impl SequenceProgram {
    /// Download the segments, then the action table (if any), then the sequence table.
    pub fn load<D: AwgDevice>(&self, device: &mut D, channel: u8) -> Result<(), D::Error> {
        for (segment_id, waveform) in &self.segments {
            device.download_segment(channel, *segment_id, waveform)?;
        }
        if !self.actions.is_empty() {
            device.load_action_table(channel, &self.actions)?;
        }
        device.load_sequence_table(channel, &self.sequence)?;
        awg_log::info!(
            "Loaded {} segments, {} actions and {} sequence entries on channel {}",
            self.segments.len(),
            self.actions.len(),
            self.sequence.len(),
            channel
        );
        Ok(())
    }

    /// Load the program, select sequence 0 and start playback.
    pub fn load_and_play<D: AwgDevice>(
        &self,
        device: &mut D,
        channel: u8,
        continuous: bool,
    ) -> Result<(), D::Error> {
        self.load(device, channel)?;
        device.select_and_arm(channel, 0)?;
        device.start_playback(channel, continuous)
    }
}
