// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Sequence table assembly.
//!
//! Each row of the sequence table consists of six 32 bit registers:
//!
//! ```text
//! segment: <control>, <sequence loop>, <segment loop | command code>, <segment id>, <start>, <end>
//! idle:    <control>, <sequence loop>, <command code>, <idle sample>, <idle duration>, 0
//! ```
//!
//! The sequencer cannot start or end a sequence on an idle entry.
use crate::action_table::ActionIndex;
use crate::control_word::{CommandCode, ControlWord, WHOLE_SEGMENT_END};
use crate::segment_tracker::{SegmentId, SegmentTracker};
use crate::{Error, MAX_SEQUENCE_LENGTH, MIN_SEQUENCE_LENGTH, Result, Samples};

/// Part of a segment played by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentRange {
    #[default]
    Whole,
    /// Sample offsets of the first and the last played sample.
    Partial { start: u32, end: u32 },
}

impl SegmentRange {
    /// First and last played sample of a partial range.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        match *self {
            SegmentRange::Whole => None,
            SegmentRange::Partial { start, end } => Some((start, end)),
        }
    }

    fn registers(&self) -> (u32, u32) {
        match *self {
            SegmentRange::Whole => (0, WHOLE_SEGMENT_END),
            SegmentRange::Partial { start, end } => (start, end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub segment_id: SegmentId,
    pub loop_count: u32,
    pub range: SegmentRange,
    pub marker_enable: bool,
    /// Action table entry triggered by playing this segment as a
    /// configuration segment.
    pub action: Option<ActionIndex>,
}

impl SegmentDescriptor {
    pub fn new(segment_id: SegmentId) -> Self {
        SegmentDescriptor {
            segment_id,
            loop_count: 1,
            range: SegmentRange::Whole,
            marker_enable: false,
            action: None,
        }
    }

    pub fn with_loop_count(self, loop_count: u32) -> Self {
        SegmentDescriptor { loop_count, ..self }
    }

    pub fn with_range(self, start: u32, end: u32) -> Self {
        SegmentDescriptor {
            range: SegmentRange::Partial { start, end },
            ..self
        }
    }

    pub fn with_markers(self) -> Self {
        SegmentDescriptor {
            marker_enable: true,
            ..self
        }
    }

    /// Play as a configuration segment triggering `action`. Actions are only
    /// evaluated at marker edges, so this also enables markers.
    pub fn with_action(self, action: ActionIndex) -> Self {
        SegmentDescriptor {
            action: Some(action),
            marker_enable: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleDescriptor {
    pub duration: Samples,
    /// DAC value held during the idle time.
    pub sample: i16,
}

impl IdleDescriptor {
    pub fn new(duration: Samples) -> Self {
        IdleDescriptor {
            duration,
            sample: 0,
        }
    }

    pub fn with_sample(self, sample: i16) -> Self {
        IdleDescriptor { sample, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDescriptor {
    Segment(SegmentDescriptor),
    Idle(IdleDescriptor),
}

impl From<SegmentDescriptor> for EntryDescriptor {
    fn from(value: SegmentDescriptor) -> Self {
        EntryDescriptor::Segment(value)
    }
}

impl From<IdleDescriptor> for EntryDescriptor {
    fn from(value: IdleDescriptor) -> Self {
        EntryDescriptor::Idle(value)
    }
}

/// An encoded sequence table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEntry {
    Segment {
        control: ControlWord,
        sequence_loop_count: u32,
        segment_loop_count: u32,
        /// Replaces the segment loop count for configuration segments.
        command: Option<CommandCode>,
        segment_id: SegmentId,
        start: u32,
        end: u32,
    },
    Idle {
        control: ControlWord,
        sequence_loop_count: u32,
        idle_sample: i16,
        duration: u32,
    },
}

impl SequenceEntry {
    pub fn control(&self) -> ControlWord {
        match self {
            SequenceEntry::Segment { control, .. } | SequenceEntry::Idle { control, .. } => *control,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SequenceEntry::Idle { .. })
    }

    /// The six registers written for this row.
    pub fn registers(&self) -> [u32; 6] {
        match *self {
            SequenceEntry::Segment {
                control,
                sequence_loop_count,
                segment_loop_count,
                command,
                segment_id,
                start,
                end,
            } => [
                control.bits(),
                sequence_loop_count,
                command.map_or(segment_loop_count, CommandCode::bits),
                segment_id,
                start,
                end,
            ],
            SequenceEntry::Idle {
                control,
                sequence_loop_count,
                idle_sample,
                duration,
            } => [
                control.bits(),
                sequence_loop_count,
                CommandCode::IDLE.bits(),
                u32::from(idle_sample as u16),
                duration,
                0,
            ],
        }
    }
}

/// Position of the builder within the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    /// Nothing pushed yet, only a segment may follow.
    Start,
    /// The last entry is a segment, the sequence may be closed.
    Middle,
    /// The last entry is idle, another entry must follow.
    AfterIdle,
}

/// Builds the rows of one sequence.
///
/// Entries are checked as they are pushed; [`SequenceTableBuilder::finish`]
/// then encodes the control words: start of sequence on the first entry,
/// end of sequence on the last one. The sequence loop count is carried by
/// the first entry.
pub struct SequenceTableBuilder<'a> {
    descriptors: Vec<EntryDescriptor>,
    state: BuilderState,
    loop_count: u32,
    segments: Option<&'a SegmentTracker>,
}

impl Default for SequenceTableBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SequenceTableBuilder<'a> {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            state: BuilderState::Start,
            loop_count: 1,
            segments: None,
        }
    }

    /// Number of times the whole sequence is played.
    pub fn with_loop_count(self, loop_count: u32) -> Self {
        Self { loop_count, ..self }
    }

    /// Check segment references and partial ranges against `segments`.
    pub fn with_segments(self, segments: &'a SegmentTracker) -> Self {
        Self {
            segments: Some(segments),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn push(&mut self, entry: impl Into<EntryDescriptor>) -> Result<&mut Self> {
        let entry = entry.into();
        if self.descriptors.len() == MAX_SEQUENCE_LENGTH {
            return Err(Error::LengthBounds(format!(
                "Sequence length exceeds the maximum of {MAX_SEQUENCE_LENGTH} entries"
            )));
        }
        self.state = match (self.state, &entry) {
            (BuilderState::Start, EntryDescriptor::Idle(_)) => {
                return Err(Error::Structural(
                    "the first entry of a sequence cannot be an idle entry".to_string(),
                ));
            }
            (_, EntryDescriptor::Segment(segment)) => {
                self.check_segment(segment)?;
                BuilderState::Middle
            }
            (_, EntryDescriptor::Idle(idle)) => {
                idle_duration(idle)?;
                BuilderState::AfterIdle
            }
        };
        self.descriptors.push(entry);
        Ok(self)
    }

    fn check_segment(&self, segment: &SegmentDescriptor) -> Result<()> {
        if segment.loop_count == 0 {
            return Err(Error::new(format!(
                "Segment {} must be played at least once",
                segment.segment_id
            )));
        }
        if segment.action.is_some() && segment.loop_count != 1 {
            return Err(Error::new(format!(
                "Configuration segment {} cannot be looped",
                segment.segment_id
            )));
        }
        if let Some((start, end)) = segment.range.bounds().filter(|(start, end)| start > end) {
            return Err(Error::LengthBounds(format!(
                "Segment {} range starts at sample {start} after its end at sample {end}",
                segment.segment_id
            )));
        }
        let Some(segments) = self.segments else {
            return Ok(());
        };
        let length = segments
            .segment_length(segment.segment_id)
            .ok_or(Error::UnknownSegment(segment.segment_id))?;
        if let Some((_, end)) = segment.range.bounds().filter(|&(_, end)| end as usize >= length) {
            return Err(Error::LengthBounds(format!(
                "Segment {} range ends at sample {end}, the segment has {length} samples",
                segment.segment_id
            )));
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Vec<SequenceEntry>> {
        let length = self.descriptors.len();
        if length < MIN_SEQUENCE_LENGTH {
            return Err(Error::LengthBounds(format!(
                "Sequence length {length} is below the minimum of {MIN_SEQUENCE_LENGTH} entries"
            )));
        }
        if self.state == BuilderState::AfterIdle {
            return Err(Error::Structural(
                "the last entry of a sequence cannot be an idle entry".to_string(),
            ));
        }
        if self.loop_count == 0 {
            return Err(Error::new("Sequence loop count must be at least 1"));
        }

        let last = length - 1;
        let entries = self
            .descriptors
            .iter()
            .enumerate()
            .map(|(k, descriptor)| {
                let control = ControlWord::default()
                    .with_start_of_sequence(k == 0)
                    .with_end_of_sequence(k == last);
                let sequence_loop_count = if k == 0 { self.loop_count } else { 0 };
                Ok(match descriptor {
                    EntryDescriptor::Segment(segment) => {
                        let (start, end) = segment.range.registers();
                        SequenceEntry::Segment {
                            control: control
                                .with_command(segment.action.is_some())
                                .with_marker_enable(segment.marker_enable),
                            sequence_loop_count,
                            segment_loop_count: segment.loop_count,
                            command: segment.action.map(CommandCode::config_segment),
                            segment_id: segment.segment_id,
                            start,
                            end,
                        }
                    }
                    EntryDescriptor::Idle(idle) => SequenceEntry::Idle {
                        control: control.with_command(true),
                        sequence_loop_count,
                        idle_sample: idle.sample,
                        duration: idle_duration(idle)?,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        awg_log::diagnostic!("Sequence table with {} entries", entries.len());
        Ok(entries)
    }
}

fn idle_duration(idle: &IdleDescriptor) -> Result<u32> {
    u32::try_from(idle.duration).map_err(|_| {
        Error::LengthBounds(format!(
            "Idle duration of {} samples exceeds the idle delay register",
            idle.duration
        ))
    })
}

/// Encode an ordered list of entry descriptors into sequence table rows.
pub fn build(entries: impl IntoIterator<Item = EntryDescriptor>) -> Result<Vec<SequenceEntry>> {
    let mut builder = SequenceTableBuilder::new();
    for entry in entries {
        builder.push(entry)?;
    }
    builder.finish()
}
