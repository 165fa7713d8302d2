// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Bit layout of the sequence table control registers.
use std::fmt;

use crate::action_table::ActionIndex;

/// Set when the entry reads a command code (idle entries and config segments).
pub const COMMAND_BIT: u32 = 1 << 31;
pub const END_OF_SEQUENCE_BIT: u32 = 1 << 30;
pub const START_OF_SEQUENCE_BIT: u32 = 1 << 28;
pub const MARKER_ENABLE_BIT: u32 = 1 << 24;

/// Segment end register value selecting the last sample of the segment.
pub const WHOLE_SEGMENT_END: u32 = u32::MAX;

/// The `<control_entry>` register of a sequence table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlWord(u32);

impl ControlWord {
    pub const fn bits(self) -> u32 {
        self.0
    }

    const fn with(self, bit: u32, enabled: bool) -> Self {
        if enabled {
            ControlWord(self.0 | bit)
        } else {
            ControlWord(self.0 & !bit)
        }
    }

    pub const fn with_command(self, enabled: bool) -> Self {
        self.with(COMMAND_BIT, enabled)
    }

    pub const fn with_end_of_sequence(self, enabled: bool) -> Self {
        self.with(END_OF_SEQUENCE_BIT, enabled)
    }

    pub const fn with_start_of_sequence(self, enabled: bool) -> Self {
        self.with(START_OF_SEQUENCE_BIT, enabled)
    }

    pub const fn with_marker_enable(self, enabled: bool) -> Self {
        self.with(MARKER_ENABLE_BIT, enabled)
    }

    pub const fn is_command(self) -> bool {
        self.0 & COMMAND_BIT != 0
    }

    pub const fn is_end_of_sequence(self) -> bool {
        self.0 & END_OF_SEQUENCE_BIT != 0
    }

    pub const fn is_start_of_sequence(self) -> bool {
        self.0 & START_OF_SEQUENCE_BIT != 0
    }

    pub const fn marker_enabled(self) -> bool {
        self.0 & MARKER_ENABLE_BIT != 0
    }
}

impl From<ControlWord> for u32 {
    fn from(value: ControlWord) -> Self {
        value.bits()
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// What a command entry plays, bits 0-15 of the command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandSelector {
    Idle = 0,
    ConfigSegment = 1,
}

/// The `<command_code>` register: action table index in bits 16-31, selector
/// in bits 0-15. Action index 0 triggers no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandCode {
    pub action: Option<ActionIndex>,
    pub selector: CommandSelector,
}

impl CommandCode {
    pub const IDLE: CommandCode = CommandCode {
        action: None,
        selector: CommandSelector::Idle,
    };

    pub const fn config_segment(action: ActionIndex) -> Self {
        CommandCode {
            action: Some(action),
            selector: CommandSelector::ConfigSegment,
        }
    }

    pub const fn bits(self) -> u32 {
        let action = match self.action {
            Some(action) => action as u32,
            None => 0,
        };
        (action << 16) | self.selector as u32
    }
}

impl From<CommandCode> for u32 {
    fn from(value: CommandCode) -> Self {
        value.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_word_bits() {
        let word = ControlWord::default()
            .with_command(true)
            .with_start_of_sequence(true)
            .with_marker_enable(true);
        assert_eq!(word.bits(), 0x9100_0000);
        assert!(word.is_command());
        assert!(word.is_start_of_sequence());
        assert!(!word.is_end_of_sequence());

        let word = word.with_start_of_sequence(false).with_end_of_sequence(true);
        assert_eq!(word.bits(), 0xc100_0000);
        assert_eq!(word.to_string(), "0xc1000000");
    }

    #[test]
    fn test_command_code() {
        assert_eq!(CommandCode::IDLE.bits(), 0);
        assert_eq!(CommandCode::config_segment(1).bits(), (1 << 16) | 1);
        assert_eq!(CommandCode::config_segment(5).bits(), 0x0005_0001);
        assert_eq!(CommandCode::config_segment(u16::MAX).bits(), 0xffff_0001);
    }
}
