// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! SCPI rendition of a sequence program.
//!
//! [`ScpiScript`] records the commands a socket transport would send for each
//! [`AwgDevice`] call, without performing any I/O.
use std::convert::Infallible;
use std::fmt;

use waveform_planner::Waveform;

use crate::action_table::ActionEntry;
use crate::device::AwgDevice;
use crate::segment_tracker::SegmentId;
use crate::sequence_table::SequenceEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScpiCommand {
    Write(String),
    Query(String),
    /// Command header followed by a binary payload, sent as an IEEE 488.2
    /// definite length block.
    BinaryBlock { header: String, data: Vec<u8> },
}

impl ScpiCommand {
    /// The command as sent on the wire, newline terminated.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = match self {
            ScpiCommand::Write(text) | ScpiCommand::Query(text) => text.as_bytes().to_vec(),
            ScpiCommand::BinaryBlock { header, data } => {
                let mut bytes = header.as_bytes().to_vec();
                bytes.extend(definite_length_block(data));
                bytes
            }
        };
        bytes.push(b'\n');
        bytes
    }
}

impl fmt::Display for ScpiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScpiCommand::Write(text) | ScpiCommand::Query(text) => f.write_str(text),
            ScpiCommand::BinaryBlock { header, data } => {
                let length = data.len().to_string();
                write!(f, "{header}#{}{length}<{length} bytes>", length.len())
            }
        }
    }
}

/// `#<digits><length><data>`
pub fn definite_length_block(data: &[u8]) -> Vec<u8> {
    let length = data.len().to_string();
    let mut block = format!("#{}{length}", length.len()).into_bytes();
    block.extend_from_slice(data);
    block
}

fn register(value: u32) -> String {
    if value == u32::MAX {
        "#hffffffff".to_string()
    } else {
        value.to_string()
    }
}

/// Recording [`AwgDevice`].
#[derive(Debug, Clone, Default)]
pub struct ScpiScript {
    commands: Vec<ScpiCommand>,
}

impl ScpiScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[ScpiCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<ScpiCommand> {
        self.commands
    }

    fn write(&mut self, command: String) {
        self.commands.push(ScpiCommand::Write(command));
    }

    fn query(&mut self, command: String) {
        self.commands.push(ScpiCommand::Query(command));
    }
}

impl fmt::Display for ScpiScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{command}")?;
        }
        Ok(())
    }
}

impl AwgDevice for ScpiScript {
    type Error = Infallible;

    fn download_segment(
        &mut self,
        channel: u8,
        segment_id: SegmentId,
        waveform: &Waveform,
    ) -> Result<(), Self::Error> {
        // Interleaved waveforms are defined in I/Q pairs
        self.write(format!("trace{channel}:def {segment_id}, {}", waveform.len()));
        let data = waveform
            .words()
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect();
        self.commands.push(ScpiCommand::BinaryBlock {
            header: format!("trace{channel}:data {segment_id}, 0, "),
            data,
        });
        Ok(())
    }

    fn load_sequence_table(
        &mut self,
        channel: u8,
        entries: &[SequenceEntry],
    ) -> Result<(), Self::Error> {
        self.query(format!("seq{channel}:def:new? {}", entries.len()));
        for (index, entry) in entries.iter().enumerate() {
            let registers = entry
                .registers()
                .map(register)
                .join(", ");
            self.write(format!("stable{channel}:data {index}, {registers}"));
        }
        Ok(())
    }

    fn load_action_table(&mut self, channel: u8, actions: &[ActionEntry]) -> Result<(), Self::Error> {
        self.write(format!("action{channel}:delete:all"));
        for entry in actions {
            self.query(format!("action{channel}:define:new?"));
            for command in &entry.commands {
                let mnemonic = command.parameter.mnemonic();
                match command.value {
                    Some(value) => self.write(format!(
                        "action{channel}:append {}, {mnemonic}, {value}",
                        entry.index
                    )),
                    None => self.write(format!("action{channel}:append {}, {mnemonic}", entry.index)),
                }
            }
        }
        Ok(())
    }

    fn select_and_arm(&mut self, channel: u8, sequence_index: u32) -> Result<(), Self::Error> {
        self.write(format!("func{channel}:mode stsequence"));
        self.write(format!("stable{channel}:seq:sel {sequence_index}"));
        Ok(())
    }

    fn start_playback(&mut self, channel: u8, continuous: bool) -> Result<(), Self::Error> {
        let mode = if continuous { "on" } else { "off" };
        self.write(format!("init{channel}:cont {mode}"));
        self.write(format!("init{channel}:imm"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_table::{ActionParameter, ActionTableBuilder};
    use crate::sequence_table::{IdleDescriptor, SegmentDescriptor, build};
    use waveform_planner::{ResolutionMode, quantize};

    #[test]
    fn test_definite_length_block() {
        assert_eq!(definite_length_block(&[1, 2, 3]), b"#13\x01\x02\x03".to_vec());
        let block = definite_length_block(&[0; 480]);
        assert_eq!(&block[..5], b"#3480");
        assert_eq!(block.len(), 485);
    }

    #[test]
    fn test_segment_download() {
        let mut script = ScpiScript::new();
        let waveform = quantize(&[0.5; 240], ResolutionMode::Precision).unwrap();
        script.download_segment(1, 2, &waveform).unwrap();
        let commands = script.commands();
        assert_eq!(commands[0], ScpiCommand::Write("trace1:def 2, 240".to_string()));
        let ScpiCommand::BinaryBlock { header, data } = &commands[1] else {
            panic!("expected a binary block");
        };
        assert_eq!(header, "trace1:data 2, 0, ");
        assert_eq!(data.len(), 480);
        // (8191 * 0.5) as i16 == 4095, shifted by 2
        assert_eq!(&data[..2], &(4095i16 << 2).to_le_bytes());
        assert_eq!(commands[1].to_string(), "trace1:data 2, 0, #3480<480 bytes>");
        assert_eq!(commands[1].to_bytes().len(), 18 + 5 + 480 + 1);
    }

    #[test]
    fn test_sequence_rows() {
        let entries = build([
            SegmentDescriptor::new(1).into(),
            IdleDescriptor::new(1000).into(),
            SegmentDescriptor::new(2).into(),
        ])
        .unwrap();
        let mut script = ScpiScript::new();
        script.load_sequence_table(1, &entries).unwrap();
        assert_eq!(
            script.to_string(),
            "seq1:def:new? 3\n\
             stable1:data 0, 268435456, 1, 1, 1, 0, #hffffffff\n\
             stable1:data 1, 2147483648, 0, 0, 0, 1000, 0\n\
             stable1:data 2, 1073741824, 0, 1, 2, 0, #hffffffff\n"
        );
    }

    #[test]
    fn test_action_table_commands() {
        let mut builder = ActionTableBuilder::new();
        builder.append(ActionParameter::PhaseOffset, Some(-0.25)).unwrap();
        builder.append(ActionParameter::CarrierFrequency, Some(100e6)).unwrap();
        builder.append(ActionParameter::Restart, None).unwrap();
        let actions = builder.finish().unwrap();

        let mut script = ScpiScript::new();
        script.load_action_table(1, &actions).unwrap();
        let commands: Vec<String> = script.commands().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            commands,
            vec![
                "action1:delete:all",
                "action1:define:new?",
                "action1:append 1, poffset, -0.25",
                "action1:define:new?",
                "action1:append 2, cfrequency, 100000000",
                "action1:define:new?",
                "action1:append 3, srestart",
            ]
        );
        assert!(matches!(script.commands()[1], ScpiCommand::Query(_)));
    }

    #[test]
    fn test_playback_commands() {
        let mut script = ScpiScript::new();
        script.select_and_arm(2, 0).unwrap();
        script.start_playback(2, true).unwrap();
        assert_eq!(
            script.to_string(),
            "func2:mode stsequence\nstable2:seq:sel 0\ninit2:cont on\ninit2:imm\n"
        );
    }
}
