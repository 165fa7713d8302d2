// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Action table assembly.
//!
//! The device protocol is define-then-append: every entry is opened first and
//! commands are appended to it afterwards. Entries are numbered from 1 in
//! definition order and can neither be removed nor reordered.
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// 1-based index of an action table entry, as packed into bits 16-31 of a
/// command code.
pub type ActionIndex = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionParameter {
    Amplitude,
    PhaseOffset,
    PhaseReset,
    CarrierFrequency,
    SampleRate,
    Run,
    Restart,
    Hold,
}

impl ActionParameter {
    pub const ALL: [ActionParameter; 8] = [
        ActionParameter::Amplitude,
        ActionParameter::PhaseOffset,
        ActionParameter::PhaseReset,
        ActionParameter::CarrierFrequency,
        ActionParameter::SampleRate,
        ActionParameter::Run,
        ActionParameter::Restart,
        ActionParameter::Hold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionParameter::Amplitude => "amplitude",
            ActionParameter::PhaseOffset => "phase-offset",
            ActionParameter::PhaseReset => "phase-reset",
            ActionParameter::CarrierFrequency => "carrier-frequency",
            ActionParameter::SampleRate => "sample-rate",
            ActionParameter::Run => "run",
            ActionParameter::Restart => "restart",
            ActionParameter::Hold => "hold",
        }
    }

    /// Keyword used by the `action:append` command.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ActionParameter::Amplitude => "amplitude",
            ActionParameter::PhaseOffset => "poffset",
            ActionParameter::PhaseReset => "preset",
            ActionParameter::CarrierFrequency => "cfrequency",
            ActionParameter::SampleRate => "srate",
            ActionParameter::Run => "srun",
            ActionParameter::Restart => "srestart",
            ActionParameter::Hold => "shold",
        }
    }

    /// Whether the command carries a value. Sweep control commands do not.
    pub fn takes_value(&self) -> bool {
        !matches!(
            self,
            ActionParameter::Run | ActionParameter::Restart | ActionParameter::Hold
        )
    }
}

impl fmt::Display for ActionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionParameter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        ActionParameter::ALL
            .into_iter()
            .find(|p| p.as_str() == name || p.mnemonic() == name)
            .ok_or_else(|| Error::UnknownParameter(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCommand {
    pub parameter: ActionParameter,
    pub value: Option<f64>,
}

impl ActionCommand {
    pub fn new(parameter: ActionParameter, value: Option<f64>) -> Result<Self> {
        match (parameter.takes_value(), value) {
            (true, None) => Err(Error::ActionValue {
                parameter,
                reason: "a value is required".to_string(),
            }),
            (false, Some(value)) => Err(Error::ActionValue {
                parameter,
                reason: format!("takes no value, got {value}"),
            }),
            (true, Some(value)) if !value.is_finite() => Err(Error::ActionValue {
                parameter,
                reason: format!("value must be finite, got {value}"),
            }),
            _ => Ok(ActionCommand { parameter, value }),
        }
    }
}

/// One action table entry with the commands appended to it, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEntry {
    pub index: ActionIndex,
    pub commands: Vec<ActionCommand>,
}

#[derive(Debug, Clone, Default)]
pub struct ActionTableBuilder {
    entries: Vec<ActionEntry>,
}

impl ActionTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open a new, empty entry and return its index.
    pub fn define_new(&mut self) -> Result<ActionIndex> {
        let index = ActionIndex::try_from(self.entries.len() + 1).map_err(|_| {
            Error::LengthBounds(format!(
                "Action table is limited to {} entries",
                ActionIndex::MAX
            ))
        })?;
        self.entries.push(ActionEntry {
            index,
            commands: Vec::new(),
        });
        Ok(index)
    }

    /// Append a command to the previously defined entry `index`.
    pub fn append_to(
        &mut self,
        index: ActionIndex,
        parameter: ActionParameter,
        value: Option<f64>,
    ) -> Result<()> {
        let command = ActionCommand::new(parameter, value)?;
        let entry = usize::from(index)
            .checked_sub(1)
            .and_then(|position| self.entries.get_mut(position))
            .ok_or(Error::UnknownAction(index))?;
        entry.commands.push(command);
        Ok(())
    }

    /// Define a new entry holding a single command.
    pub fn append(&mut self, parameter: ActionParameter, value: Option<f64>) -> Result<ActionIndex> {
        // A rejected command must not leave an empty entry behind
        let command = ActionCommand::new(parameter, value)?;
        let index = self.define_new()?;
        self.append_to(index, command.parameter, command.value)?;
        Ok(index)
    }

    pub fn finish(self) -> Result<Vec<ActionEntry>> {
        if let Some(entry) = self.entries.iter().find(|e| e.commands.is_empty()) {
            return Err(Error::new(format!(
                "Action table entry {} has no commands",
                entry.index
            )));
        }
        Ok(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names() {
        for parameter in ActionParameter::ALL {
            assert_eq!(parameter.as_str().parse::<ActionParameter>().unwrap(), parameter);
            assert_eq!(parameter.mnemonic().parse::<ActionParameter>().unwrap(), parameter);
        }
        assert_eq!(
            " CFrequency ".parse::<ActionParameter>().unwrap(),
            ActionParameter::CarrierFrequency
        );
        assert!(matches!(
            "frequency".parse::<ActionParameter>(),
            Err(Error::UnknownParameter(name)) if name == "frequency"
        ));
    }

    #[test]
    fn test_append_indices_are_one_based() {
        let mut builder = ActionTableBuilder::new();
        assert_eq!(builder.append(ActionParameter::Amplitude, Some(0.25)).unwrap(), 1);
        assert_eq!(builder.append(ActionParameter::PhaseOffset, Some(-0.25)).unwrap(), 2);
        assert_eq!(builder.append(ActionParameter::Run, None).unwrap(), 3);
        let entries = builder.finish().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].index, 2);
        assert_eq!(
            entries[1].commands,
            vec![ActionCommand {
                parameter: ActionParameter::PhaseOffset,
                value: Some(-0.25)
            }]
        );
    }

    #[test]
    fn test_multi_command_entry() {
        let mut builder = ActionTableBuilder::new();
        let index = builder.define_new().unwrap();
        builder
            .append_to(index, ActionParameter::CarrierFrequency, Some(1e9))
            .unwrap();
        builder
            .append_to(index, ActionParameter::PhaseReset, Some(0.0))
            .unwrap();
        let entries = builder.finish().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].commands.len(), 2);
    }

    #[test]
    fn test_append_to_undefined_entry() {
        let mut builder = ActionTableBuilder::new();
        builder.define_new().unwrap();
        assert!(matches!(
            builder.append_to(2, ActionParameter::Hold, None),
            Err(Error::UnknownAction(2))
        ));
        assert!(matches!(
            builder.append_to(0, ActionParameter::Hold, None),
            Err(Error::UnknownAction(0))
        ));
    }

    #[test]
    fn test_action_values() {
        let mut builder = ActionTableBuilder::new();
        assert!(matches!(
            builder.append(ActionParameter::Amplitude, None),
            Err(Error::ActionValue { .. })
        ));
        assert!(matches!(
            builder.append(ActionParameter::Restart, Some(1.0)),
            Err(Error::ActionValue { .. })
        ));
        assert!(matches!(
            builder.append(ActionParameter::SampleRate, Some(f64::NAN)),
            Err(Error::ActionValue { .. })
        ));
        // Rejected commands do not consume an index
        assert!(builder.is_empty());
        assert_eq!(builder.append(ActionParameter::SampleRate, Some(2e6)).unwrap(), 1);
    }

    #[test]
    fn test_empty_entry_rejected() {
        let mut builder = ActionTableBuilder::new();
        builder.define_new().unwrap();
        assert!(builder.finish().is_err());
    }
}
