// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Sequence programs for the standard pulse trains.
use waveform_planner::{CwPulsePlan, IqPulsePlan, PulseTrainPlan, Waveform};

use crate::action_table::{ActionParameter, ActionTableBuilder};
use crate::device::SequenceProgram;
use crate::segment_tracker::SegmentTracker;
use crate::sequence_table::{
    EntryDescriptor, IdleDescriptor, SegmentDescriptor, SequenceEntry, SequenceTableBuilder,
};
use crate::{Error, Result};

fn assemble(tracker: &SegmentTracker, descriptors: Vec<EntryDescriptor>) -> Result<Vec<SequenceEntry>> {
    let mut builder = SequenceTableBuilder::new().with_segments(tracker);
    for descriptor in descriptors {
        builder.push(descriptor)?;
    }
    builder.finish()
}

/// Pulse, idle and end cap of a single CW pulse.
pub fn cw_pulse_program(plan: CwPulsePlan) -> Result<SequenceProgram> {
    pulse_train_program(plan.into())
}

/// Each pulse followed by its idle time, closed by the end cap.
///
/// For phase coherent trains markers are enabled on the first entry, so the
/// marker on the first pulse flags the start of every phase cycle.
pub fn pulse_train_program(plan: PulseTrainPlan) -> Result<SequenceProgram> {
    if plan.pulses.is_empty() || plan.pulses.len() != plan.idle_samples.len() {
        return Err(Error::new(format!(
            "Pulse train needs one idle count per pulse, got {} pulses and {} idle counts",
            plan.pulses.len(),
            plan.idle_samples.len()
        )));
    }
    let mark_first = plan.coherence.is_some();
    let mut tracker = SegmentTracker::new();
    let mut segments = Vec::with_capacity(plan.pulses.len() + 1);
    let mut descriptors: Vec<EntryDescriptor> = Vec::with_capacity(2 * plan.pulses.len() + 1);
    for (p, (pulse, idle)) in plan.pulses.into_iter().zip(plan.idle_samples).enumerate() {
        let id = tracker.create_segment(format!("pulse_{p}"), pulse.len())?;
        let segment = SegmentDescriptor::new(id);
        descriptors.push(if p == 0 && mark_first {
            segment.with_markers().into()
        } else {
            segment.into()
        });
        descriptors.push(IdleDescriptor::new(idle).into());
        segments.push((id, pulse));
    }
    let end_cap = tracker.create_segment("end_cap", plan.end_cap.len())?;
    descriptors.push(SegmentDescriptor::new(end_cap).into());
    segments.push((end_cap, plan.end_cap));

    Ok(SequenceProgram {
        sequence: assemble(&tracker, descriptors)?,
        segments,
        actions: Vec::new(),
    })
}

/// Shaped pulse train whose carrier frequency changes from pulse to pulse.
///
/// Every period plays the configuration segment, which triggers the
/// frequency change, then the marked pulse and the idle time. The sequence is
/// closed by a plain configuration segment, giving `3 * n + 1` entries.
pub fn frequency_agile_program(plan: IqPulsePlan, frequencies: &[f64]) -> Result<SequenceProgram> {
    let mut actions = ActionTableBuilder::new();
    let mut tracker = SegmentTracker::new();
    let config = tracker.create_segment("config", plan.config_segment.len())?;
    let pulse = tracker.create_segment("pulse", plan.pulse.len())?;

    let mut descriptors: Vec<EntryDescriptor> = Vec::with_capacity(3 * frequencies.len() + 1);
    for (k, &frequency) in frequencies.iter().enumerate() {
        let action = actions.append(ActionParameter::CarrierFrequency, Some(frequency))?;
        let idle = if k + 1 == frequencies.len() {
            plan.end_idle_samples
        } else {
            plan.idle_samples
        };
        descriptors.extend([
            EntryDescriptor::from(SegmentDescriptor::new(config).with_action(action)),
            SegmentDescriptor::new(pulse).with_markers().into(),
            IdleDescriptor::new(idle).into(),
        ]);
    }
    descriptors.push(SegmentDescriptor::new(config).into());

    Ok(SequenceProgram {
        sequence: assemble(&tracker, descriptors)?,
        segments: vec![(config, plan.config_segment), (pulse, plan.pulse)],
        actions: actions.finish()?,
    })
}

/// Plays `config_segment` once per action table entry, each time triggering
/// the next entry.
pub fn action_sweep_program(
    config_segment: Waveform,
    actions: ActionTableBuilder,
) -> Result<SequenceProgram> {
    let actions = actions.finish()?;
    let mut tracker = SegmentTracker::new();
    let config = tracker.create_segment("config", config_segment.len())?;
    let descriptors: Vec<EntryDescriptor> = actions
        .iter()
        .map(|action| SegmentDescriptor::new(config).with_action(action.index).into())
        .collect();

    Ok(SequenceProgram {
        sequence: assemble(&tracker, descriptors)?,
        segments: vec![(config, config_segment)],
        actions,
    })
}
