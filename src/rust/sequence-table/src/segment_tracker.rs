// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::{Error, Result};

/// Device-side segment identifier. The sequencer numbers segments from 1.
pub type SegmentId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub id: SegmentId,
    /// Length in samples, or I/Q pairs for interleaved waveforms.
    pub length: usize,
}

/// Allocates segment ids in download order and remembers segment lengths.
pub struct SegmentTracker {
    segments: IndexMap<String, SegmentInfo>,
    next_segment_id: SegmentId,
}

impl Default for SegmentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentTracker {
    pub fn new() -> Self {
        Self {
            segments: IndexMap::new(),
            next_segment_id: 1,
        }
    }

    pub fn create_segment<S: Into<String>>(&mut self, name: S, length: usize) -> Result<SegmentId> {
        let name: String = name.into();
        if self.segments.contains_key(&name) {
            return Err(Error::new(format!("Segment '{name}' already exists")));
        }
        let id = self.next_segment_id;
        self.next_segment_id += 1;
        self.segments.insert(name, SegmentInfo { id, length });
        Ok(id)
    }

    pub fn lookup_segment_id(&self, name: &str) -> Option<SegmentId> {
        self.segments.get(name).map(|info| info.id)
    }

    pub fn segment_length(&self, id: SegmentId) -> Option<usize> {
        // Ids are allocated consecutively from 1 in insertion order
        let position = usize::try_from(id).ok()?.checked_sub(1)?;
        self.segments.get_index(position).map(|(_, info)| info.length)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn finish(self) -> IndexMap<String, SegmentInfo> {
        self.segments
    }
}
