// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline identity type.

use core::fmt;

use crate::node::NodeId;

/// A handle to a pipeline node owned by a [`Context`](crate::Context).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a pipeline is released and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub(crate) NodeId);

impl PipelineId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.0.generation
    }
}

impl fmt::Debug for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineId({}@gen{})", self.0.idx, self.0.generation)
    }
}
