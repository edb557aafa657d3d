// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for graph mutations and texture transfers.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! instrumentation calls whenever the pipeline graph restructures itself or a
//! texture moves pixels. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::layer::LayerId;
use crate::pipeline::PipelineId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a pipeline with dependants is about to change and its current
/// state is moved into a fresh intermediate node.
#[derive(Clone, Copy, Debug)]
pub struct PipelineCopyOnWriteEvent {
    /// The pipeline being modified.
    pub pipeline: PipelineId,
    /// The node now holding the pre-change state.
    pub new_authority: PipelineId,
    /// How many children were moved under `new_authority`.
    pub reparented_children: u32,
}

/// Emitted when a layer shared with other owners is copied so that one
/// pipeline can change it privately.
#[derive(Clone, Copy, Debug)]
pub struct LayerForkEvent {
    /// The pipeline that will own the copy.
    pub pipeline: PipelineId,
    /// The layer that was shared.
    pub original: LayerId,
    /// The private copy.
    pub fork: LayerId,
}

/// Which kind of node an [`AncestryPrunedEvent`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrunedNode {
    /// A pipeline node.
    Pipeline(PipelineId),
    /// A layer node.
    Layer(LayerId),
}

/// Emitted when a node is reparented past ancestors it no longer inherits
/// anything from.
#[derive(Clone, Copy, Debug)]
pub struct AncestryPrunedEvent {
    /// The node that moved.
    pub node: PrunedNode,
    /// How many ancestors were skipped.
    pub skipped: u32,
}

/// Emitted when a weak pipeline is destroyed because its parent changed or
/// went away.
#[derive(Clone, Copy, Debug)]
pub struct WeakPipelineDestroyedEvent {
    /// Handle of the destroyed pipeline (now stale).
    pub pipeline: PipelineId,
}

/// Emitted after a texture's tile layout has been decided.
#[derive(Clone, Copy, Debug)]
pub struct TilesPlannedEvent {
    /// Logical texture width.
    pub width: u32,
    /// Logical texture height.
    pub height: u32,
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Whether tiles are power-of-two sized with padding.
    pub power_of_two: bool,
    /// Waste carried by the last column.
    pub waste_x: u32,
    /// Waste carried by the last row.
    pub waste_y: u32,
}

/// Emitted after a region of pixels was written into a texture.
#[derive(Clone, Copy, Debug)]
pub struct RegionUploadedEvent {
    /// Width of the written region.
    pub width: u32,
    /// Height of the written region.
    pub height: u32,
    /// Number of tiles the region intersected.
    pub tiles_touched: u32,
    /// Number of waste strips refreshed by edge replication.
    pub waste_strips: u32,
}

/// Emitted after a texture was read back into client memory.
#[derive(Clone, Copy, Debug)]
pub struct RegionDownloadedEvent {
    /// Number of tiles read.
    pub tiles_read: u32,
    /// How many of those needed an intermediate buffer to strip waste.
    pub staged_tiles: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from graph mutations and texture transfers.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pipeline with dependants is copied on write.
    fn on_pipeline_copy_on_write(&mut self, e: &PipelineCopyOnWriteEvent) {
        _ = e;
    }

    /// Called when a shared layer is forked for a pipeline.
    fn on_layer_fork(&mut self, e: &LayerForkEvent) {
        _ = e;
    }

    /// Called when a node's redundant ancestry is pruned.
    fn on_ancestry_pruned(&mut self, e: &AncestryPrunedEvent) {
        _ = e;
    }

    /// Called when a weak pipeline is destroyed.
    fn on_weak_pipeline_destroyed(&mut self, e: &WeakPipelineDestroyedEvent) {
        _ = e;
    }

    /// Called when a tile layout is planned.
    fn on_tiles_planned(&mut self, e: &TilesPlannedEvent) {
        _ = e;
    }

    /// Called after a region upload.
    fn on_region_uploaded(&mut self, e: &RegionUploadedEvent) {
        _ = e;
    }

    /// Called after a texture read-back.
    fn on_region_downloaded(&mut self, e: &RegionDownloadedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! tracer_methods {
    ($($(#[$meta:meta])* $name:ident => $hook:ident($event:ty);)*) => {
        $(
            $(#[$meta])*
            #[inline]
            pub fn $name(&mut self, e: &$event) {
                #[cfg(feature = "trace")]
                if let Some(s) = &mut self.sink {
                    s.$hook(e);
                }
                #[cfg(not(feature = "trace"))]
                {
                    _ = e;
                }
            }
        )*
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    tracer_methods! {
        /// Emits a [`PipelineCopyOnWriteEvent`].
        pipeline_copy_on_write => on_pipeline_copy_on_write(PipelineCopyOnWriteEvent);
        /// Emits a [`LayerForkEvent`].
        layer_fork => on_layer_fork(LayerForkEvent);
        /// Emits an [`AncestryPrunedEvent`].
        ancestry_pruned => on_ancestry_pruned(AncestryPrunedEvent);
        /// Emits a [`WeakPipelineDestroyedEvent`].
        weak_pipeline_destroyed => on_weak_pipeline_destroyed(WeakPipelineDestroyedEvent);
        /// Emits a [`TilesPlannedEvent`].
        tiles_planned => on_tiles_planned(TilesPlannedEvent);
        /// Emits a [`RegionUploadedEvent`].
        region_uploaded => on_region_uploaded(RegionUploadedEvent);
        /// Emits a [`RegionDownloadedEvent`].
        region_downloaded => on_region_downloaded(RegionDownloadedEvent);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
