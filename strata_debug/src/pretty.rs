// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Handles are
//! printed as `index@generation`.

use std::io::Write;

use strata_core::trace::{
    AncestryPrunedEvent, LayerForkEvent, PipelineCopyOnWriteEvent, PrunedNode,
    RegionDownloadedEvent, RegionUploadedEvent, TilesPlannedEvent, TraceSink,
    WeakPipelineDestroyedEvent,
};
use strata_core::{LayerId, PipelineId};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

struct P(PipelineId);

impl std::fmt::Display for P {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}@{}", self.0.index(), self.0.generation())
    }
}

struct L(LayerId);

impl std::fmt::Display for L {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "l{}@{}", self.0.index(), self.0.generation())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pipeline_copy_on_write(&mut self, e: &PipelineCopyOnWriteEvent) {
        let _ = writeln!(
            self.writer,
            "[cow] pipeline={} new_authority={} reparented={}",
            P(e.pipeline),
            P(e.new_authority),
            e.reparented_children,
        );
    }

    fn on_layer_fork(&mut self, e: &LayerForkEvent) {
        let _ = writeln!(
            self.writer,
            "[fork] pipeline={} layer={} -> {}",
            P(e.pipeline),
            L(e.original),
            L(e.fork),
        );
    }

    fn on_ancestry_pruned(&mut self, e: &AncestryPrunedEvent) {
        let _ = match e.node {
            PrunedNode::Pipeline(p) => {
                writeln!(self.writer, "[prune] pipeline={} skipped={}", P(p), e.skipped)
            }
            PrunedNode::Layer(l) => {
                writeln!(self.writer, "[prune] layer={} skipped={}", L(l), e.skipped)
            }
        };
    }

    fn on_weak_pipeline_destroyed(&mut self, e: &WeakPipelineDestroyedEvent) {
        let _ = writeln!(self.writer, "[weak:destroyed] pipeline={}", P(e.pipeline));
    }

    fn on_tiles_planned(&mut self, e: &TilesPlannedEvent) {
        let strategy = if e.power_of_two { "pot" } else { "rect" };
        let _ = writeln!(
            self.writer,
            "[tiles] {}x{} grid={}x{} {strategy} waste={}x{}",
            e.width,
            e.height,
            e.columns,
            e.rows,
            e.waste_x,
            e.waste_y,
        );
    }

    fn on_region_uploaded(&mut self, e: &RegionUploadedEvent) {
        let _ = writeln!(
            self.writer,
            "[upload] {}x{} tiles={} waste_strips={}",
            e.width, e.height, e.tiles_touched, e.waste_strips,
        );
    }

    fn on_region_downloaded(&mut self, e: &RegionDownloadedEvent) {
        let _ = writeln!(
            self.writer,
            "[download] tiles={} staged={}",
            e.tiles_read, e.staged_tiles,
        );
    }
}
