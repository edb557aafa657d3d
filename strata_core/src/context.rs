// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owner of every pipeline and layer node.

use alloc::boxed::Box;
use core::fmt;

use hashbrown::DefaultHashBuilder;

use crate::layer::{LayerData, LayerId};
use crate::node::NodeStore;
use crate::pipeline::{PipelineData, PipelineId};
use crate::sampler::SamplerCache;
use crate::trace::{TraceSink, Tracer};

/// Owns the pipeline and layer graphs and their shared defaults.
///
/// Each context has its own root pipeline and root layer, which are the
/// authorities for every state group nobody has overridden. Contexts are
/// fully independent of each other; handles from one must not be used with
/// another.
pub struct Context {
    pub(crate) pipelines: NodeStore<PipelineData>,
    pub(crate) layers: NodeStore<LayerData>,
    pub(crate) samplers: SamplerCache,
    pub(crate) default_pipeline: PipelineId,
    pub(crate) default_layer: LayerId,
    pub(crate) hasher: DefaultHashBuilder,
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("pipelines", &self.pipelines.live_count())
            .field("layers", &self.layers.live_count())
            .field("samplers", &self.samplers.len())
            .field("default_pipeline", &self.default_pipeline)
            .field("default_layer", &self.default_layer)
            .field("tracing", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with fresh default pipeline and layer roots.
    #[must_use]
    pub fn new() -> Self {
        let samplers = SamplerCache::new();
        let mut layers = NodeStore::new();
        let default_layer = LayerId(layers.insert(LayerData::root(samplers.default_entry())));
        let mut pipelines = NodeStore::new();
        let default_pipeline = PipelineId(pipelines.insert(PipelineData::root()));
        Self {
            pipelines,
            layers,
            samplers,
            default_pipeline,
            default_layer,
            hasher: DefaultHashBuilder::default(),
            sink: None,
        }
    }

    /// Installs a sink that receives trace events. Events are only emitted
    /// when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.sink.take()
    }

    /// The root pipeline every other pipeline ultimately derives from.
    #[must_use]
    pub fn default_pipeline(&self) -> PipelineId {
        self.default_pipeline
    }

    /// The root layer every layer ultimately derives from.
    #[must_use]
    pub fn default_layer(&self) -> LayerId {
        self.default_layer
    }

    /// Number of live pipeline nodes, including the root and any
    /// intermediate nodes created by copy-on-write.
    #[must_use]
    pub fn pipeline_node_count(&self) -> usize {
        self.pipelines.live_count()
    }

    /// Number of live layer nodes, including the root.
    #[must_use]
    pub fn layer_node_count(&self) -> usize {
        self.layers.live_count()
    }

    /// Number of distinct interned sampler configurations.
    #[must_use]
    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// Runs `f` with a tracer bound to the installed sink, if any.
    pub(crate) fn trace(&mut self, f: impl FnOnce(&mut Tracer<'_>)) {
        if let Some(sink) = self.sink.as_deref_mut() {
            f(&mut Tracer::new(sink));
        }
    }
}
