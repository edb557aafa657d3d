// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-on-write render-state graphs.
//!
//! `strata_core` models GPU render state as two trees of sparse nodes: a
//! *pipeline* tree (color, blending, culling and a list of layers) and a
//! *layer* tree (per-texture-stage state). A node stores only the property
//! groups that differ from its parent, so deriving a variant of a pipeline
//! costs one node no matter how much state it carries. It is `no_std`
//! compatible (with `alloc`) and stores both trees in generation-checked
//! arenas owned by a [`Context`].
//!
//! # Architecture
//!
//! ```text
//!   Context
//!     ├── pipelines: root ─┬─ p ─── q          (strong children)
//!     │                    └─ p ··· w          (weak child)
//!     │                        │
//!     │                        └── owns layers
//!     ├── layers:    root ─┬─ l0 ─── l0'       (fork on write)
//!     │                    └─ l1
//!     └── samplers:  interned filter/wrap entries
//! ```
//!
//! Reading a property walks up to the nearest node storing its group, the
//! *authority*. Writing one never mutates a node another node depends on:
//!
//! - A changing pipeline first moves its current state into a new
//!   intermediate node and reparents its dependants onto it. Weak children
//!   are destroyed instead.
//! - A changing layer that is shared forks a private child, and the owning
//!   pipeline swaps the fork in.
//!
//! **[`pipeline`]**: pipeline handles, lifecycle, setters, layer lists,
//! equality and hashing.
//!
//! **[`layer`]**: layer handles, authority resolution and layer comparison.
//!
//! **[`state`]**: the state-group bitmasks both trees are diffed by.
//!
//! **[`sampler`]**: filter and wrap-mode configuration.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! graph and texture instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod color;
pub mod context;
pub mod layer;
pub mod matrix;
mod node;
pub mod pipeline;
pub mod resource;
pub mod sampler;
pub mod state;
pub mod trace;

pub use color::Color;
pub use context::Context;
pub use layer::LayerId;
pub use matrix::Matrix;
pub use pipeline::PipelineId;
pub use resource::{ResourceKey, TextureHandle};
pub use state::{EvalFlags, LayerState, PipelineState};
