// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and graph export for strata diagnostics.
//!
//! This crate provides development tools on top of
//! [`strata_core`]'s instrumentation:
//!
//! - [`pretty::PrettyPrintSink`]: a
//!   [`TraceSink`](strata_core::trace::TraceSink) writing one human-readable
//!   line per event.
//! - [`graph::pipeline_graph`]: a JSON snapshot of a pipeline subtree and
//!   the layers its nodes own, for inspecting copy-on-write structure.

pub mod graph;
pub mod pretty;
