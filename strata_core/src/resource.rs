// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque references to resources owned outside the state graph.

/// Identifies a texture a layer samples from.
///
/// The graph never dereferences it; it is compared and hashed only. Texture
/// lifetime is managed by whoever hands out the values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Identifies a backend-side resource, such as one texture tile or one
/// realized sampler object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(pub u64);
