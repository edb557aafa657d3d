// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interned sampler configurations.
//!
//! Layers never own their filter and wrap settings directly. They point at an
//! immutable entry in a per-context [`SamplerCache`], so identical
//! configurations share one entry and comparing two layers' samplers is a
//! single id comparison.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::resource::ResourceKey;

/// Texture filtering mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Bilinear.
    Linear,
    /// Nearest texel from the nearest mipmap level.
    NearestMipmapNearest,
    /// Bilinear within the nearest mipmap level.
    LinearMipmapNearest,
    /// Nearest texel, blended between two mipmap levels.
    NearestMipmapLinear,
    /// Trilinear.
    LinearMipmapLinear,
}

impl FilterMode {
    /// Returns `true` if this mode reads from mipmap levels.
    #[must_use]
    pub const fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Texture coordinate wrap mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Tile the texture.
    Repeat,
    /// Tile the texture, mirroring every other repetition.
    MirroredRepeat,
    /// Clamp coordinates to the edge texels.
    ClampToEdge,
    /// Let the renderer pick per primitive; realized as `ClampToEdge`.
    Automatic,
}

impl WrapMode {
    /// The mode actually programmed into a sampler object.
    #[must_use]
    pub const fn realized(self) -> Self {
        match self {
            Self::Automatic => Self::ClampToEdge,
            other => other,
        }
    }
}

/// Handle of an interned sampler entry. Equal ids mean equal settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SamplerId(u32);

/// An immutable, interned sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SamplerEntry {
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Wrap mode along s.
    pub wrap_s: WrapMode,
    /// Wrap mode along t.
    pub wrap_t: WrapMode,
    /// Wrap mode along p.
    pub wrap_p: WrapMode,
    /// Backend sampler object realizing this entry. Shared between entries
    /// whose realized settings coincide.
    pub resource: ResourceKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct SamplerKey {
    min_filter: FilterMode,
    mag_filter: FilterMode,
    wrap: [WrapMode; 3],
}

impl SamplerKey {
    const DEFAULT: Self = Self {
        min_filter: FilterMode::Nearest,
        mag_filter: FilterMode::Nearest,
        wrap: [WrapMode::Automatic; 3],
    };

    fn of(entry: &SamplerEntry) -> Self {
        Self {
            min_filter: entry.min_filter,
            mag_filter: entry.mag_filter,
            wrap: [entry.wrap_s, entry.wrap_t, entry.wrap_p],
        }
    }

    fn realized(self) -> Self {
        Self {
            wrap: self.wrap.map(WrapMode::realized),
            ..self
        }
    }
}

/// Per-context intern table of sampler configurations.
#[derive(Debug)]
pub(crate) struct SamplerCache {
    entries: Vec<SamplerEntry>,
    by_key: HashMap<SamplerKey, SamplerId>,
    by_realized: HashMap<SamplerKey, ResourceKey>,
}

impl SamplerCache {
    /// Creates a cache holding only the default entry.
    pub(crate) fn new() -> Self {
        let mut cache = Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            by_realized: HashMap::new(),
        };
        cache.intern(SamplerKey::DEFAULT);
        cache
    }

    /// The entry for nearest filtering with automatic wrap modes.
    pub(crate) fn default_entry(&self) -> SamplerId {
        SamplerId(0)
    }

    pub(crate) fn get(&self, id: SamplerId) -> &SamplerEntry {
        &self.entries[id.0 as usize]
    }

    /// Number of distinct entries.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entry equal to `old` with the given wrap modes.
    pub(crate) fn update_wrap_modes(
        &mut self,
        old: SamplerId,
        wrap_s: WrapMode,
        wrap_t: WrapMode,
        wrap_p: WrapMode,
    ) -> SamplerId {
        let key = SamplerKey {
            wrap: [wrap_s, wrap_t, wrap_p],
            ..SamplerKey::of(self.get(old))
        };
        self.intern(key)
    }

    /// Returns the entry equal to `old` with the given filters.
    pub(crate) fn update_filters(
        &mut self,
        old: SamplerId,
        min_filter: FilterMode,
        mag_filter: FilterMode,
    ) -> SamplerId {
        let key = SamplerKey {
            min_filter,
            mag_filter,
            ..SamplerKey::of(self.get(old))
        };
        self.intern(key)
    }

    fn intern(&mut self, key: SamplerKey) -> SamplerId {
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let next_resource = ResourceKey(u64::try_from(self.by_realized.len()).unwrap_or(u64::MAX));
        let resource = *self
            .by_realized
            .entry(key.realized())
            .or_insert(next_resource);
        let id = SamplerId(u32::try_from(self.entries.len()).unwrap_or(u32::MAX));
        self.entries.push(SamplerEntry {
            min_filter: key.min_filter,
            mag_filter: key.mag_filter,
            wrap_s: key.wrap[0],
            wrap_t: key.wrap[1],
            wrap_p: key.wrap[2],
            resource,
        });
        self.by_key.insert(key, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entry_is_nearest_automatic() {
        let cache = SamplerCache::new();
        let entry = cache.get(cache.default_entry());
        assert_eq!(entry.min_filter, FilterMode::Nearest);
        assert_eq!(entry.mag_filter, FilterMode::Nearest);
        assert_eq!(entry.wrap_s, WrapMode::Automatic);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn identical_settings_share_an_entry() {
        let mut cache = SamplerCache::new();
        let base = cache.default_entry();
        let a = cache.update_filters(base, FilterMode::Linear, FilterMode::Linear);
        let b = cache.update_filters(base, FilterMode::Linear, FilterMode::Linear);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn update_keeps_untouched_fields_and_old_entry() {
        let mut cache = SamplerCache::new();
        let linear = cache.update_filters(
            cache.default_entry(),
            FilterMode::Linear,
            FilterMode::Linear,
        );
        let repeat =
            cache.update_wrap_modes(linear, WrapMode::Repeat, WrapMode::Repeat, WrapMode::Repeat);
        let entry = cache.get(repeat);
        assert_eq!(entry.min_filter, FilterMode::Linear);
        assert_eq!(entry.wrap_t, WrapMode::Repeat);
        // The source entry is untouched.
        assert_eq!(cache.get(linear).wrap_t, WrapMode::Automatic);
    }

    #[test]
    fn back_to_default_settings_returns_default() {
        let mut cache = SamplerCache::new();
        let base = cache.default_entry();
        let linear = cache.update_filters(base, FilterMode::Linear, FilterMode::Nearest);
        let back = cache.update_filters(linear, FilterMode::Nearest, FilterMode::Nearest);
        assert_eq!(back, base);
    }

    #[test]
    fn automatic_and_clamp_share_realized_resource() {
        let mut cache = SamplerCache::new();
        let base = cache.default_entry();
        let clamp = cache.update_wrap_modes(
            base,
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
        );
        assert_ne!(clamp, base, "distinct entries");
        assert_eq!(cache.get(clamp).resource, cache.get(base).resource);

        let repeat =
            cache.update_wrap_modes(base, WrapMode::Repeat, WrapMode::Repeat, WrapMode::Repeat);
        assert_ne!(cache.get(repeat).resource, cache.get(base).resource);
    }

    #[test]
    fn realized_resources_are_numbered_in_order() {
        let mut cache = SamplerCache::new();
        let base = cache.default_entry();
        let linear = cache.update_filters(base, FilterMode::Linear, FilterMode::Linear);
        let clamp = cache.update_wrap_modes(
            linear,
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
        );
        assert_eq!(cache.get(base).resource, ResourceKey(0));
        assert_eq!(cache.get(linear).resource, ResourceKey(1));
        assert_eq!(cache.get(clamp).resource, ResourceKey(1));
    }

    #[test]
    fn mipmap_filters() {
        assert!(FilterMode::LinearMipmapLinear.uses_mipmaps());
        assert!(!FilterMode::Linear.uses_mipmaps());
    }
}
