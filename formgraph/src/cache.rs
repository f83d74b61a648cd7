//! Lazily rebuilt geometry
use crate::tessellate::Geometry;

/// Holds the last-built [`Geometry`] and whether it is still current
///
/// ```
/// # use formgraph::{cache::GeometryCache, tessellate::Geometry};
/// let mut cache = GeometryCache::new();
/// assert!(!cache.is_valid());
/// cache.get_or_rebuild(Geometry::new);
/// cache.get_or_rebuild(|| unreachable!());
/// assert_eq!(cache.rebuilds(), 1);
///
/// cache.invalidate();
/// cache.get_or_rebuild(Geometry::new);
/// assert_eq!(cache.rebuilds(), 2);
/// ```
#[derive(Debug, Default)]
pub struct GeometryCache {
    geometry: Geometry,
    valid: bool,
    rebuilds: usize,
}

impl GeometryCache {
    /// Builds an empty, invalid cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the cached geometry as stale
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Checks whether the cached geometry is current
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the number of times the geometry has been rebuilt
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Returns the cached geometry, which may be stale
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Returns the cached geometry, calling `f` to rebuild it first if the
    /// cache is invalid
    pub fn get_or_rebuild<F: FnOnce() -> Geometry>(&mut self, f: F) -> &Geometry {
        if !self.valid {
            self.geometry = f();
            self.valid = true;
            self.rebuilds += 1;
        }
        &self.geometry
    }

    /// Replaces the geometry with nothing, leaving the cache valid
    pub(crate) fn clear(&mut self) {
        self.geometry = Geometry::new();
        self.valid = true;
    }
}
