//! Column → member resolution with a process-wide memo.
//!
//! Resolution is a pure function of (entity type, column name), so the cache
//! never needs invalidation. Misses are cached too: a column that matches
//! nothing is looked up in the shape exactly once.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rowmap_api::{Access, Entity, Shape};

/// Outcome of resolving one column against one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Index into `Shape.members`.
    Member(usize),
    NotFound,
}

/// Resolve `column` against `shape`, first match wins:
///
/// 1. a writable public member, name compared case-insensitively;
/// 2. otherwise a non-public storage member, also case-insensitive and
///    ignoring a leading underscore on the member name.
///
/// A read-only public member never resolves, so a backing field of the same
/// name takes over.
pub fn resolve_member(shape: &Shape, column: &str) -> Resolution {
    let public = shape
        .members
        .iter()
        .position(|m| m.access == Access::Public && m.writable && m.matches(column));
    let found = public.or_else(|| {
        shape
            .members
            .iter()
            .position(|m| m.access == Access::NonPublic && m.writable && m.matches(column))
    });
    found.map_or(Resolution::NotFound, Resolution::Member)
}

/// Lower-case fold matching `rowmap_api::shape::names_equal`.
fn fold(column: &str) -> String {
    if column.is_ascii() {
        column.to_ascii_lowercase()
    } else {
        column.chars().flat_map(char::to_lowercase).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    /// Times a shape's member list was scanned.
    pub inspections: u64,
    pub hits: u64,
}

/// Concurrent memo of `resolve_member`, keyed by entity type and folded
/// column name.
///
/// Hits take a shard read lock; misses go through the shard's entry lock so
/// at most one resolution is computed and stored per key. Unrelated keys in
/// other shards never wait on each other.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<(TypeId, String), Resolution>,
    inspections: AtomicU64,
    hits: AtomicU64,
}

static GLOBAL: LazyLock<Arc<ResolutionCache>> =
    LazyLock::new(|| Arc::new(ResolutionCache::new()));

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by `Mapper::new`.
    pub fn global() -> &'static Arc<ResolutionCache> {
        &GLOBAL
    }

    pub fn resolve<E: Entity>(&self, column: &str) -> Resolution {
        self.resolve_shape(TypeId::of::<E>(), E::shape(), column)
    }

    /// `shape` must be the shape of the type behind `type_id`.
    pub fn resolve_shape(&self, type_id: TypeId, shape: &Shape, column: &str) -> Resolution {
        let key = (type_id, fold(column));
        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *hit;
        }

        // Another thread may have stored the key since the read above. The
        // shard lock is held only inside this match.
        let (resolution, inspected) = match self.entries.entry(key) {
            Entry::Occupied(entry) => (*entry.get(), false),
            Entry::Vacant(entry) => (*entry.insert(resolve_member(shape, column)), true),
        };

        if inspected {
            self.inspections.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(entity = shape.name, column, ?resolution, "resolved column");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        resolution
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            inspections: self.inspections.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}
