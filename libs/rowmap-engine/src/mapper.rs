use std::sync::{Arc, LazyLock};

use rowmap_api::{Entity, RowSource};

use crate::config::MapperConfig;
use crate::error::MapError;
use crate::extract::extract_row;
use crate::materialize::materialize;
use crate::resolve::ResolutionCache;
use crate::scalar::collect_scalars;
use crate::split::split_rows;

/// Closes the row source when dropped, so every exit path closes it once.
struct CloseGuard<'s, S: RowSource + ?Sized> {
    source: &'s mut S,
}

impl<S: RowSource + ?Sized> Drop for CloseGuard<'_, S> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Entry point for materializing row sources.
///
/// Every operation reads the source synchronously to the end (or to the
/// first row for `fill_single`) and closes it before returning, on error
/// paths too. A source with zero columns fails with
/// `MapError::EmptyResultShape` before any row is read.
#[derive(Debug, Clone)]
pub struct Mapper {
    config: MapperConfig,
    cache: Arc<ResolutionCache>,
}

static DEFAULT: LazyLock<Mapper> = LazyLock::new(Mapper::default);

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl Mapper {
    /// Mapper over the process-wide resolution cache.
    pub fn new(config: MapperConfig) -> Self {
        Self::with_cache(config, Arc::clone(ResolutionCache::global()))
    }

    pub fn with_cache(config: MapperConfig, cache: Arc<ResolutionCache>) -> Self {
        Self { config, cache }
    }

    /// Default-config mapper behind the crate-level `fill*` functions.
    pub fn global() -> &'static Mapper {
        &DEFAULT
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    fn open<'s, S: RowSource + ?Sized>(&self, source: &'s mut S) -> Result<CloseGuard<'s, S>, MapError> {
        let guard = CloseGuard { source };
        if guard.source.field_count() == 0 {
            return Err(MapError::EmptyResultShape);
        }
        Ok(guard)
    }

    /// One entity per row, in row order. `None` when the source had no rows.
    pub fn fill<E, S>(&self, source: &mut S) -> Result<Option<Vec<E>>, MapError>
    where
        E: Entity,
        S: RowSource + ?Sized,
    {
        let mut guard = self.open(source)?;
        let field_count = guard.source.field_count();

        let mut entities = Vec::new();
        while guard.source.next_row()? {
            let row = extract_row(&*guard.source, 0..field_count)?;
            entities.push(materialize::<E>(&row, &self.cache, &self.config.coercion)?);
        }

        tracing::debug!(entity = E::shape().name, rows = entities.len(), "fill finished");
        Ok((!entities.is_empty()).then_some(entities))
    }

    /// Entity built from the first row only. `None` when the source had no
    /// rows; remaining rows are left unread.
    pub fn fill_single<E, S>(&self, source: &mut S) -> Result<Option<E>, MapError>
    where
        E: Entity,
        S: RowSource + ?Sized,
    {
        let mut guard = self.open(source)?;
        if !guard.source.next_row()? {
            return Ok(None);
        }

        let row = extract_row(&*guard.source, 0..guard.source.field_count())?;
        let entity = materialize::<E>(&row, &self.cache, &self.config.coercion)?;
        Ok(Some(entity))
    }

    /// Map each row into a primary `P` (columns before `split_on`) and a
    /// detail `D` (columns from `split_on` on), and collect
    /// `combine(primary, detail)` per row.
    ///
    /// `split_on` at column 0 or missing means no split: the whole row goes
    /// to `P` and `D` is default-constructed. An empty source yields an
    /// empty `Vec`.
    pub fn fill_split<P, D, S, F>(
        &self,
        source: &mut S,
        split_on: &str,
        combine: F,
    ) -> Result<Vec<P>, MapError>
    where
        P: Entity,
        D: Entity,
        S: RowSource + ?Sized,
        F: FnMut(P, D) -> P,
    {
        let mut guard = self.open(source)?;
        let results = split_rows::<P, D, S, F>(
            &mut *guard.source,
            split_on,
            self.config.split_on_ignore_case,
            &self.cache,
            &self.config.coercion,
            combine,
        )?;

        tracing::debug!(
            entity = P::shape().name,
            detail = D::shape().name,
            split_on,
            rows = results.len(),
            "split fill finished"
        );
        Ok(results)
    }

    /// Column 0 of every row as text.
    pub fn fill_scalars<S: RowSource + ?Sized>(&self, source: &mut S) -> Result<Vec<String>, MapError> {
        let mut guard = self.open(source)?;
        let values = collect_scalars(&mut *guard.source)?;
        tracing::debug!(rows = values.len(), "scalar fill finished");
        Ok(values)
    }
}
