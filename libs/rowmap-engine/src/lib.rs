pub mod config;
pub mod error;
pub mod extract;
pub mod mapper;
pub mod materialize;
pub mod resolve;
mod scalar;
pub mod split;

use rowmap_api::{Entity, RowSource};

pub use config::MapperConfig;
pub use error::MapError;
pub use mapper::Mapper;
pub use resolve::{CacheStats, Resolution, ResolutionCache};

// ═══════════════════════════════════════════════════════════════
//  Default-config entry points
// ═══════════════════════════════════════════════════════════════

/// `Mapper::fill` on the default mapper.
pub fn fill<E, S>(source: &mut S) -> Result<Option<Vec<E>>, MapError>
where
    E: Entity,
    S: RowSource + ?Sized,
{
    Mapper::global().fill(source)
}

/// `Mapper::fill_single` on the default mapper.
pub fn fill_single<E, S>(source: &mut S) -> Result<Option<E>, MapError>
where
    E: Entity,
    S: RowSource + ?Sized,
{
    Mapper::global().fill_single(source)
}

/// `Mapper::fill_split` on the default mapper.
pub fn fill_split<P, D, S, F>(source: &mut S, split_on: &str, combine: F) -> Result<Vec<P>, MapError>
where
    P: Entity,
    D: Entity,
    S: RowSource + ?Sized,
    F: FnMut(P, D) -> P,
{
    Mapper::global().fill_split(source, split_on, combine)
}

/// `Mapper::fill_scalars` on the default mapper.
pub fn fill_scalars<S: RowSource + ?Sized>(source: &mut S) -> Result<Vec<String>, MapError> {
    Mapper::global().fill_scalars(source)
}
