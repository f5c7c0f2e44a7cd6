// Lets `#[derive(Entity)]` output name `rowmap_api::...` inside this crate too.
extern crate self as rowmap_api;

pub mod coerce;
pub mod entity;
pub mod error;
pub mod memory;
pub mod shape;
pub mod source;
pub mod value;

pub use coerce::{Coerce, CoerceOptions, TargetType};
pub use entity::Entity;
pub use error::{CoercionError, ErrorKind, SourceError};
pub use memory::MemoryRows;
pub use rowmap_api_derive::Entity;
pub use shape::{Access, Member, Shape};
pub use source::RowSource;
pub use value::Value;
