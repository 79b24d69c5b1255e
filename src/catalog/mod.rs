//! Static reference data: materials, worker roles and service compositions.
//!
//! Catalogs are seeded once and then only their runtime quantities change.
//! Unit costs cached on compositions are written exclusively by
//! [`crate::estimation::recalculate_all`].

mod composition;
mod material;
mod role;

pub use composition::{BomLine, Composition, CompositionCatalog, LaborHours, default_compositions};
pub use material::{Material, MaterialCatalog, UnitKind, default_materials};
pub use role::Role;
