//! Catalog domain: entities, scopes, filters and relation projection.
//!
//! These types carry no storage logic. The `store` module persists them and
//! enforces the ordering invariants.

pub mod entity;
pub mod error;
pub mod filter;
pub mod projector;
pub mod scope;

pub use entity::{
    AgeGroup, AgeGroupPatch, AgeGroupSummary, Category, CategoryPatch, CategorySummary, Content,
    ContentPatch, NewAgeGroup, NewCategory, NewContent, NewSetting, Setting, SettingPatch,
};
pub use error::{CatalogError, CatalogResult};
pub use filter::{AgeRange, ListFilter, Page, PageWindow, Pagination, QueryLimits};
pub use projector::Projection;
pub use scope::{ContentType, EntityKind, OrderingCapability, Scope};
