//! kidshelf - Ordered catalog and query engine for children's media
//!
//! Stories, videos and games are curated by administrators into a stable
//! manual order and served to children through filtered, paginated lists.
//!
//! # Architecture
//!
//! - Manually ordered scopes (content per type, categories) keep a dense
//!   `order_index` of `0..N-1` across every create, delete, type change and
//!   reorder
//! - Naturally ordered kinds (age groups, settings) sort on their own fields
//! - Every mutation runs in one SQLite transaction
//! - Public reads see active content only, with capped category lists
//!
//! # Modules
//!
//! - `catalog`: Entities, scopes, filters and projections
//! - `store`: SQLite persistence, queries and the mutation gateway
//! - `api`: HTTP routes (public and admin)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! kidshelf init
//! kidshelf serve --address 127.0.0.1:8080
//! kidshelf list content --type video --age 3-6
//! kidshelf reorder categories 3 1 2
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod store;

pub use catalog::{
    AgeGroup, AgeRange, CatalogError, CatalogResult, Category, Content, ContentType, EntityKind,
    ListFilter, Page, Pagination, Projection, Scope, Setting,
};
pub use store::{Catalog, CatalogStore, OrderSlot, StoreOptions};
