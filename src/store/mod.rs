//! SQLite-backed catalog store.
//!
//! - `schema`: table layout, applied on open
//! - `order_index`: dense ordering within manually ordered scopes
//! - `relations`: content ↔ category / age-group links
//! - `query`: filtered, paginated reads
//! - `gateway`: transactional writes
//! - `handle`: async, shareable wrapper for request handlers

pub mod gateway;
pub mod handle;
pub mod order_index;
pub mod query;
pub mod relations;
pub mod schema;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Row, ToSql};

use crate::catalog::{
    AgeGroup, AgeGroupPatch, CatalogError, CatalogResult, Category, CategoryPatch, Content,
    ContentPatch, ContentType, ListFilter, NewAgeGroup, NewCategory, NewContent, NewSetting, Page,
    Pagination, Projection, QueryLimits, Scope, Setting, SettingPatch,
};

pub use gateway::OrderSlot;
pub use handle::Catalog;

impl ToSql for ContentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ContentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: CatalogError| FromSqlError::Other(Box::new(e)))
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(from_millis(row.get(idx)?))
}

/// Store tuning taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub limits: QueryLimits,

    /// Categories kept on public content projections
    pub public_category_cap: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            limits: QueryLimits::default(),
            public_category_cap: crate::catalog::projector::DEFAULT_PUBLIC_CATEGORY_CAP,
        }
    }
}

/// Synchronous catalog store over a single SQLite connection
#[derive(Debug)]
pub struct CatalogStore {
    conn: Connection,
    options: StoreOptions,
}

impl CatalogStore {
    /// Open (or create) a database file and apply the schema
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> CatalogResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        schema::enable_wal(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn, options })
    }

    /// Open a private in-memory database
    pub fn open_in_memory(options: StoreOptions) -> CatalogResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn, options })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Projection for unauthenticated consumers, using the configured cap
    pub fn public_projection(&self) -> Projection {
        Projection::Public {
            category_cap: self.options.public_category_cap,
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn list_contents(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
        projection: Projection,
    ) -> CatalogResult<Page<Content>> {
        let window = pagination.resolve(self.options.limits);
        query::list_contents(&self.conn, filter, window, projection)
    }

    pub fn list_categories(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> CatalogResult<Page<Category>> {
        query::list_categories(&self.conn, filter, pagination.resolve(self.options.limits))
    }

    pub fn list_age_groups(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> CatalogResult<Page<AgeGroup>> {
        query::list_age_groups(&self.conn, filter, pagination.resolve(self.options.limits))
    }

    pub fn list_settings(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> CatalogResult<Page<Setting>> {
        query::list_settings(&self.conn, filter, pagination.resolve(self.options.limits))
    }

    pub fn get_content(&self, id: i64, projection: Projection) -> CatalogResult<Content> {
        query::get_content(&self.conn, id, projection)
    }

    pub fn get_category(&self, id: i64) -> CatalogResult<Category> {
        query::get_category(&self.conn, id)
    }

    pub fn get_age_group(&self, id: i64) -> CatalogResult<AgeGroup> {
        query::get_age_group(&self.conn, id)
    }

    pub fn get_setting(&self, id: i64) -> CatalogResult<Setting> {
        query::get_setting(&self.conn, id)
    }

    /// Ids of a manually ordered scope in display order
    pub fn ordered_ids(&self, scope: Scope) -> CatalogResult<Vec<i64>> {
        order_index::ordered_ids(&self.conn, scope)
    }

    // ------------------------------------------------------------------
    // Writes (admin view returned)
    // ------------------------------------------------------------------

    pub fn create_content(&mut self, input: NewContent) -> CatalogResult<Content> {
        let id = gateway::create_content(&mut self.conn, input)?;
        self.get_content(id, Projection::Admin)
    }

    pub fn update_content(&mut self, id: i64, patch: ContentPatch) -> CatalogResult<Content> {
        gateway::update_content(&mut self.conn, id, patch)?;
        self.get_content(id, Projection::Admin)
    }

    pub fn delete_content(&mut self, id: i64) -> CatalogResult<()> {
        gateway::delete_content(&mut self.conn, id)
    }

    pub fn create_category(&mut self, input: NewCategory) -> CatalogResult<Category> {
        let id = gateway::create_category(&mut self.conn, input)?;
        self.get_category(id)
    }

    pub fn update_category(&mut self, id: i64, patch: CategoryPatch) -> CatalogResult<Category> {
        gateway::update_category(&mut self.conn, id, patch)?;
        self.get_category(id)
    }

    pub fn delete_category(&mut self, id: i64) -> CatalogResult<()> {
        gateway::delete_category(&mut self.conn, id)
    }

    pub fn create_age_group(&mut self, input: NewAgeGroup) -> CatalogResult<AgeGroup> {
        let id = gateway::create_age_group(&mut self.conn, input)?;
        self.get_age_group(id)
    }

    pub fn update_age_group(&mut self, id: i64, patch: AgeGroupPatch) -> CatalogResult<AgeGroup> {
        gateway::update_age_group(&mut self.conn, id, patch)?;
        self.get_age_group(id)
    }

    pub fn delete_age_group(&mut self, id: i64) -> CatalogResult<()> {
        gateway::delete_age_group(&mut self.conn, id)
    }

    pub fn create_setting(&mut self, input: NewSetting) -> CatalogResult<Setting> {
        let id = gateway::create_setting(&mut self.conn, input)?;
        self.get_setting(id)
    }

    pub fn update_setting(&mut self, id: i64, patch: SettingPatch) -> CatalogResult<Setting> {
        gateway::update_setting(&mut self.conn, id, patch)?;
        self.get_setting(id)
    }

    pub fn delete_setting(&mut self, id: i64) -> CatalogResult<()> {
        gateway::delete_setting(&mut self.conn, id)
    }

    pub fn reorder(&mut self, scope: Scope, ordered_ids: &[i64]) -> CatalogResult<Vec<OrderSlot>> {
        gateway::reorder(&mut self.conn, scope, ordered_ids)
    }
}
