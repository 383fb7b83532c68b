//! Admin Mutation Gateway: the only writer of the catalog.
//!
//! Each operation validates its input, then runs every write it needs
//! (entity row, relation links, order maintenance) inside one
//! `BEGIN IMMEDIATE` transaction. A failure at any step rolls the whole
//! operation back.

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::relations::{self, Link};
use super::{now_millis, order_index, query};
use crate::catalog::entity::{validate_age_range, validate_label};
use crate::catalog::error::unique_violation;
use crate::catalog::{
    AgeGroupPatch, CatalogError, CatalogResult, CategoryPatch, ContentPatch, ContentType,
    EntityKind, NewAgeGroup, NewCategory, NewContent, NewSetting, Projection, Scope, SettingPatch,
};

/// One entry of a scope's order after a reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSlot {
    pub id: i64,
    pub order_index: i64,
}

fn begin(conn: &mut Connection) -> CatalogResult<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Empty string clears an optional URL, anything else replaces it
fn patch_optional(current: Option<String>, patch: Option<String>) -> Option<String> {
    match patch {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value),
        None => current,
    }
}

fn content_scope(tx: &Transaction<'_>, id: i64) -> CatalogResult<Scope> {
    tx.query_row(
        "SELECT content_type FROM contents WHERE id = ?1",
        params![id],
        |row| row.get::<_, ContentType>(0),
    )
    .optional()?
    .map(Scope::Content)
    .ok_or_else(|| CatalogError::not_found(EntityKind::Content, id))
}

// ============================================================================
// Content
// ============================================================================

/// Create a content item at the tail of its type's scope
pub fn create_content(conn: &mut Connection, input: NewContent) -> CatalogResult<i64> {
    input.validate()?;

    let scope = Scope::Content(input.content_type);
    let now = now_millis();
    let tx = begin(conn)?;

    if let Some(ids) = &input.category_ids {
        relations::validate_targets(&tx, Link::Category, ids)?;
    }
    if let Some(ids) = &input.age_group_ids {
        relations::validate_targets(&tx, Link::AgeGroup, ids)?;
    }

    let position = order_index::append(&tx, scope)?;
    tx.execute(
        "INSERT INTO contents (title, description, content_type, age_min, age_max, media_url,
                               thumbnail_url, is_active, order_index, created_at_ms, updated_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            input.title.trim(),
            input.description,
            input.content_type,
            input.age_min,
            input.age_max,
            patch_optional(None, input.media_url),
            patch_optional(None, input.thumbnail_url),
            input.is_active,
            position,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();

    if let Some(ids) = &input.category_ids {
        relations::replace(&tx, Link::Category, id, ids)?;
    }
    if let Some(ids) = &input.age_group_ids {
        relations::replace(&tx, Link::AgeGroup, id, ids)?;
    }

    tx.commit()?;
    info!(id, %scope, order_index = position, "Created content");
    Ok(id)
}

/// Patch a content item.
///
/// Changing the type moves the item to the tail of the new type's scope and
/// compacts the old one. Otherwise `order_index` is left alone.
pub fn update_content(conn: &mut Connection, id: i64, patch: ContentPatch) -> CatalogResult<()> {
    let tx = begin(conn)?;
    let current = query::get_content(&tx, id, Projection::Admin)?;

    let title = patch.title.unwrap_or(current.title);
    let content_type = patch.content_type.unwrap_or(current.content_type);
    let age_min = patch.age_min.unwrap_or(current.age_min);
    let age_max = patch.age_max.unwrap_or(current.age_max);
    validate_label("title", &title)?;
    validate_age_range(age_min, age_max)?;

    if let Some(ids) = &patch.category_ids {
        relations::validate_targets(&tx, Link::Category, ids)?;
    }
    if let Some(ids) = &patch.age_group_ids {
        relations::validate_targets(&tx, Link::AgeGroup, ids)?;
    }

    let old_scope = Scope::Content(current.content_type);
    let new_scope = Scope::Content(content_type);
    let position = if old_scope == new_scope {
        current.order_index
    } else {
        order_index::append(&tx, new_scope)?
    };

    tx.execute(
        "UPDATE contents
         SET title = ?2, description = ?3, content_type = ?4, age_min = ?5, age_max = ?6,
             media_url = ?7, thumbnail_url = ?8, is_active = ?9, order_index = ?10,
             updated_at_ms = ?11
         WHERE id = ?1",
        params![
            id,
            title.trim(),
            patch.description.unwrap_or(current.description),
            content_type,
            age_min,
            age_max,
            patch_optional(current.media_url, patch.media_url),
            patch_optional(current.thumbnail_url, patch.thumbnail_url),
            patch.is_active.unwrap_or(current.is_active),
            position,
            now_millis(),
        ],
    )?;

    if old_scope != new_scope {
        order_index::compact(&tx, old_scope)?;
        info!(id, from = %old_scope, to = %new_scope, order_index = position, "Moved content between scopes");
    }

    if let Some(ids) = &patch.category_ids {
        relations::replace(&tx, Link::Category, id, ids)?;
    }
    if let Some(ids) = &patch.age_group_ids {
        relations::replace(&tx, Link::AgeGroup, id, ids)?;
    }

    tx.commit()?;
    Ok(())
}

/// Delete a content item, its links, and close the gap it leaves
pub fn delete_content(conn: &mut Connection, id: i64) -> CatalogResult<()> {
    let tx = begin(conn)?;
    let scope = content_scope(&tx, id)?;

    relations::detach_content(&tx, id)?;
    tx.execute("DELETE FROM contents WHERE id = ?1", params![id])?;
    order_index::compact(&tx, scope)?;

    tx.commit()?;
    info!(id, %scope, "Deleted content");
    Ok(())
}

// ============================================================================
// Categories
// ============================================================================

pub fn create_category(conn: &mut Connection, input: NewCategory) -> CatalogResult<i64> {
    input.validate()?;

    let name = input.name.trim().to_string();
    let now = now_millis();
    let tx = begin(conn)?;

    let position = order_index::append(&tx, Scope::Categories)?;
    tx.execute(
        "INSERT INTO categories (name, description, order_index, created_at_ms, updated_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![name, input.description, position, now],
    )
    .map_err(|e| unique_violation(e, format!("category '{}' already exists", name)))?;
    let id = tx.last_insert_rowid();

    tx.commit()?;
    info!(id, order_index = position, "Created category");
    Ok(id)
}

pub fn update_category(conn: &mut Connection, id: i64, patch: CategoryPatch) -> CatalogResult<()> {
    let tx = begin(conn)?;
    let current = query::get_category(&tx, id)?;

    let name = patch.name.unwrap_or(current.name).trim().to_string();
    validate_label("name", &name)?;

    tx.execute(
        "UPDATE categories SET name = ?2, description = ?3, updated_at_ms = ?4 WHERE id = ?1",
        params![
            id,
            name,
            patch.description.unwrap_or(current.description),
            now_millis()
        ],
    )
    .map_err(|e| unique_violation(e, format!("category '{}' already exists", name)))?;

    tx.commit()?;
    Ok(())
}

/// Delete a category, unlink it from all content, and compact the scope
pub fn delete_category(conn: &mut Connection, id: i64) -> CatalogResult<()> {
    let tx = begin(conn)?;

    let unlinked = relations::detach_target(&tx, Link::Category, id)?;
    let deleted = tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(CatalogError::not_found(EntityKind::Category, id));
    }
    order_index::compact(&tx, Scope::Categories)?;

    tx.commit()?;
    info!(id, unlinked, "Deleted category");
    Ok(())
}

// ============================================================================
// Age groups
// ============================================================================

pub fn create_age_group(conn: &mut Connection, input: NewAgeGroup) -> CatalogResult<i64> {
    input.validate()?;

    let tx = begin(conn)?;
    tx.execute(
        "INSERT INTO age_groups (label, description, age_min, age_max, created_at_ms, updated_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            input.label.trim(),
            input.description,
            input.age_min,
            input.age_max,
            now_millis()
        ],
    )?;
    let id = tx.last_insert_rowid();

    tx.commit()?;
    info!(id, age_min = input.age_min, age_max = input.age_max, "Created age group");
    Ok(id)
}

pub fn update_age_group(conn: &mut Connection, id: i64, patch: AgeGroupPatch) -> CatalogResult<()> {
    let tx = begin(conn)?;
    let current = query::get_age_group(&tx, id)?;

    let label = patch.label.unwrap_or(current.label);
    let age_min = patch.age_min.unwrap_or(current.age_min);
    let age_max = patch.age_max.unwrap_or(current.age_max);
    validate_label("label", &label)?;
    validate_age_range(age_min, age_max)?;

    tx.execute(
        "UPDATE age_groups
         SET label = ?2, description = ?3, age_min = ?4, age_max = ?5, updated_at_ms = ?6
         WHERE id = ?1",
        params![
            id,
            label.trim(),
            patch.description.unwrap_or(current.description),
            age_min,
            age_max,
            now_millis()
        ],
    )?;

    tx.commit()?;
    Ok(())
}

pub fn delete_age_group(conn: &mut Connection, id: i64) -> CatalogResult<()> {
    let tx = begin(conn)?;

    let unlinked = relations::detach_target(&tx, Link::AgeGroup, id)?;
    let deleted = tx.execute("DELETE FROM age_groups WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(CatalogError::not_found(EntityKind::AgeGroup, id));
    }

    tx.commit()?;
    info!(id, unlinked, "Deleted age group");
    Ok(())
}

// ============================================================================
// Settings
// ============================================================================

pub fn create_setting(conn: &mut Connection, input: NewSetting) -> CatalogResult<i64> {
    input.validate()?;

    let key = input.key.trim().to_string();
    let tx = begin(conn)?;
    tx.execute(
        "INSERT INTO settings (key, value, description, created_at_ms, updated_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![key, input.value, input.description, now_millis()],
    )
    .map_err(|e| unique_violation(e, format!("setting '{}' already exists", key)))?;
    let id = tx.last_insert_rowid();

    tx.commit()?;
    info!(id, key = %key, "Created setting");
    Ok(id)
}

pub fn update_setting(conn: &mut Connection, id: i64, patch: SettingPatch) -> CatalogResult<()> {
    let tx = begin(conn)?;
    let current = query::get_setting(&tx, id)?;

    let key = patch.key.unwrap_or(current.key).trim().to_string();
    validate_label("key", &key)?;

    tx.execute(
        "UPDATE settings SET key = ?2, value = ?3, description = ?4, updated_at_ms = ?5
         WHERE id = ?1",
        params![
            id,
            key,
            patch.value.unwrap_or(current.value),
            patch.description.unwrap_or(current.description),
            now_millis()
        ],
    )
    .map_err(|e| unique_violation(e, format!("setting '{}' already exists", key)))?;

    tx.commit()?;
    Ok(())
}

pub fn delete_setting(conn: &mut Connection, id: i64) -> CatalogResult<()> {
    let tx = begin(conn)?;
    let deleted = tx.execute("DELETE FROM settings WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(CatalogError::not_found(EntityKind::Setting, id));
    }

    tx.commit()?;
    info!(id, "Deleted setting");
    Ok(())
}

// ============================================================================
// Ordering
// ============================================================================

/// Replace the order of a manually ordered scope with `ordered_ids`
pub fn reorder(conn: &mut Connection, scope: Scope, ordered_ids: &[i64]) -> CatalogResult<Vec<OrderSlot>> {
    scope.require_manual()?;

    let tx = begin(conn)?;
    order_index::reorder(&tx, scope, ordered_ids)?;
    tx.commit()?;

    info!(%scope, count = ordered_ids.len(), "Reordered scope");

    Ok(ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| OrderSlot {
            id: *id,
            order_index: index as i64,
        })
        .collect())
}
