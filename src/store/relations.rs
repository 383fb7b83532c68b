//! Content ↔ category and content ↔ age-group link tables.
//!
//! Links have no lifecycle of their own. They are replaced wholesale as part
//! of a content write, inside that write's transaction.

use std::collections::{BTreeSet, HashMap};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::catalog::{AgeGroupSummary, CatalogError, CatalogResult, CategorySummary, EntityKind};

/// Relation rows attached to one content item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationRows {
    pub categories: Vec<CategorySummary>,
    pub age_groups: Vec<AgeGroupSummary>,
}

/// A link table and the entity it points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Category,
    AgeGroup,
}

impl Link {
    fn table(self) -> &'static str {
        match self {
            Link::Category => "content_categories",
            Link::AgeGroup => "content_age_groups",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Link::Category => "category_id",
            Link::AgeGroup => "age_group_id",
        }
    }

    fn target(self) -> EntityKind {
        match self {
            Link::Category => EntityKind::Category,
            Link::AgeGroup => EntityKind::AgeGroup,
        }
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Load relation rows for a batch of content items.
///
/// Every requested id gets an entry, empty when it has no links.
pub fn load(conn: &Connection, content_ids: &[i64]) -> CatalogResult<HashMap<i64, RelationRows>> {
    let mut rows: HashMap<i64, RelationRows> = content_ids
        .iter()
        .map(|id| (*id, RelationRows::default()))
        .collect();

    if content_ids.is_empty() {
        return Ok(rows);
    }

    let ids: Vec<Value> = content_ids.iter().map(|id| Value::Integer(*id)).collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT cc.content_id, c.id, c.name
         FROM content_categories cc
         JOIN categories c ON c.id = cc.category_id
         WHERE cc.content_id IN ({})
         ORDER BY c.id ASC",
        placeholders(ids.len())
    ))?;
    let categories = stmt.query_map(params_from_iter(ids.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            CategorySummary {
                id: row.get(1)?,
                name: row.get(2)?,
            },
        ))
    })?;
    for entry in categories {
        let (content_id, summary) = entry?;
        rows.entry(content_id).or_default().categories.push(summary);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT ca.content_id, g.id, g.label, g.age_min, g.age_max
         FROM content_age_groups ca
         JOIN age_groups g ON g.id = ca.age_group_id
         WHERE ca.content_id IN ({})
         ORDER BY g.age_min ASC, g.age_max ASC, g.id ASC",
        placeholders(ids.len())
    ))?;
    let age_groups = stmt.query_map(params_from_iter(ids.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            AgeGroupSummary {
                id: row.get(1)?,
                label: row.get(2)?,
                age_min: row.get(3)?,
                age_max: row.get(4)?,
            },
        ))
    })?;
    for entry in age_groups {
        let (content_id, summary) = entry?;
        rows.entry(content_id).or_default().age_groups.push(summary);
    }

    Ok(rows)
}

/// Linked target ids for one content item, ascending
pub fn linked_ids(conn: &Connection, link: Link, content_id: i64) -> CatalogResult<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {col} FROM {table} WHERE content_id = ?1 ORDER BY {col} ASC",
        col = link.column(),
        table = link.table()
    ))?;
    let ids = stmt
        .query_map(params![content_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Replace the full link set of `content_id` with `target_ids`.
///
/// Unknown targets are rejected before anything is removed. Duplicates in
/// `target_ids` collapse to a single link.
pub fn replace(
    tx: &Transaction<'_>,
    link: Link,
    content_id: i64,
    target_ids: &[i64],
) -> CatalogResult<()> {
    let wanted: BTreeSet<i64> = target_ids.iter().copied().collect();
    ensure_targets_exist(tx, link, &wanted)?;

    tx.execute(
        &format!("DELETE FROM {} WHERE content_id = ?1", link.table()),
        params![content_id],
    )?;

    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {} (content_id, {}) VALUES (?1, ?2)",
        link.table(),
        link.column()
    ))?;
    for target_id in &wanted {
        stmt.execute(params![content_id, target_id])?;
    }

    Ok(())
}

/// Remove every link pointing at a category or age group about to be deleted
pub fn detach_target(tx: &Transaction<'_>, link: Link, target_id: i64) -> CatalogResult<usize> {
    Ok(tx.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", link.table(), link.column()),
        params![target_id],
    )?)
}

/// Remove every link owned by a content item
pub fn detach_content(tx: &Transaction<'_>, content_id: i64) -> CatalogResult<()> {
    for link in [Link::Category, Link::AgeGroup] {
        tx.execute(
            &format!("DELETE FROM {} WHERE content_id = ?1", link.table()),
            params![content_id],
        )?;
    }
    Ok(())
}

/// Fail with a validation error if any of `ids` does not exist
pub fn validate_targets(conn: &Connection, link: Link, ids: &[i64]) -> CatalogResult<()> {
    ensure_targets_exist(conn, link, &ids.iter().copied().collect())
}

fn ensure_targets_exist(conn: &Connection, link: Link, ids: &BTreeSet<i64>) -> CatalogResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE id IN ({})",
        link.target().table(),
        placeholders(values.len())
    ))?;
    let found = stmt
        .query_map(params_from_iter(values), |row| row.get(0))?
        .collect::<Result<BTreeSet<i64>, _>>()?;

    let unknown: Vec<i64> = ids.difference(&found).copied().collect();
    if !unknown.is_empty() {
        return Err(CatalogError::validation(format!(
            "unknown {} ids: {:?}",
            link.target(),
            unknown
        )));
    }

    Ok(())
}
