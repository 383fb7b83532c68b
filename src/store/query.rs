//! Catalog Query Engine: filtered, paginated, totally ordered list reads.
//!
//! The page and its `total` are computed with the same predicate inside one
//! read transaction. Ordering always ends in `created_at_ms DESC, id ASC`, so
//! repeated identical queries paginate stably.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use super::relations;
use super::schema::UNICODE_LOWER;
use super::timestamp_column;
use crate::catalog::{
    AgeGroup, CatalogError, CatalogResult, Category, Content, EntityKind, ListFilter,
    OrderingCapability, Page, PageWindow, Projection, Setting,
};

const CONTENT_COLUMNS: &str = "id, title, description, content_type, age_min, age_max, \
     media_url, thumbnail_url, is_active, order_index, created_at_ms, updated_at_ms";
const CATEGORY_COLUMNS: &str =
    "id, name, description, order_index, created_at_ms, updated_at_ms";
const AGE_GROUP_COLUMNS: &str =
    "id, label, description, age_min, age_max, created_at_ms, updated_at_ms";
const SETTING_COLUMNS: &str = "id, key, value, description, created_at_ms, updated_at_ms";

/// WHERE clause under construction, with positional parameters
#[derive(Debug, Default)]
struct Predicate {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicate {
    fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    /// Case-insensitive substring match over any of `columns`
    fn push_search(&mut self, columns: &[&str], needle: &str) {
        let clause = columns
            .iter()
            .map(|col| format!("instr({}({}), ?) > 0", UNICODE_LOWER, col))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.push(
            format!("({})", clause),
            columns.iter().map(|_| Value::Text(needle.to_string())),
        );
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }
}

/// Build the predicate for `kind`, honoring only the filters that apply to it
fn predicate_for(kind: EntityKind, filter: &ListFilter) -> Predicate {
    let mut predicate = Predicate::default();
    let needle = filter.search_needle();

    match kind {
        EntityKind::Content => {
            if let Some(content_type) = filter.content_type {
                predicate.push(
                    "content_type = ?",
                    [Value::Text(content_type.as_str().to_string())],
                );
            }
            if let Some(age) = filter.age {
                predicate.push(
                    "age_min <= ? AND age_max >= ?",
                    [Value::Integer(age.max), Value::Integer(age.min)],
                );
            }
            if let Some(category_id) = filter.category {
                predicate.push(
                    "EXISTS (SELECT 1 FROM content_categories cc \
                     WHERE cc.content_id = contents.id AND cc.category_id = ?)",
                    [Value::Integer(category_id)],
                );
            }
            if let Some(age_group_id) = filter.age_group {
                predicate.push(
                    "EXISTS (SELECT 1 FROM content_age_groups ca \
                     WHERE ca.content_id = contents.id AND ca.age_group_id = ?)",
                    [Value::Integer(age_group_id)],
                );
            }
            if let Some(needle) = &needle {
                predicate.push_search(&["title", "description"], needle);
            }
            if filter.active_only {
                predicate.push("is_active = 1", []);
            }
        }
        EntityKind::Category => {
            if let Some(needle) = &needle {
                predicate.push_search(&["name", "description"], needle);
            }
        }
        EntityKind::AgeGroup => {
            if let Some(age) = filter.age {
                predicate.push(
                    "age_min <= ? AND age_max >= ?",
                    [Value::Integer(age.max), Value::Integer(age.min)],
                );
            }
            if let Some(needle) = &needle {
                predicate.push_search(&["label", "description"], needle);
            }
        }
        EntityKind::Setting => {
            if let Some(needle) = &needle {
                predicate.push_search(&["key", "value"], needle);
            }
        }
    }

    predicate
}

/// ORDER BY clause giving a total order for `kind`
pub(crate) fn order_clause(kind: EntityKind) -> String {
    let primary = match kind.ordering() {
        OrderingCapability::Manual { .. } => "order_index ASC",
        OrderingCapability::Natural { order_by } => order_by,
    };
    format!("{}, created_at_ms DESC, id ASC", primary)
}

/// Count and fetch one page of `kind`. Callers run this inside a read
/// transaction so `total` and `data` see the same snapshot.
fn list_rows<T>(
    conn: &Connection,
    kind: EntityKind,
    columns: &str,
    filter: &ListFilter,
    window: PageWindow,
    map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> CatalogResult<Page<T>> {
    let predicate = predicate_for(kind, filter);
    let where_sql = predicate.sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE {}", kind.table(), where_sql),
        params_from_iter(predicate.params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = predicate.params.clone();
    page_params.push(Value::Integer(i64::from(window.limit)));
    page_params.push(Value::Integer(window.offset as i64));

    let data = {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            columns,
            kind.table(),
            where_sql,
            order_clause(kind)
        ))?;
        let rows = stmt.query_map(params_from_iter(page_params), map_row)?;
        rows.collect::<Result<Vec<T>, _>>()?
    };

    debug!(
        kind = %kind,
        total,
        returned = data.len(),
        limit = window.limit,
        offset = window.offset,
        "Listed catalog entities"
    );

    Ok(Page {
        data,
        total: total.max(0) as u64,
        limit: window.limit,
        offset: window.offset,
    })
}

fn content_from_row(row: &Row<'_>) -> rusqlite::Result<Content> {
    Ok(Content {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        content_type: row.get(3)?,
        age_min: row.get(4)?,
        age_max: row.get(5)?,
        media_url: row.get(6)?,
        thumbnail_url: row.get(7)?,
        is_active: row.get(8)?,
        order_index: row.get(9)?,
        created_at: timestamp_column(row, 10)?,
        updated_at: timestamp_column(row, 11)?,
        categories: Vec::new(),
        age_groups: Vec::new(),
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        order_index: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

fn age_group_from_row(row: &Row<'_>) -> rusqlite::Result<AgeGroup> {
    Ok(AgeGroup {
        id: row.get(0)?,
        label: row.get(1)?,
        description: row.get(2)?,
        age_min: row.get(3)?,
        age_max: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

fn setting_from_row(row: &Row<'_>) -> rusqlite::Result<Setting> {
    Ok(Setting {
        id: row.get(0)?,
        key: row.get(1)?,
        value: row.get(2)?,
        description: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

/// Attach projected relation arrays to a batch of content rows
fn attach_relations(
    conn: &Connection,
    contents: &mut [Content],
    projection: Projection,
) -> CatalogResult<()> {
    let ids: Vec<i64> = contents.iter().map(|c| c.id).collect();
    let mut relations = relations::load(conn, &ids)?;

    for content in contents.iter_mut() {
        let rows = relations.remove(&content.id).unwrap_or_default();
        content.categories = projection.categories(&rows.categories);
        content.age_groups = projection.age_groups(&rows.age_groups);
    }
    Ok(())
}

/// List content with relations shaped for `projection`
pub fn list_contents(
    conn: &Connection,
    filter: &ListFilter,
    window: PageWindow,
    projection: Projection,
) -> CatalogResult<Page<Content>> {
    let tx = conn.unchecked_transaction()?;
    let mut page = list_rows(
        &tx,
        EntityKind::Content,
        CONTENT_COLUMNS,
        filter,
        window,
        content_from_row,
    )?;
    attach_relations(&tx, &mut page.data, projection)?;
    tx.finish()?;
    Ok(page)
}

pub fn list_categories(
    conn: &Connection,
    filter: &ListFilter,
    window: PageWindow,
) -> CatalogResult<Page<Category>> {
    let tx = conn.unchecked_transaction()?;
    let page = list_rows(
        &tx,
        EntityKind::Category,
        CATEGORY_COLUMNS,
        filter,
        window,
        category_from_row,
    )?;
    tx.finish()?;
    Ok(page)
}

pub fn list_age_groups(
    conn: &Connection,
    filter: &ListFilter,
    window: PageWindow,
) -> CatalogResult<Page<AgeGroup>> {
    let tx = conn.unchecked_transaction()?;
    let page = list_rows(
        &tx,
        EntityKind::AgeGroup,
        AGE_GROUP_COLUMNS,
        filter,
        window,
        age_group_from_row,
    )?;
    tx.finish()?;
    Ok(page)
}

pub fn list_settings(
    conn: &Connection,
    filter: &ListFilter,
    window: PageWindow,
) -> CatalogResult<Page<Setting>> {
    let tx = conn.unchecked_transaction()?;
    let page = list_rows(
        &tx,
        EntityKind::Setting,
        SETTING_COLUMNS,
        filter,
        window,
        setting_from_row,
    )?;
    tx.finish()?;
    Ok(page)
}

fn get_row<T>(
    conn: &Connection,
    kind: EntityKind,
    columns: &str,
    id: i64,
    map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> CatalogResult<T> {
    conn.query_row(
        &format!("SELECT {} FROM {} WHERE id = ?1", columns, kind.table()),
        params![id],
        map_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found(kind, id))
}

/// Fetch one content item. Public reads never see inactive items.
pub fn get_content(conn: &Connection, id: i64, projection: Projection) -> CatalogResult<Content> {
    let content = get_row(conn, EntityKind::Content, CONTENT_COLUMNS, id, content_from_row)?;

    if projection.is_public() && !content.is_active {
        return Err(CatalogError::not_found(EntityKind::Content, id));
    }

    let mut contents = [content];
    attach_relations(conn, &mut contents, projection)?;
    let [content] = contents;
    Ok(content)
}

pub fn get_category(conn: &Connection, id: i64) -> CatalogResult<Category> {
    get_row(conn, EntityKind::Category, CATEGORY_COLUMNS, id, category_from_row)
}

pub fn get_age_group(conn: &Connection, id: i64) -> CatalogResult<AgeGroup> {
    get_row(conn, EntityKind::AgeGroup, AGE_GROUP_COLUMNS, id, age_group_from_row)
}

pub fn get_setting(conn: &Connection, id: i64) -> CatalogResult<Setting> {
    get_row(conn, EntityKind::Setting, SETTING_COLUMNS, id, setting_from_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AgeRange, ContentType, Pagination, QueryLimits};
    use crate::store::schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO contents (id, title, description, content_type, age_min, age_max, is_active, order_index, created_at_ms, updated_at_ms) VALUES
                (1, 'The Brave Lion', 'A jungle tale', 'story', 3, 6, 1, 0, 100, 100),
                (2, 'Counting Stars', 'Numbers in space', 'video', 5, 8, 1, 0, 200, 200),
                (3, 'Shape Match', 'Puzzle game', 'game', 2, 4, 0, 0, 300, 300),
                (4, 'Lion Dance', 'Music video', 'video', 6, 10, 1, 1, 400, 400);
             INSERT INTO categories (id, name, order_index, created_at_ms, updated_at_ms) VALUES
                (1, 'Animals', 0, 0, 0);
             INSERT INTO content_categories (content_id, category_id) VALUES (1, 1), (4, 1);",
        )
        .unwrap();
        conn
    }

    fn window() -> PageWindow {
        Pagination::default().resolve(QueryLimits::default())
    }

    fn ids(page: &Page<Content>) -> Vec<i64> {
        page.data.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_order_clause_per_capability() {
        assert!(order_clause(EntityKind::Category).starts_with("order_index ASC"));
        assert!(order_clause(EntityKind::Setting).starts_with("key ASC"));
        assert!(order_clause(EntityKind::AgeGroup).ends_with("id ASC"));
    }

    #[test]
    fn test_age_overlap_filter() {
        let conn = setup();

        let filter = ListFilter::default().with_age(AgeRange::single(4).unwrap());
        let page = list_contents(&conn, &filter, window(), Projection::Admin).unwrap();
        assert_eq!(ids(&page), vec![3, 1]);

        let filter = ListFilter::default().with_age(AgeRange::single(9).unwrap());
        let page = list_contents(&conn, &filter, window(), Projection::Admin).unwrap();
        assert_eq!(ids(&page), vec![4]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_search_is_case_insensitive_and_blank_ignored() {
        let conn = setup();

        let filter = ListFilter::default().with_search("LION");
        let page = list_contents(&conn, &filter, window(), Projection::Admin).unwrap();
        assert_eq!(page.total, 2);

        let filter = ListFilter::default().with_search("   ");
        let page = list_contents(&conn, &filter, window(), Projection::Admin).unwrap();
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_active_and_category_filters() {
        let conn = setup();

        let filter = ListFilter::default().active_only();
        let page = list_contents(&conn, &filter, window(), Projection::public()).unwrap();
        assert!(!ids(&page).contains(&3));

        let filter = ListFilter::default().with_category(1).with_type(ContentType::Video);
        let page = list_contents(&conn, &filter, window(), Projection::public()).unwrap();
        assert_eq!(ids(&page), vec![4]);
        assert_eq!(page.data[0].categories.len(), 1);
    }

    #[test]
    fn test_inapplicable_filters_are_ignored() {
        let conn = setup();
        let filter = ListFilter::default()
            .with_type(ContentType::Game)
            .with_category(42)
            .active_only();

        let page = list_categories(&conn, &filter, window()).unwrap();
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_public_get_hides_inactive() {
        let conn = setup();
        assert!(matches!(
            get_content(&conn, 3, Projection::public()),
            Err(CatalogError::NotFound { .. })
        ));
        assert_eq!(get_content(&conn, 3, Projection::Admin).unwrap().id, 3);
        assert!(get_content(&conn, 99, Projection::Admin).is_err());
    }
}
