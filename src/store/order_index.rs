//! Dense `order_index` maintenance for manually ordered scopes.
//!
//! Every function here runs inside the caller's transaction. After any of
//! them commits, a scope with N rows holds exactly the indices `0..N`.
//! Renumbering first parks every row of the scope at `-id` so that the
//! unique `(scope, order_index)` index never sees a transient duplicate.

use std::collections::BTreeSet;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};
use tracing::warn;

use crate::catalog::{CatalogError, CatalogResult, Scope};

/// Partition predicate for `scope`, with placeholders starting at `first_param`
pub(crate) fn scope_predicate(scope: Scope, first_param: usize) -> (String, Vec<Value>) {
    match scope.partition() {
        Some((column, value)) => (
            format!("{} = ?{}", column, first_param),
            vec![Value::Text(value.to_string())],
        ),
        None => ("1 = 1".to_string(), Vec::new()),
    }
}

/// Number of live rows in the scope
pub fn count(conn: &Connection, scope: Scope) -> CatalogResult<i64> {
    let (predicate, params) = scope_predicate(scope, 1);
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        scope.kind().table(),
        predicate
    );
    Ok(conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?)
}

/// Ids of the scope in display order
pub fn ordered_ids(conn: &Connection, scope: Scope) -> CatalogResult<Vec<i64>> {
    scope.require_manual()?;

    let (predicate, params) = scope_predicate(scope, 1);
    let sql = format!(
        "SELECT id FROM {} WHERE {} ORDER BY order_index ASC, created_at_ms DESC, id ASC",
        scope.kind().table(),
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Raw `order_index` values of the scope, ascending
pub fn order_indices(conn: &Connection, scope: Scope) -> CatalogResult<Vec<i64>> {
    scope.require_manual()?;

    let (predicate, params) = scope_predicate(scope, 1);
    let sql = format!(
        "SELECT order_index FROM {} WHERE {} ORDER BY order_index ASC",
        scope.kind().table(),
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;
    let indices = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(indices)
}

/// True when the scope's indices are exactly `0..N`
pub fn is_dense(conn: &Connection, scope: Scope) -> CatalogResult<bool> {
    let indices = order_indices(conn, scope)?;
    Ok(indices.iter().enumerate().all(|(i, &idx)| idx == i as i64))
}

/// Next tail index for a row about to be inserted into `scope`
pub fn append(tx: &Transaction<'_>, scope: Scope) -> CatalogResult<i64> {
    scope.require_manual()?;
    count(tx, scope)
}

/// Renumber the scope to `0..N` keeping the current relative order
pub fn compact(tx: &Transaction<'_>, scope: Scope) -> CatalogResult<()> {
    let ids = ordered_ids(tx, scope)?;
    assign(tx, scope, &ids)
}

/// Apply a full target ordering to the scope.
///
/// `ordered_ids` must contain exactly the ids currently live in the scope,
/// each once. Anything else is rejected before a single row is written.
pub fn reorder(tx: &Transaction<'_>, scope: Scope, ordered_ids: &[i64]) -> CatalogResult<()> {
    let live = self::ordered_ids(tx, scope)?;

    if let Err(err) = check_same_set(&live, ordered_ids) {
        warn!(%scope, requested = ordered_ids.len(), live = live.len(), "Rejected reorder: {}", err);
        return Err(err);
    }

    assign(tx, scope, ordered_ids)
}

/// Verify `requested` is a permutation of `live`
fn check_same_set(live: &[i64], requested: &[i64]) -> CatalogResult<()> {
    let mut seen = BTreeSet::new();
    let duplicates: BTreeSet<i64> = requested
        .iter()
        .copied()
        .filter(|id| !seen.insert(*id))
        .collect();
    if !duplicates.is_empty() {
        return Err(CatalogError::validation(format!(
            "orderedIds contains duplicate ids: {:?}",
            duplicates
        )));
    }

    let live: BTreeSet<i64> = live.iter().copied().collect();
    let missing: Vec<i64> = live.difference(&seen).copied().collect();
    let foreign: Vec<i64> = seen.difference(&live).copied().collect();

    if !missing.is_empty() || !foreign.is_empty() {
        return Err(CatalogError::validation(format!(
            "orderedIds must list exactly the {} ids in scope (missing: {:?}, unknown: {:?})",
            live.len(),
            missing,
            foreign
        )));
    }

    Ok(())
}

/// Write `order_index = i` for `ids[i]`. Row counts are checked at every step
/// so a scope that changed under the transaction aborts it.
fn assign(tx: &Transaction<'_>, scope: Scope, ids: &[i64]) -> CatalogResult<()> {
    let table = scope.kind().table();

    let (predicate, params) = scope_predicate(scope, 1);
    let parked = tx.execute(
        &format!("UPDATE {} SET order_index = -id WHERE {}", table, predicate),
        params_from_iter(params),
    )?;
    if parked != ids.len() {
        return Err(CatalogError::conflict(format!(
            "{} changed during renumbering (expected {} rows, found {})",
            scope,
            ids.len(),
            parked
        )));
    }

    let (predicate, params) = scope_predicate(scope, 3);
    let mut stmt = tx.prepare(&format!(
        "UPDATE {} SET order_index = ?1 WHERE id = ?2 AND {}",
        table, predicate
    ))?;

    for (index, id) in ids.iter().enumerate() {
        let mut row_params = vec![Value::Integer(index as i64), Value::Integer(*id)];
        row_params.extend(params.iter().cloned());

        let changed = stmt.execute(params_from_iter(row_params))?;
        if changed != 1 {
            return Err(CatalogError::conflict(format!(
                "{} changed during renumbering (id {} not in scope)",
                scope, id
            )));
        }
    }

    Ok(())
}
