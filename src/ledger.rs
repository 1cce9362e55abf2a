// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger store: persisted income/expense records keyed by owning user,
//! category, kind, and date. Budgets and goals keep denormalized snapshots
//! of aggregates over this store; deleting a record never cascades onto
//! them (the snapshots are recomputed on read).

use crate::errors::{EngineError, EngineResult};
use crate::models::{LedgerRecord, RecordKind, Recurrence};
use crate::utils::decimal_from_sql;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

const COLUMNS: &str = "id, user_id, kind, amount, category, tags, date, description, \
                       recurrence_pattern, recurrence_end";

pub struct NewRecord<'a> {
    pub kind: RecordKind,
    pub amount: Decimal,
    pub category: &'a str,
    pub tags: Vec<String>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
}

#[derive(Default)]
pub struct RecordUpdate {
    pub kind: Option<RecordKind>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Default)]
pub struct RecordFilter {
    pub kind: Option<RecordKind>,
    pub category: Option<String>,
    pub month: Option<String>,
    pub limit: Option<usize>,
}

fn record_from_row(r: &Row) -> rusqlite::Result<LedgerRecord> {
    let amount: String = r.get(3)?;
    let tags: String = r.get(5)?;
    let tags: Vec<String> = serde_json::from_str(&tags).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let recurrence = match r.get::<_, Option<_>>(8)? {
        Some(pattern) => Some(Recurrence {
            pattern,
            end_date: r.get(9)?,
        }),
        None => None,
    };
    Ok(LedgerRecord {
        id: r.get(0)?,
        user_id: r.get(1)?,
        kind: r.get(2)?,
        amount: decimal_from_sql(3, &amount)?,
        category: r.get(4)?,
        tags,
        date: r.get(6)?,
        description: r.get(7)?,
        recurrence,
    })
}

pub fn insert(conn: &Connection, user_id: i64, rec: &NewRecord) -> EngineResult<LedgerRecord> {
    if rec.amount < Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "amount must be non-negative, got {}",
            rec.amount
        )));
    }
    let tags = serde_json::to_string(&rec.tags)
        .map_err(|e| EngineError::validation(format!("unserializable tags: {}", e)))?;
    conn.execute(
        "INSERT INTO transactions(user_id, kind, amount, category, tags, date, description,
                                  recurrence_pattern, recurrence_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user_id,
            rec.kind,
            rec.amount.to_string(),
            rec.category,
            tags,
            rec.date,
            rec.description,
            rec.recurrence.as_ref().map(|r| r.pattern),
            rec.recurrence.as_ref().and_then(|r| r.end_date),
        ],
    )?;
    get(conn, user_id, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, user_id: i64, id: i64) -> EngineResult<LedgerRecord> {
    let rec = conn
        .query_row(
            &format!("SELECT {} FROM transactions WHERE id=?1", COLUMNS),
            params![id],
            record_from_row,
        )
        .optional()?
        .ok_or_else(|| EngineError::not_found("transaction", id))?;
    if rec.user_id != user_id {
        return Err(EngineError::forbidden("transaction", id));
    }
    Ok(rec)
}

pub fn update(
    conn: &Connection,
    user_id: i64,
    id: i64,
    patch: &RecordUpdate,
) -> EngineResult<LedgerRecord> {
    get(conn, user_id, id)?;
    if let Some(amount) = patch.amount {
        if amount < Decimal::ZERO {
            return Err(EngineError::validation(format!(
                "amount must be non-negative, got {}",
                amount
            )));
        }
        conn.execute(
            "UPDATE transactions SET amount=?1 WHERE id=?2",
            params![amount.to_string(), id],
        )?;
    }
    if let Some(kind) = patch.kind {
        conn.execute("UPDATE transactions SET kind=?1 WHERE id=?2", params![kind, id])?;
    }
    if let Some(ref category) = patch.category {
        conn.execute(
            "UPDATE transactions SET category=?1 WHERE id=?2",
            params![category, id],
        )?;
    }
    if let Some(date) = patch.date {
        conn.execute("UPDATE transactions SET date=?1 WHERE id=?2", params![date, id])?;
    }
    if let Some(ref description) = patch.description {
        conn.execute(
            "UPDATE transactions SET description=?1 WHERE id=?2",
            params![description, id],
        )?;
    }
    get(conn, user_id, id)
}

pub fn delete(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    get(conn, user_id, id)?;
    conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(())
}

pub fn list(
    conn: &Connection,
    user_id: i64,
    filter: &RecordFilter,
) -> EngineResult<Vec<LedgerRecord>> {
    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id=?1",
        COLUMNS
    );
    let mut args: Vec<String> = Vec::new();
    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind=?");
        args.push(kind.as_str().to_string());
    }
    if let Some(ref category) = filter.category {
        sql.push_str(" AND category=?");
        args.push(category.clone());
    }
    if let Some(ref month) = filter.month {
        sql.push_str(" AND substr(date,1,7)=?");
        args.push(month.clone());
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        args.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut params_vec: Vec<&dyn rusqlite::ToSql> = vec![&user_id];
    for a in &args {
        params_vec.push(a);
    }
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(record_from_row(r)?);
    }
    Ok(data)
}

/// Sum of expense amounts for one owner and category inside a date window.
/// An absent upper bound means the window is open-ended.
pub fn sum_expenses(
    conn: &Connection,
    user_id: i64,
    category: &str,
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> EngineResult<Decimal> {
    let mut sql = String::from(
        "SELECT amount FROM transactions
         WHERE user_id=?1 AND category=?2 AND kind='expense' AND date>=?3",
    );
    if to.is_some() {
        sql.push_str(" AND date<=?4");
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match to {
        Some(to) => stmt.query(params![user_id, category, from, to])?,
        None => stmt.query(params![user_id, category, from])?,
    };
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        total += decimal_from_sql(0, &s)?;
    }
    Ok(total)
}

/// Most recent records in a category carrying the given tag, newest first.
/// Used to surface a goal's recent contributions.
pub fn recent_tagged(
    conn: &Connection,
    user_id: i64,
    category: &str,
    tag: &str,
    limit: usize,
) -> EngineResult<Vec<LedgerRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM transactions
         WHERE user_id=?1 AND category=?2 AND tags LIKE ?3
         ORDER BY date DESC, id DESC LIMIT ?4",
        COLUMNS
    ))?;
    let pattern = format!("%\"{}\"%", tag);
    let mut rows = stmt.query(params![user_id, category, pattern, limit as i64])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(record_from_row(r)?);
    }
    Ok(data)
}
