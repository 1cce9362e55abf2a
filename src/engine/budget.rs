// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget accounting engine: derives spend-to-date and status for a budget
//! by aggregating matching ledger expenses over its period window, then
//! writes the fresh aggregate back onto the stored `spent` cache.

use crate::errors::{EngineError, EngineResult};
use crate::ledger;
use crate::models::{Budget, Period};
use crate::utils::{decimal_from_sql, fmt_money, month_bounds};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

const COLUMNS: &str = "id, user_id, name, amount, spent, period, category, start_date, \
                       end_date, notification_threshold, is_active";

pub struct NewBudget<'a> {
    pub name: &'a str,
    pub amount: Decimal,
    pub period: Period,
    pub category: &'a str,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notification_threshold: Option<u32>,
}

#[derive(Default)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub period: Option<Period>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notification_threshold: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Normal,
    Warning,
    Exceeded,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Normal => "normal",
            StatusLevel::Warning => "warning",
            StatusLevel::Exceeded => "exceeded",
        }
    }
}

/// Derived view of one budget. `percentage_used` is None when the budget
/// amount is zero: the ratio is undefined and the status is pinned to
/// exceeded.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub budget_id: i64,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Option<Decimal>,
    pub status: StatusLevel,
    pub notification: Option<String>,
}

fn budget_from_row(r: &Row) -> rusqlite::Result<Budget> {
    let amount: String = r.get(3)?;
    let spent: String = r.get(4)?;
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        amount: decimal_from_sql(3, &amount)?,
        spent: decimal_from_sql(4, &spent)?,
        period: r.get(5)?,
        category: r.get(6)?,
        start_date: r.get(7)?,
        end_date: r.get(8)?,
        notification_threshold: r.get(9)?,
        is_active: r.get(10)?,
    })
}

fn validate(amount: Decimal, period: Period, end_date: Option<NaiveDate>, threshold: u32) -> EngineResult<()> {
    if amount < Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "budget amount must be non-negative, got {}",
            amount
        )));
    }
    if period == Period::Custom && end_date.is_none() {
        return Err(EngineError::validation(
            "custom-period budgets require an end date",
        ));
    }
    if !(1..=100).contains(&threshold) {
        return Err(EngineError::validation(format!(
            "notification threshold must be between 1 and 100, got {}",
            threshold
        )));
    }
    Ok(())
}

pub fn create(conn: &Connection, user_id: i64, new: &NewBudget) -> EngineResult<Budget> {
    let threshold = new.notification_threshold.unwrap_or(80);
    validate(new.amount, new.period, new.end_date, threshold)?;
    conn.execute(
        "INSERT INTO budgets(user_id, name, amount, period, category, start_date, end_date,
                             notification_threshold)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user_id,
            new.name,
            new.amount.to_string(),
            new.period,
            new.category,
            new.start_date,
            new.end_date,
            threshold,
        ],
    )?;
    get(conn, user_id, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, user_id: i64, id: i64) -> EngineResult<Budget> {
    let budget = conn
        .query_row(
            &format!("SELECT {} FROM budgets WHERE id=?1", COLUMNS),
            params![id],
            budget_from_row,
        )
        .optional()?
        .ok_or_else(|| EngineError::not_found("budget", id))?;
    if budget.user_id != user_id {
        return Err(EngineError::forbidden("budget", id));
    }
    Ok(budget)
}

pub fn list(conn: &Connection, user_id: i64) -> EngineResult<Vec<Budget>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM budgets WHERE user_id=?1 ORDER BY id",
        COLUMNS
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(budget_from_row(r)?);
    }
    Ok(data)
}

pub(crate) fn list_all(conn: &Connection) -> EngineResult<Vec<Budget>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM budgets ORDER BY id", COLUMNS))?;
    let mut rows = stmt.query([])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(budget_from_row(r)?);
    }
    Ok(data)
}

pub fn update(
    conn: &Connection,
    user_id: i64,
    id: i64,
    patch: &BudgetUpdate,
) -> EngineResult<Budget> {
    let current = get(conn, user_id, id)?;
    let amount = patch.amount.unwrap_or(current.amount);
    let period = patch.period.unwrap_or(current.period);
    let end_date = patch.end_date.or(current.end_date);
    let threshold = patch
        .notification_threshold
        .unwrap_or(current.notification_threshold);
    validate(amount, period, end_date, threshold)?;
    conn.execute(
        "UPDATE budgets SET name=?1, amount=?2, period=?3, category=?4, start_date=?5,
                            end_date=?6, notification_threshold=?7, is_active=?8
         WHERE id=?9",
        params![
            patch.name.as_deref().unwrap_or(&current.name),
            amount.to_string(),
            period,
            patch.category.as_deref().unwrap_or(&current.category),
            patch.start_date.unwrap_or(current.start_date),
            end_date,
            threshold,
            patch.is_active.unwrap_or(current.is_active),
            id,
        ],
    )?;
    get(conn, user_id, id)
}

pub fn delete(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    get(conn, user_id, id)?;
    conn.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
    Ok(())
}

/// Matching window for a budget. Monthly budgets always track the current
/// calendar month, not the stored dates; yearly and custom budgets use the
/// stored range verbatim (an absent end date leaves the window open).
pub(crate) fn period_window(budget: &Budget, today: NaiveDate) -> (NaiveDate, Option<NaiveDate>) {
    match budget.period {
        Period::Monthly => {
            let (first, last) = month_bounds(today);
            (first, Some(last))
        }
        Period::Yearly | Period::Custom => (budget.start_date, budget.end_date),
    }
}

pub fn derive_status(
    conn: &Connection,
    user_id: i64,
    budget_id: i64,
    today: NaiveDate,
) -> EngineResult<BudgetStatus> {
    let budget = get(conn, user_id, budget_id)?;
    status_with_writeback(conn, &budget, today)
}

/// Same derivation for every active budget the user owns, in stored order.
pub fn derive_all_statuses(
    conn: &Connection,
    user_id: i64,
    today: NaiveDate,
) -> EngineResult<Vec<BudgetStatus>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM budgets WHERE user_id=?1 AND is_active=1 ORDER BY id",
        COLUMNS
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    let mut statuses = Vec::new();
    while let Some(r) = rows.next()? {
        let budget = budget_from_row(r)?;
        statuses.push(status_with_writeback(conn, &budget, today)?);
    }
    Ok(statuses)
}

fn status_with_writeback(
    conn: &Connection,
    budget: &Budget,
    today: NaiveDate,
) -> EngineResult<BudgetStatus> {
    let (from, to) = period_window(budget, today);
    let spent = ledger::sum_expenses(conn, budget.user_id, &budget.category, from, to)?;

    // Write-through refresh of the spent cache; the only mutation this
    // read-style operation performs.
    conn.execute(
        "UPDATE budgets SET spent=?1 WHERE id=?2",
        params![spent.to_string(), budget.id],
    )?;
    tracing::debug!(budget_id = budget.id, spent = %spent, "refreshed spent cache");

    let remaining = budget.amount - spent;
    let hundred = Decimal::from(100);

    if budget.amount.is_zero() {
        // Zero-ceiling budget: the percentage is undefined, so the status
        // is pinned to exceeded with no finite percentage.
        return Ok(BudgetStatus {
            budget_id: budget.id,
            name: budget.name.clone(),
            category: budget.category.clone(),
            amount: budget.amount,
            spent,
            remaining,
            percentage_used: None,
            status: StatusLevel::Exceeded,
            notification: Some(format!(
                "Your '{}' budget has no amount set; any spending exceeds it",
                budget.name
            )),
        });
    }

    let percentage_used = hundred * spent / budget.amount;
    let threshold = Decimal::from(budget.notification_threshold);
    let (status, notification) = if percentage_used >= hundred {
        (
            StatusLevel::Exceeded,
            Some(format!(
                "You have exceeded your '{}' budget by {}",
                budget.name,
                fmt_money(&(spent - budget.amount))
            )),
        )
    } else if percentage_used >= threshold {
        (
            StatusLevel::Warning,
            Some(format!(
                "You have used {}% of your '{}' budget",
                percentage_used.round_dp(2),
                budget.name
            )),
        )
    } else {
        (StatusLevel::Normal, None)
    };

    Ok(BudgetStatus {
        budget_id: budget.id,
        name: budget.name.clone(),
        category: budget.category.clone(),
        amount: budget.amount,
        spent,
        remaining,
        percentage_used: Some(percentage_used),
        status,
        notification,
    })
}
