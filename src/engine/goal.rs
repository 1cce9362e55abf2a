// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Goal progress and allocation engine. Every contribution also lands in
//! the ledger as an expense in the `goal-contribution` category, tagged
//! with the goal id, so ledger sums stay consistent with cash flow.

use crate::errors::{EngineError, EngineResult};
use crate::ledger::{self, NewRecord};
use crate::models::{AutoAllocate, Goal, LedgerRecord, Priority, RecordKind};
use crate::utils::{decimal_from_sql, months_until};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

pub const CONTRIBUTION_CATEGORY: &str = "goal-contribution";

const COLUMNS: &str = "id, user_id, name, target_amount, current_amount, target_date, category, \
                       priority, auto_enabled, auto_percentage, auto_fixed_amount, is_completed, \
                       start_date";

pub struct NewGoal<'a> {
    pub name: &'a str,
    pub target_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    pub category: &'a str,
    pub priority: Priority,
    pub auto_allocate: AutoAllocate,
    pub start_date: NaiveDate,
}

#[derive(Default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
    pub target_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub auto_enabled: Option<bool>,
    pub auto_percentage: Option<Decimal>,
    pub auto_fixed_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub progress_percentage: Decimal,
    pub monthly_savings_needed: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct Contribution {
    pub goal: Goal,
    pub record: LedgerRecord,
    pub progress_percentage: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Allocation {
    pub goal_id: i64,
    pub goal_name: String,
    pub amount: Decimal,
    pub record_id: i64,
    pub progress_percentage: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AllocationReport {
    pub total_allocated: Decimal,
    pub allocations: Vec<Allocation>,
    pub remaining_amount: Decimal,
}

fn goal_from_row(r: &Row) -> rusqlite::Result<Goal> {
    let target: String = r.get(3)?;
    let current: String = r.get(4)?;
    let percentage: String = r.get(9)?;
    let fixed: String = r.get(10)?;
    Ok(Goal {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        target_amount: decimal_from_sql(3, &target)?,
        current_amount: decimal_from_sql(4, &current)?,
        target_date: r.get(5)?,
        category: r.get(6)?,
        priority: r.get(7)?,
        auto_allocate: AutoAllocate {
            enabled: r.get(8)?,
            percentage: decimal_from_sql(9, &percentage)?,
            fixed_amount: decimal_from_sql(10, &fixed)?,
        },
        is_completed: r.get(11)?,
        start_date: r.get(12)?,
    })
}

fn validate(target_amount: Decimal, rules: &AutoAllocate) -> EngineResult<()> {
    if target_amount <= Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "target amount must be positive, got {}",
            target_amount
        )));
    }
    if rules.percentage < Decimal::ZERO || rules.percentage > Decimal::from(100) {
        return Err(EngineError::validation(format!(
            "allocation percentage must be between 0 and 100, got {}",
            rules.percentage
        )));
    }
    if rules.fixed_amount < Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "fixed allocation amount must be non-negative, got {}",
            rules.fixed_amount
        )));
    }
    Ok(())
}

pub fn create(conn: &Connection, user_id: i64, new: &NewGoal) -> EngineResult<Goal> {
    validate(new.target_amount, &new.auto_allocate)?;
    conn.execute(
        "INSERT INTO goals(user_id, name, target_amount, target_date, category, priority,
                           auto_enabled, auto_percentage, auto_fixed_amount, start_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user_id,
            new.name,
            new.target_amount.to_string(),
            new.target_date,
            new.category,
            new.priority,
            new.auto_allocate.enabled,
            new.auto_allocate.percentage.to_string(),
            new.auto_allocate.fixed_amount.to_string(),
            new.start_date,
        ],
    )?;
    get(conn, user_id, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, user_id: i64, id: i64) -> EngineResult<Goal> {
    let goal = conn
        .query_row(
            &format!("SELECT {} FROM goals WHERE id=?1", COLUMNS),
            params![id],
            goal_from_row,
        )
        .optional()?
        .ok_or_else(|| EngineError::not_found("goal", id))?;
    if goal.user_id != user_id {
        return Err(EngineError::forbidden("goal", id));
    }
    Ok(goal)
}

pub fn list(conn: &Connection, user_id: i64) -> EngineResult<Vec<Goal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM goals WHERE user_id=?1 ORDER BY id",
        COLUMNS
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(goal_from_row(r)?);
    }
    Ok(data)
}

pub fn update(conn: &Connection, user_id: i64, id: i64, patch: &GoalUpdate) -> EngineResult<Goal> {
    let current = get(conn, user_id, id)?;
    let target_amount = patch.target_amount.unwrap_or(current.target_amount);
    let rules = AutoAllocate {
        enabled: patch.auto_enabled.unwrap_or(current.auto_allocate.enabled),
        percentage: patch
            .auto_percentage
            .unwrap_or(current.auto_allocate.percentage),
        fixed_amount: patch
            .auto_fixed_amount
            .unwrap_or(current.auto_allocate.fixed_amount),
    };
    validate(target_amount, &rules)?;
    let current_amount = patch.current_amount.unwrap_or(current.current_amount);
    // The completion latch may be set by an edit that reaches the target,
    // but an edit below target never clears it.
    let is_completed = current.is_completed || current_amount >= target_amount;
    conn.execute(
        "UPDATE goals SET name=?1, target_amount=?2, current_amount=?3, target_date=?4,
                          category=?5, priority=?6, auto_enabled=?7, auto_percentage=?8,
                          auto_fixed_amount=?9, is_completed=?10
         WHERE id=?11",
        params![
            patch.name.as_deref().unwrap_or(&current.name),
            target_amount.to_string(),
            current_amount.to_string(),
            patch.target_date.or(current.target_date),
            patch.category.as_deref().unwrap_or(&current.category),
            patch.priority.unwrap_or(current.priority),
            rules.enabled,
            rules.percentage.to_string(),
            rules.fixed_amount.to_string(),
            is_completed,
            id,
        ],
    )?;
    get(conn, user_id, id)
}

pub fn delete(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    get(conn, user_id, id)?;
    conn.execute("DELETE FROM goals WHERE id=?1", params![id])?;
    Ok(())
}

/// Completion percentage (2dp) and, when a target date lies in a future
/// month, the monthly savings needed to land on time. Month distance is
/// whole-month granularity; a deadline in the current or a past month
/// produces no forward-looking figure.
pub fn progress(goal: &Goal, today: NaiveDate) -> GoalProgress {
    let progress_percentage =
        (Decimal::from(100) * goal.current_amount / goal.target_amount).round_dp(2);
    let monthly_savings_needed = goal.target_date.and_then(|target| {
        let months = months_until(today, target);
        if months > 0 {
            Some(((goal.target_amount - goal.current_amount) / Decimal::from(months)).round_dp(2))
        } else {
            None
        }
    });
    GoalProgress {
        progress_percentage,
        monthly_savings_needed,
    }
}

pub fn contribute(
    conn: &Connection,
    user_id: i64,
    goal_id: i64,
    amount: Decimal,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> EngineResult<Contribution> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "contribution amount must be positive, got {}",
            amount
        )));
    }
    let goal = get(conn, user_id, goal_id)?;
    let description = format!("Contribution to {}", goal.name);
    let (goal, record) = apply_contribution(conn, goal, amount, date.unwrap_or(today), description)?;
    let progress_percentage = progress(&goal, today).progress_percentage;
    Ok(Contribution {
        goal,
        record,
        progress_percentage,
    })
}

/// Distribute an income amount across the user's incomplete goals with
/// auto-allocation enabled, in stored order. A percentage rule takes
/// precedence over a fixed amount; goals whose rule yields nothing are
/// skipped untouched. Each goal's update is independently durable: a
/// failure partway through leaves earlier allocations in place.
pub fn process_auto_allocations(
    conn: &Connection,
    user_id: i64,
    income_amount: Decimal,
    today: NaiveDate,
) -> EngineResult<AllocationReport> {
    if income_amount <= Decimal::ZERO {
        return Err(EngineError::validation(format!(
            "income amount must be positive, got {}",
            income_amount
        )));
    }

    // Stored order; the priority field is not consulted here.
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM goals WHERE user_id=?1 AND is_completed=0 AND auto_enabled=1 ORDER BY id",
        COLUMNS
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    let mut goals = Vec::new();
    while let Some(r) = rows.next()? {
        goals.push(goal_from_row(r)?);
    }

    let mut allocations = Vec::new();
    let mut total_allocated = Decimal::ZERO;
    for goal in goals {
        let amount = if goal.auto_allocate.percentage > Decimal::ZERO {
            income_amount * goal.auto_allocate.percentage / Decimal::from(100)
        } else if goal.auto_allocate.fixed_amount > Decimal::ZERO {
            goal.auto_allocate.fixed_amount
        } else {
            Decimal::ZERO
        };
        if amount <= Decimal::ZERO {
            continue;
        }
        let description = format!("Auto-allocation to {}", goal.name);
        let (goal, record) = apply_contribution(conn, goal, amount, today, description)?;
        total_allocated += amount;
        let progress_percentage = progress(&goal, today).progress_percentage;
        allocations.push(Allocation {
            goal_id: goal.id,
            goal_name: goal.name,
            amount,
            record_id: record.id,
            progress_percentage,
        });
    }

    tracing::info!(
        user_id,
        total = %total_allocated,
        goals = allocations.len(),
        "processed auto-allocations"
    );
    // remaining may go negative when rules over-commit the income; the
    // caller decides what to do about that.
    Ok(AllocationReport {
        total_allocated,
        allocations,
        remaining_amount: income_amount - total_allocated,
    })
}

fn apply_contribution(
    conn: &Connection,
    mut goal: Goal,
    amount: Decimal,
    date: NaiveDate,
    description: String,
) -> EngineResult<(Goal, LedgerRecord)> {
    goal.current_amount += amount;
    if goal.current_amount >= goal.target_amount {
        goal.is_completed = true;
    }
    conn.execute(
        "UPDATE goals SET current_amount=?1, is_completed=?2 WHERE id=?3",
        params![goal.current_amount.to_string(), goal.is_completed, goal.id],
    )?;
    let record = ledger::insert(
        conn,
        goal.user_id,
        &NewRecord {
            kind: RecordKind::Expense,
            amount,
            category: CONTRIBUTION_CATEGORY,
            tags: vec![goal.id.to_string()],
            date,
            description: Some(description),
            recurrence: None,
        },
    )?;
    tracing::debug!(goal_id = goal.id, amount = %amount, "recorded contribution");
    Ok((goal, record))
}
