// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only rollups over the ledger store for the user and admin views.
//! Consumes the budget engine's derived statuses; nothing here mutates
//! state beyond the engine's own spent-cache refresh.

use crate::engine::budget::{self, BudgetStatus};
use crate::engine::goal;
use crate::errors::EngineResult;
use crate::ledger::{self, RecordFilter};
use crate::models::{LedgerRecord, RecordKind, Role};
use crate::utils::decimal_from_sql;
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub monthly_income: Decimal,
    pub monthly_expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct GoalSummary {
    pub goal_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub summary: Summary,
    pub recent_transactions: Vec<LedgerRecord>,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub budgets: Vec<BudgetStatus>,
    pub goals: Vec<GoalSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub new_users: i64,
    pub active_users: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub recent_transactions: i64,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub top_categories: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct FeatureStats {
    pub total_budgets: i64,
    pub total_goals: i64,
}

#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub username: String,
    pub email: Option<String>,
    pub last_login: Option<String>,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub user_stats: UserStats,
    pub transaction_stats: TransactionStats,
    pub feature_stats: FeatureStats,
    pub recent_activity: Vec<ActivityEntry>,
}

fn top_categories(rows: Vec<(String, Decimal)>, limit: usize) -> Vec<CategoryTotal> {
    let mut agg: HashMap<String, (Decimal, i64)> = HashMap::new();
    for (category, amount) in rows {
        let entry = agg.entry(category).or_insert((Decimal::ZERO, 0));
        entry.0 += amount;
        entry.1 += 1;
    }
    let mut items: Vec<CategoryTotal> = agg
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total));
    items.truncate(limit);
    items
}

pub fn user_dashboard(
    conn: &Connection,
    user_id: i64,
    today: NaiveDate,
) -> EngineResult<UserDashboard> {
    let window_start = today - Duration::days(30);

    let mut stmt = conn.prepare(
        "SELECT kind, amount, category FROM transactions WHERE user_id=?1 AND date>=?2",
    )?;
    let mut rows = stmt.query(params![user_id, window_start])?;
    let mut monthly_income = Decimal::ZERO;
    let mut monthly_expense = Decimal::ZERO;
    let mut expense_rows = Vec::new();
    while let Some(r) = rows.next()? {
        let kind: RecordKind = r.get(0)?;
        let amount: String = r.get(1)?;
        let category: String = r.get(2)?;
        let amount = decimal_from_sql(1, &amount)?;
        match kind {
            RecordKind::Income => monthly_income += amount,
            RecordKind::Expense => {
                monthly_expense += amount;
                expense_rows.push((category, amount));
            }
        }
    }

    let recent_transactions = ledger::list(
        conn,
        user_id,
        &RecordFilter {
            limit: Some(5),
            ..Default::default()
        },
    )?;

    let budgets = budget::derive_all_statuses(conn, user_id, today)?;

    let goals = goal::list(conn, user_id)?
        .into_iter()
        .filter(|g| !g.is_completed)
        .map(|g| GoalSummary {
            goal_id: g.id,
            name: g.name,
            target_amount: g.target_amount,
            current_amount: g.current_amount,
            remaining: g.target_amount - g.current_amount,
            percentage: (Decimal::from(100) * g.current_amount / g.target_amount).round_dp(2),
            target_date: g.target_date,
        })
        .collect();

    Ok(UserDashboard {
        summary: Summary {
            monthly_income,
            monthly_expense,
            balance: monthly_income - monthly_expense,
        },
        recent_transactions,
        expenses_by_category: top_categories(expense_rows, 5),
        budgets,
        goals,
    })
}

pub fn admin_dashboard(conn: &Connection, today: NaiveDate) -> EngineResult<AdminDashboard> {
    let thirty_days_ago = today - Duration::days(30);
    let seven_days_ago = today - Duration::days(7);

    let count = |sql: &str, args: &[&dyn rusqlite::ToSql]| -> rusqlite::Result<i64> {
        conn.query_row(sql, args, |r| r.get(0))
    };

    let total_users = count("SELECT COUNT(*) FROM users", &[])?;
    let new_users = count(
        "SELECT COUNT(*) FROM users WHERE created_at>=?1",
        &[&thirty_days_ago],
    )?;
    let active_users = count(
        "SELECT COUNT(*) FROM users WHERE last_login>=?1",
        &[&seven_days_ago],
    )?;

    let total_transactions = count("SELECT COUNT(*) FROM transactions", &[])?;
    let recent_transactions = count(
        "SELECT COUNT(*) FROM transactions WHERE date>=?1",
        &[&thirty_days_ago],
    )?;

    let mut stmt = conn.prepare("SELECT kind, amount, category FROM transactions")?;
    let mut rows = stmt.query([])?;
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut category_rows = Vec::new();
    while let Some(r) = rows.next()? {
        let kind: RecordKind = r.get(0)?;
        let amount: String = r.get(1)?;
        let category: String = r.get(2)?;
        let amount = decimal_from_sql(1, &amount)?;
        match kind {
            RecordKind::Income => total_income += amount,
            RecordKind::Expense => total_expenses += amount,
        }
        category_rows.push((category, amount));
    }

    let total_budgets = count("SELECT COUNT(*) FROM budgets", &[])?;
    let total_goals = count("SELECT COUNT(*) FROM goals", &[])?;

    let mut stmt = conn.prepare(
        "SELECT username, email, last_login, role FROM users ORDER BY last_login DESC LIMIT 10",
    )?;
    let mut rows = stmt.query([])?;
    let mut recent_activity = Vec::new();
    while let Some(r) = rows.next()? {
        recent_activity.push(ActivityEntry {
            username: r.get(0)?,
            email: r.get(1)?,
            last_login: r.get(2)?,
            role: r.get(3)?,
        });
    }

    Ok(AdminDashboard {
        user_stats: UserStats {
            total_users,
            new_users,
            active_users,
        },
        transaction_stats: TransactionStats {
            total_transactions,
            recent_transactions,
            total_income,
            total_expenses,
            top_categories: top_categories(category_rows, 5),
        },
        feature_stats: FeatureStats {
            total_budgets,
            total_goals,
        },
        recent_activity,
    })
}
