// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dashboard::{admin_dashboard, user_dashboard};
use crate::models::Role;
use crate::response::ApiResponse;
use crate::utils::{fmt_money, lookup_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let user = lookup_user(conn, m.get_one::<String>("user").unwrap())?;
    let today = chrono::Local::now().date_naive();

    // The authenticated role picks the view.
    match user.role {
        Role::Admin => {
            let dash = admin_dashboard(conn, today)?;
            if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&dash))? {
                println!(
                    "Users: {} total, {} new (30d), {} active (7d)",
                    dash.user_stats.total_users,
                    dash.user_stats.new_users,
                    dash.user_stats.active_users
                );
                println!(
                    "Transactions: {} total, {} in last 30d ({} income / {} expense)",
                    dash.transaction_stats.total_transactions,
                    dash.transaction_stats.recent_transactions,
                    fmt_money(&dash.transaction_stats.total_income),
                    fmt_money(&dash.transaction_stats.total_expenses)
                );
                println!(
                    "Budgets: {}, Goals: {}",
                    dash.feature_stats.total_budgets, dash.feature_stats.total_goals
                );
                let rows = dash
                    .transaction_stats
                    .top_categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.category.clone(),
                            c.count.to_string(),
                            fmt_money(&c.total),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Count", "Total"], rows));
            }
        }
        Role::User => {
            let dash = user_dashboard(conn, user.id, today)?;
            if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&dash))? {
                println!(
                    "Last 30 days: income {}, expense {}, balance {}",
                    fmt_money(&dash.summary.monthly_income),
                    fmt_money(&dash.summary.monthly_expense),
                    fmt_money(&dash.summary.balance)
                );
                let rows = dash
                    .expenses_by_category
                    .iter()
                    .map(|c| vec![c.category.clone(), fmt_money(&c.total)])
                    .collect();
                println!("{}", pretty_table(&["Top category", "Spent"], rows));
                let rows = dash
                    .budgets
                    .iter()
                    .map(|b| {
                        vec![
                            b.name.clone(),
                            fmt_money(&b.amount),
                            fmt_money(&b.spent),
                            b.status.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Budget", "Amount", "Spent", "Status"], rows));
                let rows = dash
                    .goals
                    .iter()
                    .map(|g| {
                        vec![
                            g.name.clone(),
                            fmt_money(&g.target_amount),
                            fmt_money(&g.current_amount),
                            format!("{}%", g.percentage),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Goal", "Target", "Current", "Progress"], rows));
            }
        }
    }
    Ok(())
}
