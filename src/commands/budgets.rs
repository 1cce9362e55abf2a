// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::budget::{self, BudgetStatus, BudgetUpdate, NewBudget};
use crate::response::ApiResponse;
use crate::utils::{fmt_money, lookup_user, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        Some(("statuses", sub)) => statuses(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let start_date = match sub.get_one::<String>("start") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let budget = budget::create(
        conn,
        user.id,
        &NewBudget {
            name: sub.get_one::<String>("name").unwrap(),
            amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
            period: sub.get_one::<String>("period").unwrap().parse()?,
            category: sub.get_one::<String>("category").unwrap(),
            start_date,
            end_date: sub
                .get_one::<String>("end")
                .map(|s| parse_date(s))
                .transpose()?,
            notification_threshold: sub.get_one::<u32>("threshold").copied(),
        },
    )?;
    println!(
        "Created budget '{}' for '{}' ({} {}, id {})",
        budget.name,
        budget.category,
        budget.period.as_str(),
        budget.amount,
        budget.id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let budgets = budget::list(conn, user.id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&budgets))? {
        let rows = budgets
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.name.clone(),
                    b.category.clone(),
                    b.period.as_str().to_string(),
                    fmt_money(&b.amount),
                    fmt_money(&b.spent),
                    format!("{}%", b.notification_threshold),
                    if b.is_active { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Category", "Period", "Amount", "Spent", "Threshold", "Active"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let budget = budget::get(conn, user.id, id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&budget))? {
        println!("{}", serde_json::to_string_pretty(&budget)?);
    }
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = BudgetUpdate {
        name: sub.get_one::<String>("name").map(|s| s.to_string()),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        period: sub
            .get_one::<String>("period")
            .map(|s| s.parse())
            .transpose()?,
        category: sub.get_one::<String>("category").map(|s| s.to_string()),
        start_date: sub
            .get_one::<String>("start")
            .map(|s| parse_date(s))
            .transpose()?,
        end_date: sub
            .get_one::<String>("end")
            .map(|s| parse_date(s))
            .transpose()?,
        notification_threshold: sub.get_one::<u32>("threshold").copied(),
        is_active: sub
            .get_one::<String>("active")
            .map(|s| s.parse::<bool>())
            .transpose()?,
    };
    let budget = budget::update(conn, user.id, id, &patch)?;
    println!("Updated budget '{}' (id {})", budget.name, budget.id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    budget::delete(conn, user.id, id)?;
    println!("Deleted budget {}", id);
    Ok(())
}

fn status_rows(statuses: &[BudgetStatus]) -> Vec<Vec<String>> {
    statuses
        .iter()
        .map(|s| {
            vec![
                s.budget_id.to_string(),
                s.name.clone(),
                s.category.clone(),
                fmt_money(&s.amount),
                fmt_money(&s.spent),
                fmt_money(&s.remaining),
                s.percentage_used
                    .map(|p| format!("{}%", p.round_dp(2)))
                    .unwrap_or_else(|| "-".to_string()),
                s.status.as_str().to_string(),
            ]
        })
        .collect()
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = chrono::Local::now().date_naive();
    let st = budget::derive_status(conn, user.id, id, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&st))? {
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Category", "Amount", "Spent", "Remaining", "Used", "Status"],
                status_rows(std::slice::from_ref(&st))
            )
        );
        if let Some(ref note) = st.notification {
            println!("{}", note);
        }
    }
    Ok(())
}

fn statuses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let today = chrono::Local::now().date_naive();
    let statuses = budget::derive_all_statuses(conn, user.id, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&statuses))? {
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Category", "Amount", "Spent", "Remaining", "Used", "Status"],
                status_rows(&statuses)
            )
        );
        for st in &statuses {
            if let Some(ref note) = st.notification {
                println!("{}", note);
            }
        }
    }
    Ok(())
}
