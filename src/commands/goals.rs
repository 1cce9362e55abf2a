// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::goal::{self, GoalUpdate, NewGoal, CONTRIBUTION_CATEGORY};
use crate::ledger;
use crate::models::{AutoAllocate, Goal, LedgerRecord};
use crate::response::ApiResponse;
use crate::utils::{fmt_money, lookup_user, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
struct GoalWithProgress {
    #[serde(flatten)]
    goal: Goal,
    progress_percentage: Decimal,
    monthly_savings_needed: Option<Decimal>,
}

#[derive(Serialize)]
struct GoalDetail {
    #[serde(flatten)]
    goal: GoalWithProgress,
    recent_contributions: Vec<LedgerRecord>,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("contribute", sub)) => contribute(conn, sub)?,
        Some(("auto-allocate", sub)) => auto_allocate(conn, sub)?,
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
    let auto_allocate = AutoAllocate {
        enabled: sub.get_flag("auto"),
        percentage: sub
            .get_one::<String>("auto-percent")
            .map(|s| parse_decimal(s))
            .transpose()?
            .unwrap_or(Decimal::ZERO),
        fixed_amount: sub
            .get_one::<String>("auto-fixed")
            .map(|s| parse_decimal(s))
            .transpose()?
            .unwrap_or(Decimal::ZERO),
    };
    let goal = goal::create(
        conn,
        user.id,
        &NewGoal {
            name: sub.get_one::<String>("name").unwrap(),
            target_amount: parse_decimal(sub.get_one::<String>("target").unwrap())?,
            target_date: sub
                .get_one::<String>("target-date")
                .map(|s| parse_date(s))
                .transpose()?,
            category: sub.get_one::<String>("category").unwrap(),
            priority: sub.get_one::<String>("priority").unwrap().parse()?,
            auto_allocate,
            start_date,
        },
    )?;
    println!(
        "Created goal '{}' targeting {} (id {})",
        goal.name, goal.target_amount, goal.id
    );
    Ok(())
}

fn with_progress(goal: Goal, today: chrono::NaiveDate) -> GoalWithProgress {
    let p = goal::progress(&goal, today);
    GoalWithProgress {
        goal,
        progress_percentage: p.progress_percentage,
        monthly_savings_needed: p.monthly_savings_needed,
    }
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let today = chrono::Local::now().date_naive();
    let goals: Vec<GoalWithProgress> = goal::list(conn, user.id)?
        .into_iter()
        .map(|g| with_progress(g, today))
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&goals))? {
        let rows = goals
            .iter()
            .map(|g| {
                vec![
                    g.goal.id.to_string(),
                    g.goal.name.clone(),
                    g.goal.category.clone(),
                    fmt_money(&g.goal.target_amount),
                    fmt_money(&g.goal.current_amount),
                    format!("{}%", g.progress_percentage),
                    g.monthly_savings_needed
                        .map(|m| fmt_money(&m))
                        .unwrap_or_else(|| "-".to_string()),
                    if g.goal.is_completed { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Category", "Target", "Current", "Progress", "Monthly needed", "Done"],
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
    let today = chrono::Local::now().date_naive();
    let goal = goal::get(conn, user.id, id)?;
    let recent_contributions =
        ledger::recent_tagged(conn, user.id, CONTRIBUTION_CATEGORY, &goal.id.to_string(), 5)?;
    let detail = GoalDetail {
        goal: with_progress(goal, today),
        recent_contributions,
    };
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&detail))? {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    }
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = GoalUpdate {
        name: sub.get_one::<String>("name").map(|s| s.to_string()),
        target_amount: sub
            .get_one::<String>("target")
            .map(|s| parse_decimal(s))
            .transpose()?,
        current_amount: sub
            .get_one::<String>("current")
            .map(|s| parse_decimal(s))
            .transpose()?,
        target_date: sub
            .get_one::<String>("target-date")
            .map(|s| parse_date(s))
            .transpose()?,
        category: sub.get_one::<String>("category").map(|s| s.to_string()),
        priority: sub
            .get_one::<String>("priority")
            .map(|s| s.parse())
            .transpose()?,
        auto_enabled: sub
            .get_one::<String>("auto")
            .map(|s| s.parse::<bool>())
            .transpose()?,
        auto_percentage: sub
            .get_one::<String>("auto-percent")
            .map(|s| parse_decimal(s))
            .transpose()?,
        auto_fixed_amount: sub
            .get_one::<String>("auto-fixed")
            .map(|s| parse_decimal(s))
            .transpose()?,
    };
    let goal = goal::update(conn, user.id, id, &patch)?;
    println!("Updated goal '{}' (id {})", goal.name, goal.id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    goal::delete(conn, user.id, id)?;
    println!("Deleted goal {}", id);
    Ok(())
}

fn contribute(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let date = sub
        .get_one::<String>("date")
        .map(|s| parse_date(s))
        .transpose()?;
    let today = chrono::Local::now().date_naive();
    let outcome = goal::contribute(conn, user.id, id, amount, date, today)?;
    if !maybe_print_json(
        json_flag,
        jsonl_flag,
        &ApiResponse::ok_with_message(&outcome, "Contribution added successfully"),
    )? {
        println!(
            "Contributed {} to '{}' ({}% complete)",
            amount, outcome.goal.name, outcome.progress_percentage
        );
        if outcome.goal.is_completed {
            println!("Goal '{}' is complete!", outcome.goal.name);
        }
    }
    Ok(())
}

fn auto_allocate(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let today = chrono::Local::now().date_naive();
    let report = goal::process_auto_allocations(conn, user.id, amount, today)?;
    if !maybe_print_json(
        json_flag,
        jsonl_flag,
        &ApiResponse::ok_with_message(&report, "Auto-allocations processed successfully"),
    )? {
        let rows = report
            .allocations
            .iter()
            .map(|a| {
                vec![
                    a.goal_id.to_string(),
                    a.goal_name.clone(),
                    fmt_money(&a.amount),
                    format!("{}%", a.progress_percentage),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Goal", "Name", "Allocated", "Progress"], rows)
        );
        println!(
            "Allocated {} of {} ({} remaining)",
            fmt_money(&report.total_allocated),
            fmt_money(&amount),
            fmt_money(&report.remaining_amount)
        );
    }
    Ok(())
}
