// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, NewRecord, RecordFilter, RecordUpdate};
use crate::models::{Recurrence, RecurrencePattern};
use crate::response::ApiResponse;
use crate::utils::{lookup_user, maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let kind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap();
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let tags: Vec<String> = sub
        .get_many::<String>("tag")
        .map(|v| v.map(|s| s.to_string()).collect())
        .unwrap_or_default();
    let recurrence = match sub.get_one::<String>("recur") {
        Some(p) => {
            let pattern: RecurrencePattern = p.parse()?;
            let end_date = sub
                .get_one::<String>("recur-end")
                .map(|s| parse_date(s))
                .transpose()?;
            Some(Recurrence { pattern, end_date })
        }
        None => None,
    };

    let rec = ledger::insert(
        conn,
        user.id,
        &NewRecord {
            kind,
            amount,
            category,
            tags,
            date,
            description: sub.get_one::<String>("description").map(|s| s.to_string()),
            recurrence,
        },
    )?;
    println!(
        "Recorded {} {} in '{}' on {} (id {})",
        rec.kind.as_str(),
        rec.amount,
        rec.category,
        rec.date,
        rec.id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let filter = RecordFilter {
        kind: sub
            .get_one::<String>("kind")
            .map(|s| s.parse())
            .transpose()?,
        category: sub.get_one::<String>("category").map(|s| s.to_string()),
        month: sub
            .get_one::<String>("month")
            .map(|s| parse_month(s))
            .transpose()?,
        limit: sub.get_one::<usize>("limit").copied(),
    };
    let data = ledger::list(conn, user.id, &filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&data))? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.to_string(),
                    r.kind.as_str().to_string(),
                    format!("{:.2}", r.amount),
                    r.category.clone(),
                    r.tags.join(","),
                    r.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Amount", "Category", "Tags", "Description"],
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
    let rec = ledger::get(conn, user.id, id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&rec))? {
        println!("{}", serde_json::to_string_pretty(&rec)?);
    }
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = RecordUpdate {
        kind: sub
            .get_one::<String>("kind")
            .map(|s| s.parse())
            .transpose()?,
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        category: sub.get_one::<String>("category").map(|s| s.to_string()),
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        description: sub.get_one::<String>("description").map(|s| s.to_string()),
    };
    let rec = ledger::update(conn, user.id, id, &patch)?;
    println!("Updated transaction {} ({} {})", rec.id, rec.kind.as_str(), rec.amount);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    ledger::delete(conn, user.id, id)?;
    println!("Deleted transaction {}", id);
    Ok(())
}
