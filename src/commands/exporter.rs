// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, RecordFilter};
use crate::utils::lookup_user;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = lookup_user(conn, sub.get_one::<String>("user").unwrap())?;
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut records = ledger::list(conn, user.id, &RecordFilter::default())?;
    // list returns newest first; exports read better oldest first
    records.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "kind", "amount", "category", "tags", "description"])?;
            for r in &records {
                wtr.write_record([
                    r.id.to_string(),
                    r.date.to_string(),
                    r.kind.as_str().to_string(),
                    r.amount.to_string(),
                    r.category.clone(),
                    r.tags.join(";"),
                    r.description.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&records)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
            return Ok(());
        }
    }
    println!("Exported {} transactions to {}", records.len(), out);
    Ok(())
}
