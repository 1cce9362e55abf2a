// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{budget, goal};
use crate::ledger;
use crate::utils::{decimal_from_sql, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub fn handle(conn: &Connection) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let mut rows = Vec::new();

    // 1) Stale spent caches: compare each budget's cached spent with the
    //    aggregate its window would produce right now.
    for b in budget::list_all(conn)? {
        let (from, to) = budget::period_window(&b, today);
        let actual = ledger::sum_expenses(conn, b.user_id, &b.category, from, to)?;
        if actual != b.spent {
            rows.push(vec![
                "stale_spent_cache".into(),
                format!("budget {} '{}' cached {} actual {}", b.id, b.name, b.spent, actual),
            ]);
        }
    }

    // 2) Goals at or over target whose completion latch never fired
    let mut stmt = conn.prepare(
        "SELECT id, name, current_amount, target_amount FROM goals WHERE is_completed=0",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let current: String = r.get(2)?;
        let target: String = r.get(3)?;
        if decimal_from_sql(2, &current)? >= decimal_from_sql(3, &target)? {
            rows.push(vec![
                "unlatched_goal".into(),
                format!("goal {} '{}' at {} of {}", id, name, current, target),
            ]);
        }
    }

    // 3) Contribution records whose tagged goal no longer exists
    let mut stmt2 = conn.prepare("SELECT id, tags FROM transactions WHERE category=?1")?;
    let mut cur2 = stmt2.query(params![goal::CONTRIBUTION_CATEGORY])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let tags: String = r.get(1)?;
        let tags: Vec<String> = serde_json::from_str(&tags).unwrap_or_default();
        let Some(goal_id) = tags.first().and_then(|t| t.parse::<i64>().ok()) else {
            rows.push(vec!["untagged_contribution".into(), format!("transaction {}", id)]);
            continue;
        };
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM goals WHERE id=?1", params![goal_id], |r| r.get(0))
            .optional()?;
        if exists.is_none() {
            rows.push(vec![
                "orphaned_contribution".into(),
                format!("transaction {} tagged with missing goal {}", id, goal_id),
            ]);
        }
    }

    // 4) Records owned by no user
    let mut stmt3 = conn
        .prepare("SELECT DISTINCT user_id FROM transactions EXCEPT SELECT id FROM users")?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let uid: i64 = r.get(0)?;
        rows.push(vec!["unowned_records".into(), format!("user_id {}", uid)]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
