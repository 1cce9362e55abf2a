// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::{cli, commands};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    fintrack::db::init_schema(&mut conn).unwrap();
    conn
}

fn dispatch(conn: &Connection, argv: &[&str]) {
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("user", sub)) => commands::users::handle(conn, sub).unwrap(),
        Some(("tx", sub)) => commands::transactions::handle(conn, sub).unwrap(),
        Some(("budget", sub)) => commands::budgets::handle(conn, sub).unwrap(),
        Some(("goal", sub)) => commands::goals::handle(conn, sub).unwrap(),
        Some(("export", sub)) => commands::exporter::handle(conn, sub).unwrap(),
        other => panic!("unhandled subcommand {:?}", other.map(|(n, _)| n)),
    }
}

#[test]
fn user_add_trims_and_stores() {
    let conn = setup();
    dispatch(&conn, &["fintrack", "user", "add", "--username", "  carol  ", "--email", "c@example.com"]);

    let (username, role): (String, String) = conn
        .query_row("SELECT username, role FROM users", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(username, "carol");
    assert_eq!(role, "user");
}

#[test]
fn tx_add_parses_flags_into_a_record() {
    let conn = setup();
    dispatch(&conn, &["fintrack", "user", "add", "--username", "carol"]);
    dispatch(
        &conn,
        &[
            "fintrack", "tx", "add", "--user", "carol", "--kind", "expense", "--amount", "12.34",
            "--category", "coffee", "--date", "2025-08-10", "--tag", "morning", "--tag", "work",
            "--description", "flat white",
        ],
    );

    let user_id: i64 = conn
        .query_row("SELECT id FROM users WHERE username='carol'", [], |r| r.get(0))
        .unwrap();
    let rec = fintrack::ledger::get(&conn, user_id, 1).unwrap();
    assert_eq!(rec.amount, "12.34".parse().unwrap());
    assert_eq!(rec.category, "coffee");
    assert_eq!(rec.tags, vec!["morning".to_string(), "work".to_string()]);
    assert_eq!(rec.description.as_deref(), Some("flat white"));
}

#[test]
fn export_writes_csv_oldest_first() {
    let conn = setup();
    dispatch(&conn, &["fintrack", "user", "add", "--username", "carol"]);
    for (amount, date) in [("10", "2025-08-02"), ("20", "2025-08-01")] {
        dispatch(
            &conn,
            &[
                "fintrack", "tx", "add", "--user", "carol", "--kind", "expense", "--amount",
                amount, "--category", "misc", "--date", date,
            ],
        );
    }

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.csv");
    dispatch(
        &conn,
        &[
            "fintrack", "export", "transactions", "--user", "carol", "--format", "csv", "--out",
            out.to_str().unwrap(),
        ],
    );

    let body = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,date,kind,amount,category"));
    assert!(lines[1].contains("2025-08-01"));
    assert!(lines[2].contains("2025-08-02"));
}

#[test]
fn export_writes_json() {
    let conn = setup();
    dispatch(&conn, &["fintrack", "user", "add", "--username", "carol"]);
    dispatch(
        &conn,
        &[
            "fintrack", "tx", "add", "--user", "carol", "--kind", "income", "--amount", "100",
            "--category", "salary", "--date", "2025-08-01",
        ],
    );

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.json");
    dispatch(
        &conn,
        &[
            "fintrack", "export", "transactions", "--user", "carol", "--format", "json", "--out",
            out.to_str().unwrap(),
        ],
    );

    let body = std::fs::read_to_string(&out).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(parsed[0]["kind"], "income");
    assert_eq!(parsed[0]["category"], "salary");
}

#[test]
fn budget_and_goal_commands_round_trip_through_the_cli() {
    let conn = setup();
    dispatch(&conn, &["fintrack", "user", "add", "--username", "carol"]);
    dispatch(
        &conn,
        &[
            "fintrack", "budget", "add", "--user", "carol", "--name", "Groceries", "--amount",
            "400", "--category", "groceries", "--threshold", "75",
        ],
    );
    dispatch(
        &conn,
        &[
            "fintrack", "goal", "add", "--user", "carol", "--name", "Vacation", "--target",
            "3000", "--category", "savings", "--auto", "--auto-percent", "10",
        ],
    );
    dispatch(
        &conn,
        &["fintrack", "goal", "contribute", "--user", "carol", "--id", "1", "--amount", "300"],
    );

    let threshold: i64 = conn
        .query_row("SELECT notification_threshold FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(threshold, 75);
    let (current, auto_pct): (String, String) = conn
        .query_row("SELECT current_amount, auto_percentage FROM goals", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(current, "300");
    assert_eq!(auto_pct, "10");
}
