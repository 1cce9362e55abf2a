// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::engine::budget::{self, NewBudget, StatusLevel};
use fintrack::errors::EngineError;
use fintrack::ledger::{self, NewRecord};
use fintrack::models::{Period, RecordKind};
use rusqlite::Connection;
use rust_decimal::Decimal;

const ALICE: i64 = 1;
const BOB: i64 = 2;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    fintrack::db::init_schema(&mut conn).unwrap();
    conn.execute_batch(
        "INSERT INTO users(username, role) VALUES('alice','user');
         INSERT INTO users(username, role) VALUES('bob','user');",
    )
    .unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn spend(conn: &Connection, user: i64, category: &str, amount: &str, date: NaiveDate) {
    ledger::insert(
        conn,
        user,
        &NewRecord {
            kind: RecordKind::Expense,
            amount: dec(amount),
            category,
            tags: vec![],
            date,
            description: None,
            recurrence: None,
        },
    )
    .unwrap();
}

fn monthly_budget(conn: &Connection, user: i64, amount: &str, threshold: Option<u32>) -> i64 {
    budget::create(
        conn,
        user,
        &NewBudget {
            name: "Groceries",
            amount: dec(amount),
            period: Period::Monthly,
            category: "groceries",
            start_date: d(2025, 1, 1),
            end_date: None,
            notification_threshold: threshold,
        },
    )
    .unwrap()
    .id
}

#[test]
fn warning_at_threshold() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", Some(80));
    spend(&conn, ALICE, "groceries", "500", d(2025, 8, 5));
    spend(&conn, ALICE, "groceries", "350", d(2025, 8, 20));

    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(st.spent, dec("850"));
    assert_eq!(st.remaining, dec("150"));
    assert_eq!(st.percentage_used.unwrap().round_dp(2), dec("85.00"));
    assert_eq!(st.status, StatusLevel::Warning);
    assert!(st.notification.unwrap().contains("85"));
}

#[test]
fn exceeded_reports_excess() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", Some(80));
    spend(&conn, ALICE, "groceries", "1200", d(2025, 8, 5));

    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(st.status, StatusLevel::Exceeded);
    assert_eq!(st.remaining, dec("-200"));
    assert!(st.notification.unwrap().contains("200.00"));
}

#[test]
fn normal_below_threshold() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", Some(80));
    spend(&conn, ALICE, "groceries", "300", d(2025, 8, 5));

    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(st.status, StatusLevel::Normal);
    assert!(st.notification.is_none());
    assert_eq!(st.percentage_used.unwrap(), dec("30"));
}

#[test]
fn monthly_window_tracks_current_month_not_stored_dates() {
    let conn = setup();
    // start_date is January; only August expenses may count in August
    let id = monthly_budget(&conn, ALICE, "1000", None);
    spend(&conn, ALICE, "groceries", "700", d(2025, 7, 30));
    spend(&conn, ALICE, "groceries", "100", d(2025, 8, 1));
    spend(&conn, ALICE, "groceries", "50", d(2025, 8, 31));
    spend(&conn, ALICE, "groceries", "900", d(2025, 9, 1));

    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 15)).unwrap();
    assert_eq!(st.spent, dec("150"));
}

#[test]
fn only_matching_expenses_count() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", None);
    spend(&conn, ALICE, "dining", "400", d(2025, 8, 5));
    ledger::insert(
        &conn,
        ALICE,
        &NewRecord {
            kind: RecordKind::Income,
            amount: dec("2000"),
            category: "groceries",
            tags: vec![],
            date: d(2025, 8, 6),
            description: None,
            recurrence: None,
        },
    )
    .unwrap();
    spend(&conn, BOB, "groceries", "999", d(2025, 8, 7));

    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 15)).unwrap();
    assert_eq!(st.spent, Decimal::ZERO);
    assert_eq!(st.status, StatusLevel::Normal);
}

#[test]
fn custom_window_is_used_verbatim() {
    let conn = setup();
    let id = budget::create(
        &conn,
        ALICE,
        &NewBudget {
            name: "Trip",
            amount: dec("500"),
            period: Period::Custom,
            category: "travel",
            start_date: d(2025, 6, 1),
            end_date: Some(d(2025, 6, 30)),
            notification_threshold: None,
        },
    )
    .unwrap()
    .id;
    spend(&conn, ALICE, "travel", "200", d(2025, 6, 15));
    spend(&conn, ALICE, "travel", "300", d(2025, 7, 2));

    // today is irrelevant for custom windows
    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 15)).unwrap();
    assert_eq!(st.spent, dec("200"));
}

#[test]
fn custom_period_requires_end_date() {
    let conn = setup();
    let err = budget::create(
        &conn,
        ALICE,
        &NewBudget {
            name: "Trip",
            amount: dec("500"),
            period: Period::Custom,
            category: "travel",
            start_date: d(2025, 6, 1),
            end_date: None,
            notification_threshold: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn derive_writes_spent_back() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", None);
    spend(&conn, ALICE, "groceries", "850", d(2025, 8, 5));

    budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    let cached: String = conn
        .query_row("SELECT spent FROM budgets WHERE id=?1", [id], |r| r.get(0))
        .unwrap();
    assert_eq!(cached, "850");
}

#[test]
fn derive_is_idempotent_without_ledger_changes() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", Some(80));
    spend(&conn, ALICE, "groceries", "850", d(2025, 8, 5));

    let first = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    let second = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(first.spent, second.spent);
    assert_eq!(first.status, second.status);
    assert_eq!(first.percentage_used, second.percentage_used);
}

#[test]
fn derive_recomputes_after_record_deletion() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", None);
    spend(&conn, ALICE, "groceries", "850", d(2025, 8, 5));
    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(st.spent, dec("850"));

    let rec_id: i64 = conn
        .query_row("SELECT id FROM transactions", [], |r| r.get(0))
        .unwrap();
    ledger::delete(&conn, ALICE, rec_id).unwrap();

    // no cascade: the cache still says 850 until the next derivation
    let cached: String = conn
        .query_row("SELECT spent FROM budgets WHERE id=?1", [id], |r| r.get(0))
        .unwrap();
    assert_eq!(cached, "850");
    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(st.spent, Decimal::ZERO);
}

#[test]
fn zero_amount_budget_is_always_exceeded() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "0", None);

    let st = budget::derive_status(&conn, ALICE, id, d(2025, 8, 25)).unwrap();
    assert_eq!(st.status, StatusLevel::Exceeded);
    assert!(st.percentage_used.is_none());
    assert!(st.notification.is_some());
}

#[test]
fn foreign_budget_is_forbidden_not_missing() {
    let conn = setup();
    let id = monthly_budget(&conn, ALICE, "1000", None);
    spend(&conn, ALICE, "groceries", "850", d(2025, 8, 5));

    let err = budget::derive_status(&conn, BOB, id, d(2025, 8, 25)).unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));
    // no write-back happened
    let cached: String = conn
        .query_row("SELECT spent FROM budgets WHERE id=?1", [id], |r| r.get(0))
        .unwrap();
    assert_eq!(cached, "0");
}

#[test]
fn missing_budget_is_not_found() {
    let conn = setup();
    let err = budget::derive_status(&conn, ALICE, 99, d(2025, 8, 25)).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn derive_all_covers_active_budgets_in_stored_order() {
    let conn = setup();
    let first = monthly_budget(&conn, ALICE, "1000", None);
    let second = budget::create(
        &conn,
        ALICE,
        &NewBudget {
            name: "Dining",
            amount: dec("200"),
            period: Period::Monthly,
            category: "dining",
            start_date: d(2025, 1, 1),
            end_date: None,
            notification_threshold: None,
        },
    )
    .unwrap()
    .id;
    // deactivated budgets are skipped
    let third = monthly_budget(&conn, ALICE, "50", None);
    conn.execute("UPDATE budgets SET is_active=0 WHERE id=?1", [third])
        .unwrap();
    spend(&conn, ALICE, "dining", "150", d(2025, 8, 10));

    let statuses = budget::derive_all_statuses(&conn, ALICE, d(2025, 8, 15)).unwrap();
    let ids: Vec<i64> = statuses.iter().map(|s| s.budget_id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(statuses[1].spent, dec("150"));
    let cached: String = conn
        .query_row("SELECT spent FROM budgets WHERE id=?1", [second], |r| r.get(0))
        .unwrap();
    assert_eq!(cached, "150");
}
