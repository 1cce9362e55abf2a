// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::errors::EngineError;
use fintrack::ledger::{self, NewRecord, RecordFilter, RecordUpdate};
use fintrack::models::{RecordKind, Recurrence, RecurrencePattern};
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

fn record<'a>(kind: RecordKind, amount: &str, category: &'a str, date: NaiveDate) -> NewRecord<'a> {
    NewRecord {
        kind,
        amount: amount.parse().unwrap(),
        category,
        tags: vec![],
        date,
        description: None,
        recurrence: None,
    }
}

#[test]
fn insert_and_get_roundtrip() {
    let conn = setup();
    let rec = ledger::insert(
        &conn,
        ALICE,
        &NewRecord {
            kind: RecordKind::Expense,
            amount: dec("42.50"),
            category: "groceries",
            tags: vec!["weekly".into(), "market".into()],
            date: d(2025, 8, 10),
            description: Some("farmers market".into()),
            recurrence: Some(Recurrence {
                pattern: RecurrencePattern::Weekly,
                end_date: Some(d(2025, 12, 31)),
            }),
        },
    )
    .unwrap();

    let got = ledger::get(&conn, ALICE, rec.id).unwrap();
    assert_eq!(got.amount, dec("42.50"));
    assert_eq!(got.tags, vec!["weekly".to_string(), "market".to_string()]);
    assert_eq!(got.description.as_deref(), Some("farmers market"));
    let recurrence = got.recurrence.unwrap();
    assert_eq!(recurrence.pattern, RecurrencePattern::Weekly);
    assert_eq!(recurrence.end_date, Some(d(2025, 12, 31)));
}

#[test]
fn negative_amounts_are_rejected() {
    let conn = setup();
    let err = ledger::insert(
        &conn,
        ALICE,
        &record(RecordKind::Expense, "-10", "groceries", d(2025, 8, 1)),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn list_filters_by_kind_category_and_month() {
    let conn = setup();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "10", "groceries", d(2025, 8, 1)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "20", "misc", d(2025, 8, 2)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Income, "500", "salary", d(2025, 8, 3)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "30", "groceries", d(2025, 7, 5)))
        .unwrap();
    ledger::insert(&conn, BOB, &record(RecordKind::Expense, "99", "groceries", d(2025, 8, 4)))
        .unwrap();

    let expenses = ledger::list(
        &conn,
        ALICE,
        &RecordFilter {
            kind: Some(RecordKind::Expense),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(expenses.len(), 3);

    let groceries_aug = ledger::list(
        &conn,
        ALICE,
        &RecordFilter {
            category: Some("groceries".into()),
            month: Some("2025-08".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(groceries_aug.len(), 1);
    assert_eq!(groceries_aug[0].amount, dec("10"));
}

#[test]
fn list_orders_newest_first_and_honors_limit() {
    let conn = setup();
    for day in 1..=4 {
        ledger::insert(
            &conn,
            ALICE,
            &record(RecordKind::Expense, "10", "groceries", d(2025, 8, day)),
        )
        .unwrap();
    }
    let latest = ledger::list(
        &conn,
        ALICE,
        &RecordFilter {
            limit: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].date, d(2025, 8, 4));
    assert_eq!(latest[1].date, d(2025, 8, 3));
}

#[test]
fn update_patches_only_given_fields() {
    let conn = setup();
    let rec = ledger::insert(
        &conn,
        ALICE,
        &record(RecordKind::Expense, "10", "groceries", d(2025, 8, 1)),
    )
    .unwrap();

    let updated = ledger::update(
        &conn,
        ALICE,
        rec.id,
        &RecordUpdate {
            amount: Some(dec("15")),
            description: Some("corrected".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.amount, dec("15"));
    assert_eq!(updated.category, "groceries");
    assert_eq!(updated.description.as_deref(), Some("corrected"));
    assert_eq!(updated.date, d(2025, 8, 1));
}

#[test]
fn ownership_is_checked_before_mutation() {
    let conn = setup();
    let rec = ledger::insert(
        &conn,
        ALICE,
        &record(RecordKind::Expense, "10", "groceries", d(2025, 8, 1)),
    )
    .unwrap();

    let err = ledger::get(&conn, BOB, rec.id).unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));
    let err = ledger::update(
        &conn,
        BOB,
        rec.id,
        &RecordUpdate {
            amount: Some(dec("1")),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));
    let err = ledger::delete(&conn, BOB, rec.id).unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    // untouched
    assert_eq!(ledger::get(&conn, ALICE, rec.id).unwrap().amount, dec("10"));

    let err = ledger::get(&conn, ALICE, 404).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn sum_expenses_respects_owner_category_kind_and_window() {
    let conn = setup();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "10", "groceries", d(2025, 8, 1)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "20", "groceries", d(2025, 8, 31)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "40", "groceries", d(2025, 9, 1)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Income, "99", "groceries", d(2025, 8, 2)))
        .unwrap();
    ledger::insert(&conn, ALICE, &record(RecordKind::Expense, "5", "misc", d(2025, 8, 3)))
        .unwrap();
    ledger::insert(&conn, BOB, &record(RecordKind::Expense, "7", "groceries", d(2025, 8, 4)))
        .unwrap();

    let bounded =
        ledger::sum_expenses(&conn, ALICE, "groceries", d(2025, 8, 1), Some(d(2025, 8, 31)))
            .unwrap();
    assert_eq!(bounded, dec("30"));

    let open_ended = ledger::sum_expenses(&conn, ALICE, "groceries", d(2025, 8, 1), None).unwrap();
    assert_eq!(open_ended, dec("70"));
}
