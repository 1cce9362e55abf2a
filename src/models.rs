// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized {what} '{value}'")]
pub struct ParseEnumError {
    what: &'static str,
    value: String,
}

macro_rules! sql_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError { what: $what, value: s.to_string() }),
                }
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                s.parse().map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }
    };
}

sql_enum!(RecordKind, "record kind", { Income => "income", Expense => "expense" });
sql_enum!(Period, "budget period", { Monthly => "monthly", Yearly => "yearly", Custom => "custom" });
sql_enum!(Priority, "goal priority", { Low => "low", Medium => "medium", High => "high" });
sql_enum!(RecurrencePattern, "recurrence pattern", { Daily => "daily", Weekly => "weekly", Monthly => "monthly" });
sql_enum!(Role, "user role", { Admin => "admin", User => "user" });

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub end_date: Option<NaiveDate>,
}

/// A single income or expense entry, owned exclusively by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: i64,
    pub user_id: i64,
    pub kind: RecordKind,
    pub amount: Decimal,
    pub category: String,
    pub tags: Vec<String>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
}

/// A spending ceiling for a category over a period. `spent` is a cache of
/// the matching expense aggregate; status reads recompute and refresh it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub spent: Decimal,
    pub period: Period,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notification_threshold: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAllocate {
    pub enabled: bool,
    pub percentage: Decimal,
    pub fixed_amount: Decimal,
}

/// A savings target. `is_completed` is a one-way latch: contributions and
/// allocations set it when current reaches target and never clear it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    pub category: String,
    pub priority: Priority,
    pub auto_allocate: AutoAllocate,
    pub is_completed: bool,
    pub start_date: NaiveDate,
}
