// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod dashboard;
pub mod db;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod response;
pub mod utils;
