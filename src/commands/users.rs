// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Role, User};
use crate::response::ApiResponse;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let username = sub.get_one::<String>("username").unwrap().trim().to_string();
            let email = sub.get_one::<String>("email").map(|s| s.to_string());
            let role: Role = sub.get_one::<String>("role").unwrap().parse()?;
            conn.execute(
                "INSERT INTO users(username, email, role) VALUES (?1, ?2, ?3)",
                params![username, email, role],
            )?;
            println!("Registered user '{}' ({})", username, role.as_str());
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let mut stmt = conn.prepare(
                "SELECT id, username, email, role, last_login FROM users ORDER BY username",
            )?;
            let mut rows = stmt.query([])?;
            let mut users = Vec::new();
            while let Some(r) = rows.next()? {
                users.push(User {
                    id: r.get(0)?,
                    username: r.get(1)?,
                    email: r.get(2)?,
                    role: r.get(3)?,
                    last_login: r.get(4)?,
                });
            }
            if !maybe_print_json(json_flag, jsonl_flag, &ApiResponse::ok(&users))? {
                let data = users
                    .iter()
                    .map(|u| {
                        vec![
                            u.id.to_string(),
                            u.username.clone(),
                            u.email.clone().unwrap_or_default(),
                            u.role.as_str().to_string(),
                            u.last_login.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Username", "Email", "Role", "Last login"], data)
                );
            }
        }
        Some(("rm", sub)) => {
            let username = sub.get_one::<String>("username").unwrap();
            conn.execute("DELETE FROM users WHERE username=?1", params![username])?;
            println!("Removed user '{}'", username);
        }
        _ => {}
    }
    Ok(())
}
