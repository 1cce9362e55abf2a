// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .required(true)
        .help("Username of the authenticated user")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Emit the response envelope as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Emit the response as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Personal finance tracking: ledger, budgets, savings goals, dashboards")
        .version(clap::crate_version!())
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .about("Register a user")
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(Arg::new("email").long("email"))
                        .arg(Arg::new("role").long("role").default_value("user")),
                )
                .subcommand(json_flags(Command::new("list").about("List users")))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a user and their data")
                        .arg(Arg::new("username").long("username").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Manage ledger records")
                .subcommand(
                    Command::new("add")
                        .about("Record an income or expense")
                        .arg(user_arg())
                        .arg(Arg::new("kind").long("kind").required(true).help("income|expense"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("tag")
                                .long("tag")
                                .action(ArgAction::Append)
                                .help("Repeatable tag"),
                        )
                        .arg(
                            Arg::new("recur")
                                .long("recur")
                                .help("Recurrence pattern: daily|weekly|monthly"),
                        )
                        .arg(
                            Arg::new("recur-end")
                                .long("recur-end")
                                .help("Last date of the recurrence"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List records, newest first")
                        .arg(user_arg())
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("show").about("Show one record").arg(user_arg()).arg(id_arg()),
                ))
                .subcommand(
                    Command::new("update")
                        .about("Update a record")
                        .arg(user_arg())
                        .arg(id_arg())
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a record (no cascade onto budgets or goals)")
                        .arg(user_arg())
                        .arg(id_arg()),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Manage budgets and derive their status")
                .subcommand(
                    Command::new("add")
                        .about("Create a budget")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("period")
                                .long("period")
                                .default_value("monthly")
                                .help("monthly|yearly|custom"),
                        )
                        .arg(Arg::new("start").long("start").help("YYYY-MM-DD, default today"))
                        .arg(Arg::new("end").long("end").help("Required for custom periods"))
                        .arg(
                            Arg::new("threshold")
                                .long("threshold")
                                .value_parser(value_parser!(u32))
                                .help("Warning threshold percent (1-100, default 80)"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list").about("List budgets").arg(user_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("show").about("Show one budget").arg(user_arg()).arg(id_arg()),
                ))
                .subcommand(
                    Command::new("update")
                        .about("Update a budget")
                        .arg(user_arg())
                        .arg(id_arg())
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("period").long("period"))
                        .arg(Arg::new("start").long("start"))
                        .arg(Arg::new("end").long("end"))
                        .arg(
                            Arg::new("threshold")
                                .long("threshold")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(Arg::new("active").long("active").help("true|false")),
                )
                .subcommand(
                    Command::new("rm").about("Delete a budget").arg(user_arg()).arg(id_arg()),
                )
                .subcommand(json_flags(
                    Command::new("status")
                        .about("Derive spend/status for one budget")
                        .arg(user_arg())
                        .arg(id_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("statuses")
                        .about("Derive status for every active budget")
                        .arg(user_arg()),
                )),
        )
        .subcommand(
            Command::new("goal")
                .about("Manage savings goals, contributions, and auto-allocation")
                .subcommand(
                    Command::new("add")
                        .about("Create a goal")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("target").long("target").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("target-date").long("target-date"))
                        .arg(
                            Arg::new("priority")
                                .long("priority")
                                .default_value("medium")
                                .help("low|medium|high"),
                        )
                        .arg(
                            Arg::new("auto")
                                .long("auto")
                                .action(ArgAction::SetTrue)
                                .help("Enable auto-allocation"),
                        )
                        .arg(
                            Arg::new("auto-percent")
                                .long("auto-percent")
                                .help("Percent of income to allocate (takes precedence)"),
                        )
                        .arg(
                            Arg::new("auto-fixed")
                                .long("auto-fixed")
                                .help("Fixed amount to allocate"),
                        )
                        .arg(Arg::new("start").long("start").help("YYYY-MM-DD, default today")),
                )
                .subcommand(json_flags(
                    Command::new("list").about("List goals with progress").arg(user_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show one goal with progress and recent contributions")
                        .arg(user_arg())
                        .arg(id_arg()),
                ))
                .subcommand(
                    Command::new("update")
                        .about("Update a goal")
                        .arg(user_arg())
                        .arg(id_arg())
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("target").long("target"))
                        .arg(Arg::new("current").long("current"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("target-date").long("target-date"))
                        .arg(Arg::new("priority").long("priority"))
                        .arg(Arg::new("auto").long("auto").help("true|false"))
                        .arg(Arg::new("auto-percent").long("auto-percent"))
                        .arg(Arg::new("auto-fixed").long("auto-fixed")),
                )
                .subcommand(
                    Command::new("rm").about("Delete a goal").arg(user_arg()).arg(id_arg()),
                )
                .subcommand(json_flags(
                    Command::new("contribute")
                        .about("Add money to a goal (also writes a ledger record)")
                        .arg(user_arg())
                        .arg(id_arg())
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
                ))
                .subcommand(json_flags(
                    Command::new("auto-allocate")
                        .about("Distribute an income amount across auto-allocation goals")
                        .arg(user_arg())
                        .arg(Arg::new("amount").long("amount").required(true)),
                )),
        )
        .subcommand(json_flags(
            Command::new("dashboard")
                .about("Role-based dashboard rollup")
                .arg(user_arg()),
        ))
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .about("Export a user's ledger records")
                    .arg(user_arg())
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check stored data for inconsistencies"))
}
