pub mod credentials;
pub mod keys;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_DSN: &str = "dsn";
pub const ARG_SUBJECT: &str = "subject";
pub const ARG_TOKEN: &str = "token";
pub const ARG_INTERVAL_SECONDS: &str = "interval-seconds";

pub const CMD_REVOKE: &str = "revoke";
pub const CMD_SESSIONS: &str = "sessions";
pub const CMD_VERIFY: &str = "verify";
pub const CMD_SWEEP: &str = "sweep";

fn subject_arg() -> Arg {
    Arg::new(ARG_SUBJECT)
        .short('s')
        .long(ARG_SUBJECT)
        .help("Subject identifier")
        .required(true)
}

fn subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_REVOKE)
                .about("Revoke every session of a subject")
                .arg(subject_arg()),
        )
        .subcommand(
            Command::new(CMD_SESSIONS)
                .about("Print the number of live sessions of a subject")
                .arg(subject_arg()),
        )
        .subcommand(
            Command::new(CMD_VERIFY)
                .about("Verify an access credential and print its subject")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .short('t')
                        .long(ARG_TOKEN)
                        .help("Access credential")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_SWEEP)
                .about("Delete expired rows from the PostgreSQL store")
                .arg(
                    Arg::new(ARG_INTERVAL_SECONDS)
                        .long(ARG_INTERVAL_SECONDS)
                        .help("Keep sweeping on this interval instead of running once")
                        .env("TESSERA_SWEEP_INTERVAL_SECONDS")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("tessera")
        .about("Session credential lifecycle")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .env("TESSERA_DSN")
                .hide_env_values(true)
                .global(true),
        );

    let command = subcommands(command);
    let command = keys::with_args(command);
    let command = credentials::with_args(command);
    logging::with_args(command)
}
