mod cli;
mod commands;
mod common;
mod config;
mod danmaku;
mod report;
mod subtitles;
mod ui;
mod video;

use clap::Parser;
use std::io::IsTerminal;

use crate::cli::Cli;
use crate::ui::prelude::*;

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color && std::io::stdout().is_terminal());

    emit(
        Level::Debug,
        "barrage.debug.enabled",
        "Debug mode is on",
        None,
    );

    if let Err(err) = commands::handle_command(cli.command, cli.config.as_ref()) {
        emit(Level::Error, "barrage.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
