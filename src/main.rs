mod app;
mod commands;
mod render;
mod state;

use crate::app::App;
use crate::commands::{Command, usage_text};
use crate::state::app_settings::AppSettings;
use anyhow::Context;
use log::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(invocation) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();
    init_logging(invocation.verbose);

    let settings = AppSettings::load().context("invalid configuration")?;
    let app = App::new(settings)?;

    match app.run(invocation.command).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("{e:#}");
            Err(e)
        }
    }
}

/// Parse arguments, answering `--help` and `--version` directly.
fn handle_cli_args() -> Option<commands::Invocation> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match commands::parse(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e:#}\n\n{}", usage_text());
            std::process::exit(2);
        }
    };

    match invocation.command {
        Command::Help => {
            println!("{}", usage_text());
            None
        }
        Command::Version => {
            println!("cwc-pool {}", env!("CARGO_PKG_VERSION"));
            None
        }
        _ => Some(invocation),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
