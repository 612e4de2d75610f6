use std::sync::Arc;

use anyhow::Context;
use fixit_shared::AppState;
use reports_block::{AppShell, Services};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

use commands::Command;
use input::{Input, TerminalPicker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let state = AppState::from_env()
        .await
        .context("failed to load configuration")?;

    let input = Input::stdin();
    let services = Services {
        identity: state.identity(),
        blobs: state.blob_store(),
        picker: Arc::new(TerminalPicker::new(input.clone())),
        reports: state.report_store(),
    };

    let shell = AppShell::start(services);
    println!("FixIt\n{}", commands::HELP);

    loop {
        let prompt = commands::prompt_for(&shell.screen());
        let Some(line) = input.prompt(&prompt).await.context("failed to read input")? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        commands::run(&shell, command).await;
    }

    tracing::info!("👋 Bye");
    Ok(())
}
