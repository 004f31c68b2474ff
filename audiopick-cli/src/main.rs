mod cli;
mod logging;

use crate::cli::Args;
use audiopick_ankiconnect::AnkiConnectClient;
use audiopick_core::{AppConfig, CoreError, ExternalPlayer, SessionOutcome, Workflow};
use audiopick_local::LocalAudioProvider;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    let args = Args::parse();

    // Check config for logging.enabled before full config load
    let config_path = args.config.clone().unwrap_or_else(AppConfig::config_path);
    logging::init_tracing(logging::check_file_logging_enabled(&config_path));

    match run(&args) {
        Ok(SessionOutcome::Exited | SessionOutcome::Attached { .. }) => ExitCode::SUCCESS,
        Ok(SessionOutcome::AttachFailed { .. }) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<SessionOutcome, CoreError> {
    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_or_create()?,
    };

    let store = AnkiConnectClient::new(&config.record_store)?;
    let provider = LocalAudioProvider::new(&config.audio_server)?;
    let player = ExternalPlayer::from_command(&config.player.command)?;
    let workflow = Workflow::new(&config, &store, &provider, &player);

    let session = workflow.prepare(
        &args.mode.resolve_mode(),
        args.mode.lookup_override().as_ref(),
    )?;
    if session.record_id().is_some() {
        println!("{}", session.identifier());
    }
    info!(
        "Session ready for {} ({} source(s))",
        session.identifier(),
        session.sources().len()
    );

    workflow.run(session, io::stdin().lock(), io::stdout().lock())
}
