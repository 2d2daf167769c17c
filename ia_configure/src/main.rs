use crate::configure::{ArchiveConfigurator, ConfigureCommand};
use archive::session::ArchiveSession;
use clap::Parser;
use shared::args::{Args, Command};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod configure;
mod error;
mod json;

/// Logs always go to stderr, stdout carries the command's output
fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=off,hyper_util=off,rustls=off", level))
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_line_number(debug)
        .with_env_filter(filter)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    init_tracing(args.debug);

    let session = ArchiveSession::new(args.config_file.as_deref(), &args.host)?;

    match &args.command {
        Command::Configure(configure_args) => {
            let command = ConfigureCommand {
                session: &session,
                configurator: &ArchiveConfigurator,
                netrc_path: None,
            };

            let code = command.run(
                configure_args,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            );

            Ok(ExitCode::from(code))
        }
    }
}
