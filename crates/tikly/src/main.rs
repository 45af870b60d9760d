mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use tikly_core::{Session, SessionOptions, TracingLogFactory};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

/// Verbosity at which API words are logged.
const WIRE_LOG_VERBOSITY: u8 = 3;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(verbosity >= WIRE_LOG_VERBOSITY)
        .with_writer(std::io::stderr)
        .init();

    if verbosity >= WIRE_LOG_VERBOSITY {
        if let Err(e) = tikly_core::install_log_factory(Arc::new(TracingLogFactory)) {
            tracing::warn!(error = %e, "wire logging unavailable");
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Offline commands
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),
        Command::Kinds => commands::kinds::handle(&cli.global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "tikly", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the device
        cmd => {
            commands::validate(&cmd)?;
            let session = connect(&cli.global)?;

            tracing::debug!(command = ?cmd, session = session.id(), "dispatching command");
            let result = commands::dispatch(cmd, &session, &cli.global);
            session.dispose();
            result
        }
    }
}

/// Create a session from config + flags and log on.
fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let (profile_name, params) = config::resolve_connect_params(global)?;

    let session = Session::with_options(
        params.connector_type,
        SessionOptions {
            transport: params.transport,
            log_factory: None,
        },
    )?;
    if global.verbose >= WIRE_LOG_VERBOSITY {
        session.set_connector_logging(true)?;
    }

    session
        .open_with_port(
            &params.host,
            params.port,
            &params.username,
            params.password.expose_secret(),
        )
        .map_err(|e| CliError::from_open(e, &params.host, &profile_name))?;

    tracing::info!(host = %params.host, port = params.port, profile = %profile_name, "connected");
    Ok(session)
}
