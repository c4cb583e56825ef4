// factory-sim-cli/src/main.rs
// ============================================================================
// Module: Factory Sim CLI Entry Point
// Description: One-shot command line front end for the orchestrator.
// Purpose: Read a factory description and a situation text, run the full
//          pipeline, print the briefing.
// Dependencies: clap, factory-sim-config, factory-sim-core, factory-sim-providers
// ============================================================================

//! ## Overview
//! `situation_text` is the one positional argument; the factory description
//! comes from `--factory-description <FILE>` or stdin. Stdout carries
//! exactly the briefing; the debug payload, when not suppressed, goes to
//! stderr as a trailing JSON block. The process exits non-zero only when
//! configuration is missing — a pipeline run that completes with
//! `overall_status = PARTIAL` or `FAILED` is still a successful CLI
//! invocation, per the HTTP contract this CLI mirrors.

use std::io::IsTerminal;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use factory_sim_config::FactorySimConfig;
use factory_sim_core::ModelGateway;
use factory_sim_core::run_pipeline;
use factory_sim_providers::HttpModelGateway;
use factory_sim_providers::HttpModelGatewayConfig;

/// Runs one what-if simulation against a factory description and a
/// free-form situation text, printing a feasibility briefing.
#[derive(Parser, Debug)]
#[command(name = "factory-sim")]
struct Cli {
    /// Operator situation text describing what's happening today.
    situation_text: String,
    /// Path to the factory description. Reads stdin if omitted.
    #[arg(long, value_name = "FILE")]
    factory_description: Option<PathBuf>,
    /// Suppress the trailing debug JSON block on stderr.
    #[arg(long)]
    no_debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let factory_description = match read_factory_description(cli.factory_description.as_deref()) {
        Ok(text) => text,
        Err(error) => return fail(&format!("error: {error}")),
    };

    let config = match FactorySimConfig::from_env() {
        Ok(config) => config,
        Err(error) => return fail(&format!("error: {error}")),
    };

    let gateway = match HttpModelGateway::new(HttpModelGatewayConfig {
        base_url: config.gateway.base_url,
        api_key: config.gateway.api_key,
        model: config.gateway.model,
        timeout: config.gateway.timeout(),
    }) {
        Ok(gateway) => gateway,
        Err(error) => return fail(&format!("error: {error}")),
    };
    let gateway: Arc<dyn ModelGateway> = Arc::new(gateway);

    let output =
        run_pipeline(gateway.as_ref(), &factory_description, &cli.situation_text, config.gateway.timeout()).await;

    let _ = write_stdout_line(&output.briefing);
    if !cli.no_debug {
        match serde_json::to_string_pretty(&output.debug) {
            Ok(json) => {
                let _ = write_stderr_line(&json);
            }
            Err(error) => {
                let _ = write_stderr_line(&format!("error: failed to render debug payload: {error}"));
            }
        }
    }

    ExitCode::SUCCESS
}

/// Writes `message` to stderr and returns a failure exit code.
fn fail(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Reads the factory description from `path`, or from stdin when `path`
/// is `None` and stdin is not a terminal.
fn read_factory_description(path: Option<&std::path::Path>) -> Result<String, std::io::Error> {
    if let Some(path) = path {
        return std::fs::read_to_string(path);
    }
    let mut buffer = String::new();
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(std::io::Error::other(
            "no --factory-description given and stdin is a terminal; pipe the factory description in",
        ));
    }
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(buffer)
}
