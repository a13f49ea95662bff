use clap::Parser;
use std::process::ExitCode;
use vocab_store::cli::{self, Cli};
use vocab_store::logging::{LogSettings, init_logging};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = LogSettings {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        log_file: cli.log_file.clone(),
    };
    if let Err(err) = init_logging(&settings) {
        eprintln!("Failed to initialize logging: {err:#}");
    }

    match cli::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.code();
            tracing::debug!(code = %code, "command failed");
            if cli.json {
                let payload = serde_json::json!({
                    "error": { "code": code.as_str(), "message": err.to_string() }
                });
                eprintln!("{payload}");
            } else {
                eprintln!("Error: {err}");
            }
            let status = u8::try_from(code.exit_code()).unwrap_or(1);
            ExitCode::from(status)
        }
    }
}
