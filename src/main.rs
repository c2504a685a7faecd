use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use pucksim::ScriptHost;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: pucksim <script.rhai>");
        return ExitCode::from(2);
    };

    match ScriptHost::new().run_file(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
