use mixer_bridge::startup;

use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let explicit_config = std::env::args_os().nth(1).map(PathBuf::from);

    match startup::run(explicit_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logger may not be installed yet
            eprintln!("{e}");
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
