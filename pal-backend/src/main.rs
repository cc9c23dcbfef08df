use pal_backend::config::{PalConfig, DEFAULT_CONFIG_PATH};
use pal_backend::error::{exit_code_for, PalError};
use pal_backend::model::http::ReqwestTransport;
use pal_backend::module::ephemeris;
use pal_backend::shutdown::Shutdown;

use anyhow::Result;
use chrono::Utc;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match PalConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return exit_code(&e);
        }
    };

    // Initialize logging
    let _logging_guard = match pal_backend::logging::init_logging(
        &config.log_dir,
        "pal",
        &config.log_level,
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Argus PAL starting with {}", config_path);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PalError>() {
                Some(PalError::Cancelled) => tracing::warn!("Run cancelled: {:#}", e),
                _ => tracing::error!("Run failed: {:#}", e),
            }
            exit_code(&e)
        }
    }
}

async fn run(config: &PalConfig) -> Result<()> {
    let shutdown = Shutdown::new();
    shutdown.listen();

    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
        config.catalog.request_timeout_secs,
    ))?);
    let today = Utc::now().date_naive();

    let outcome = ephemeris::execute(config, transport, today, &shutdown).await?;

    tracing::info!("{}", outcome.report.summary());
    for path in &outcome.ephemera {
        tracing::info!("Ephemeris: {}", path.display());
    }
    tracing::info!("Run summary written to {}", outcome.run_log.display());
    Ok(())
}

fn exit_code(error: &anyhow::Error) -> ExitCode {
    ExitCode::from(u8::try_from(exit_code_for(error)).unwrap_or(1))
}
