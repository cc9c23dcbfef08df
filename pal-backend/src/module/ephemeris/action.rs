//! One full run: validate the request, query the catalog per night, propagate
//! the observable bodies and write the run summary.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pal_common::{EphemerisArtifact, PropagationMode, Telescope};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::dates::{create_dates, parse_date};
use super::pipeline::{ObservationPipeline, PipelineReport};
use super::propagate::{check_interval, propagate, propagate_lowell};
use crate::config::PalConfig;
use crate::error::PalResult;
use crate::model::astorb::CatalogClient;
use crate::model::http::{HttpTransport, RetryPolicy};
use crate::model::lowell::LowellClient;
use crate::model::store::ArtifactStore;
use crate::shutdown::Shutdown;

#[derive(Debug)]
pub struct RunOutcome {
    pub report: PipelineReport,
    pub ephemera: Vec<PathBuf>,
    pub run_log: PathBuf,
}

/// A request checked against the configuration, ready to run.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub telescope: Telescope,
    pub dates: Vec<NaiveDate>,
    pub apply_mag_limit: bool,
    pub step_minutes: u32,
    pub duration_minutes: u32,
}

/// Every check that can fail without touching the network.
pub fn validate(config: &PalConfig, today: NaiveDate) -> PalResult<ValidatedRequest> {
    let request = &config.ephemeris;
    let telescope = config.telescope(&request.telescope)?;
    let start = parse_date(&request.start_date)?;
    let end = parse_date(&request.end_date)?;
    let dates = create_dates(start, end, today)?;
    check_interval(request.propagation_interval, config.propagation.duration_minutes)?;

    Ok(ValidatedRequest {
        telescope,
        dates,
        apply_mag_limit: request.mag_lim,
        step_minutes: request.propagation_interval,
        duration_minutes: config.propagation.duration_minutes,
    })
}

pub async fn execute(
    config: &PalConfig,
    transport: Arc<dyn HttpTransport>,
    today: NaiveDate,
    shutdown: &Shutdown,
) -> Result<RunOutcome> {
    let request = validate(config, today)?;
    let telescope = &request.telescope;
    info!(
        "Locating asteroids for {} from {} to {} ({} night(s))",
        telescope.name,
        config.ephemeris.start_date,
        config.ephemeris.end_date,
        request.dates.len()
    );

    let retry = RetryPolicy::new(config.catalog.max_attempts);
    let catalog = CatalogClient::new(Arc::clone(&transport))
        .with_url(config.catalog.url.clone())
        .with_page_size(config.catalog.page_size)
        .with_retry(retry);
    let pipeline = ObservationPipeline::new(catalog, ArtifactStore::new(&config.results_dir));

    let report = pipeline
        .run(&request.dates, telescope, request.apply_mag_limit, shutdown)
        .await?;

    let lowell = LowellClient::new(transport, config.propagation.observatory)
        .with_url(config.propagation.lowell_url.clone())
        .with_retry(retry);
    let store = pipeline.store();
    let mode = config.propagation.mode;
    let observatory = match mode {
        PropagationMode::Lowell => Some(config.propagation.observatory),
        PropagationMode::Rate => None,
    };
    info!("Propagating with {} mode", mode);

    let mut ephemera = Vec::with_capacity(request.dates.len());
    for &date in &request.dates {
        shutdown.check()?;

        let set = store.load_observable(&telescope.slug, date).await?;
        let expected = EphemerisArtifact {
            telescope: telescope.name.clone(),
            date,
            mode,
            step_minutes: request.step_minutes,
            duration_minutes: request.duration_minutes,
            observatory,
            source_queried_at: set.queried_at,
            observable_asteroids: Vec::new(),
        };

        if store.has_ephemeris(&telescope.slug, date) {
            let existing = store.load_ephemeris(&telescope.slug, date).await?;
            if same_inputs(&existing, &expected) {
                info!("Reusing ephemeris for {} on {}", telescope.name, date);
                ephemera.push(store.ephemeris_path(&telescope.slug, date));
                continue;
            }
            warn!(
                "Existing ephemeris for {} was built from other inputs, recomputing",
                date
            );
        }

        let tracks = match mode {
            PropagationMode::Rate => {
                propagate(&set, date, request.step_minutes, request.duration_minutes)?
            }
            PropagationMode::Lowell => {
                propagate_lowell(
                    &lowell,
                    &set,
                    date,
                    request.step_minutes,
                    request.duration_minutes,
                    shutdown,
                )
                .await
                .with_context(|| format!("Lowell propagation failed for {}", date))?
            }
        };

        let artifact = EphemerisArtifact {
            observable_asteroids: tracks,
            ..expected
        };
        ephemera.push(store.save_ephemeris(&telescope.slug, &artifact).await?);
    }

    let (start, end) = match (request.dates.first(), request.dates.last()) {
        (Some(&start), Some(&end)) => (start, end),
        _ => anyhow::bail!("request produced no dates"),
    };
    let run_log = store.write_run_log(telescope, start, end, &ephemera).await?;

    Ok(RunOutcome {
        report,
        ephemera,
        run_log,
    })
}

/// Whether `existing` was built from the same observable set and settings.
fn same_inputs(existing: &EphemerisArtifact, expected: &EphemerisArtifact) -> bool {
    existing.mode == expected.mode
        && existing.step_minutes == expected.step_minutes
        && existing.duration_minutes == expected.duration_minutes
        && existing.observatory == expected.observatory
        && existing.source_queried_at == expected.source_queried_at
}
