use anyhow::{Context, Result};
use chrono::NaiveDate;
use pal_common::{ObservableSet, Telescope};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::model::astorb::CatalogClient;
use crate::model::sky::compute_window;
use crate::model::store::ArtifactStore;
use crate::shutdown::Shutdown;

/// Magnitude ceiling when no limit is requested; fainter than anything catalogued.
pub const NO_MAG_LIMIT: f64 = 30.0;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineReport {
    /// Observable-set artifact per processed date, in date order
    pub files: Vec<PathBuf>,
    pub fresh_dates: usize,
    pub cached_dates: usize,
    pub fresh_bodies: usize,
    pub cached_bodies: usize,
}

impl PipelineReport {
    pub fn total_bodies(&self) -> usize {
        self.fresh_bodies + self.cached_bodies
    }

    pub fn summary(&self) -> String {
        if self.fresh_dates == 0 && self.cached_dates > 0 {
            format!(
                "All {} date(s) already queried; {} cached bodies, no new queries",
                self.cached_dates, self.cached_bodies
            )
        } else if self.total_bodies() == 0 {
            format!(
                "Queried {} date(s), no observable bodies found",
                self.fresh_dates
            )
        } else {
            format!(
                "Found {} observable bodies ({} fresh over {} date(s), {} cached over {} date(s))",
                self.total_bodies(),
                self.fresh_bodies,
                self.fresh_dates,
                self.cached_bodies,
                self.cached_dates
            )
        }
    }
}

/// Catalog query loop over a date range, one persisted set per date.
pub struct ObservationPipeline {
    catalog: CatalogClient,
    store: ArtifactStore,
}

impl ObservationPipeline {
    pub fn new(catalog: CatalogClient, store: ArtifactStore) -> Self {
        Self { catalog, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Query every date not yet on disk, strictly in order.
    ///
    /// A failing date aborts the run; sets written for earlier dates stay.
    pub async fn run(
        &self,
        dates: &[NaiveDate],
        telescope: &Telescope,
        apply_mag_limit: bool,
        shutdown: &Shutdown,
    ) -> Result<PipelineReport> {
        self.store.ensure_dirs().await?;

        let mag_limit = if apply_mag_limit {
            telescope.mag_limit()
        } else {
            NO_MAG_LIMIT
        };
        let mut report = PipelineReport::default();

        for &date in dates {
            shutdown.check()?;

            if self.store.has_observable(&telescope.slug, date) {
                let set = self.store.load_observable(&telescope.slug, date).await?;
                info!(
                    "{} already queried for {}: {} cached bodies",
                    date,
                    telescope.name,
                    set.len()
                );
                report.cached_dates += 1;
                report.cached_bodies += set.len();
                report.files.push(self.store.observable_path(&telescope.slug, date));
                continue;
            }

            let window = compute_window(telescope, date)
                .with_context(|| format!("Failed to compute sky window for {}", date))?;
            info!(
                "Querying {} for {}: RA [{:.4}, {:.4}] Dec [{:.4}, {:.4}] rad{}",
                date,
                telescope.name,
                window.ra_min,
                window.ra_max,
                window.dec_min,
                window.dec_max,
                if window.wraps { " (wraps)" } else { "" }
            );

            let records = self
                .catalog
                .fetch(&window, date, mag_limit)
                .await
                .with_context(|| format!("Catalog query failed for {}", date))?;

            let set = ObservableSet::new(&telescope.name, date, records);
            let path = self.store.save_observable(&telescope.slug, &set).await?;
            if set.is_empty() {
                warn!("No observable bodies for {} on {}", telescope.name, date);
            } else {
                info!("{} observable bodies on {} -> {:?}", set.len(), date, path);
            }

            report.fresh_dates += 1;
            report.fresh_bodies += set.len();
            report.files.push(path);
        }

        info!("{}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PalError;
    use crate::model::http::testing::{catalog_page, ScriptedTransport};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn pathfinder() -> Telescope {
        Telescope {
            name: "Pathfinder".to_string(),
            slug: "pf".to_string(),
            latitude: 35.2,
            longitude: -82.87,
            altitude: 892.0,
            dec_min: -20.0,
            dec_max: 72.0,
            limiting_magnitude: 16.0,
            bright_limiting_magnitude: Some(14.5),
            bright_field: true,
        }
    }

    fn dates() -> Vec<NaiveDate> {
        vec![
            NaiveDate::from_ymd_opt(2027, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2027, 1, 16).unwrap(),
        ]
    }

    fn pipeline(transport: &Arc<ScriptedTransport>, dir: &TempDir) -> ObservationPipeline {
        let catalog = CatalogClient::new(transport.clone()).with_url("http://catalog.test/graphql");
        ObservationPipeline::new(catalog, ArtifactStore::new(dir.path()))
    }

    #[tokio::test]
    async fn test_second_run_issues_no_queries() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(200, catalog_page(1, 4)).push(200, catalog_page(7, 2));

        let first = pipeline(&transport, &dir)
            .run(&dates(), &pathfinder(), true, &Shutdown::new())
            .await
            .unwrap();
        assert_eq!(transport.request_count(), 2);
        assert_eq!(first.fresh_dates, 2);
        assert_eq!(first.total_bodies(), 6);
        let before: Vec<String> = first
            .files
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();

        let second = pipeline(&transport, &dir)
            .run(&dates(), &pathfinder(), true, &Shutdown::new())
            .await
            .unwrap();
        assert_eq!(transport.request_count(), 2);
        assert_eq!(second.fresh_dates, 0);
        assert_eq!(second.cached_dates, 2);
        assert_eq!(second.cached_bodies, 6);
        assert!(second.summary().contains("already queried"));

        let after: Vec<String> = second
            .files
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_magnitude_ceiling_follows_flag() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(200, catalog_page(1, 1)).push(200, catalog_page(1, 1));
        let pipeline = pipeline(&transport, &dir);

        pipeline
            .run(&dates()[..1], &pathfinder(), true, &Shutdown::new())
            .await
            .unwrap();
        pipeline
            .run(&dates()[1..], &pathfinder(), false, &Shutdown::new())
            .await
            .unwrap();

        let queries: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.body.as_ref().unwrap()["query"].as_str().unwrap().to_string())
            .collect();
        assert!(queries[0].contains(r#"{_lte: "14.5"}"#));
        assert!(queries[1].contains(r#"{_lte: "30"}"#));
    }

    #[tokio::test]
    async fn test_empty_fresh_result_is_reported_distinctly() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(200, catalog_page(1, 0));

        let report = pipeline(&transport, &dir)
            .run(&dates()[..1], &pathfinder(), true, &Shutdown::new())
            .await
            .unwrap();

        assert_eq!(report.total_bodies(), 0);
        assert!(report.summary().contains("no observable bodies"));
        assert!(dir.path().join("observable/pf_2027-01-15.json").is_file());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_aborts_and_keeps_earlier_dates() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(200, catalog_page(1, 3));
        for _ in 0..5 {
            transport.push(504, "Gateway Timeout");
        }

        let err = pipeline(&transport, &dir)
            .run(&dates(), &pathfinder(), true, &Shutdown::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PalError>(),
            Some(PalError::CatalogUnavailable { attempts: 5, .. })
        ));
        assert_eq!(transport.request_count(), 6);
        assert!(dir.path().join("observable/pf_2027-01-15.json").is_file());
        assert!(!dir.path().join("observable/pf_2027-01-16.json").exists());
    }

    #[tokio::test]
    async fn test_cancelled_before_first_date() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let shutdown = Shutdown::new();
        shutdown.request();

        let err = pipeline(&transport, &dir)
            .run(&dates(), &pathfinder(), true, &shutdown)
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<PalError>(), Some(PalError::Cancelled)));
        assert_eq!(transport.request_count(), 0);
    }
}
