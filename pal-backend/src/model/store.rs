use anyhow::{Context, Result};
use chrono::NaiveDate;
use pal_common::{EphemerisArtifact, ObservableSet, Telescope};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const OBSERVABLE_DIR: &str = "observable";
const EPHEMERA_DIR: &str = "ephemera";
const LOGS_DIR: &str = "logs";

/// On-disk artifacts of a run, rooted at the results directory.
///
/// Presence of an artifact is what makes a (telescope, date) pair idempotent,
/// so every write goes through a temporary file and a rename.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the artifact directories if they are missing.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [OBSERVABLE_DIR, EPHEMERA_DIR, LOGS_DIR] {
            let path = self.root.join(dir);
            if !path.exists() {
                fs::create_dir_all(&path)
                    .await
                    .with_context(|| format!("Failed to create directory {:?}", path))?;
                info!("Created results directory: {:?}", path);
            }
        }
        Ok(())
    }

    pub fn observable_path(&self, slug: &str, date: NaiveDate) -> PathBuf {
        self.root.join(OBSERVABLE_DIR).join(artifact_name(slug, date))
    }

    pub fn ephemeris_path(&self, slug: &str, date: NaiveDate) -> PathBuf {
        self.root.join(EPHEMERA_DIR).join(artifact_name(slug, date))
    }

    pub fn run_log_path(&self, telescope: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.root
            .join(LOGS_DIR)
            .join(format!("{}_{}_to_{}.txt", telescope, start, end))
    }

    pub fn has_observable(&self, slug: &str, date: NaiveDate) -> bool {
        self.observable_path(slug, date).is_file()
    }

    pub fn has_ephemeris(&self, slug: &str, date: NaiveDate) -> bool {
        self.ephemeris_path(slug, date).is_file()
    }

    pub async fn load_observable(&self, slug: &str, date: NaiveDate) -> Result<ObservableSet> {
        read_json(&self.observable_path(slug, date)).await
    }

    pub async fn save_observable(&self, slug: &str, set: &ObservableSet) -> Result<PathBuf> {
        let path = self.observable_path(slug, set.date);
        write_json(&path, set).await?;
        debug!("Saved {} observable bodies to {:?}", set.len(), path);
        Ok(path)
    }

    pub async fn load_ephemeris(&self, slug: &str, date: NaiveDate) -> Result<EphemerisArtifact> {
        read_json(&self.ephemeris_path(slug, date)).await
    }

    pub async fn save_ephemeris(
        &self,
        slug: &str,
        artifact: &EphemerisArtifact,
    ) -> Result<PathBuf> {
        let path = self.ephemeris_path(slug, artifact.date);
        write_json(&path, artifact).await?;
        debug!(
            "Saved {} tracks to {:?}",
            artifact.observable_asteroids.len(),
            path
        );
        Ok(path)
    }

    /// Summary of a run: telescope, range and every ephemeris artifact.
    pub async fn write_run_log(
        &self,
        telescope: &Telescope,
        start: NaiveDate,
        end: NaiveDate,
        artifacts: &[PathBuf],
    ) -> Result<PathBuf> {
        let path = self.run_log_path(&telescope.name, start, end);
        let mut content = format!(
            "Telescope: {} ({})\nRange: {} to {}\nEphemeris files:\n",
            telescope.name, telescope.slug, start, end
        );
        for artifact in artifacts {
            content.push_str(&artifact.display().to_string());
            content.push('\n');
        }
        write_atomic(&path, content.as_bytes()).await?;
        info!("Wrote run summary to {:?}", path);
        Ok(path)
    }
}

fn artifact_name(slug: &str, date: NaiveDate) -> String {
    format!("{}_{}.json", slug, date.format("%Y-%m-%d"))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize artifact")?;
    write_atomic(path, content.as_bytes()).await
}

/// Write to a sibling temporary file, then rename over `path`.
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move {:?} into place", tmp))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_common::{MinorPlanet, MinorPlanetRecord, PropagationMode};
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 3, 2).unwrap()
    }

    fn record(id: u64) -> MinorPlanetRecord {
        MinorPlanetRecord {
            id_minorplanet: Some(id),
            minorplanet: MinorPlanet {
                ast_number: Some(id),
                designation: None,
            },
            ra: 0.5,
            ra_rate: 1.0,
            dec: 0.1,
            dec_rate: -1.0,
            v_mag: 16.2,
        }
    }

    #[test]
    fn test_artifact_paths() {
        let store = ArtifactStore::new("results");
        assert_eq!(
            store.observable_path("pf", date()),
            PathBuf::from("results/observable/pf_2027-03-02.json")
        );
        assert_eq!(
            store.ephemeris_path("pf", date()),
            PathBuf::from("results/ephemera/pf_2027-03-02.json")
        );
        assert_eq!(
            store.run_log_path("Pathfinder", date(), date().succ_opt().unwrap()),
            PathBuf::from("results/logs/Pathfinder_2027-03-02_to_2027-03-03.txt")
        );
    }

    #[tokio::test]
    async fn test_observable_round_trip_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.ensure_dirs().await.unwrap();
        assert!(!store.has_observable("pf", date()));

        let set = ObservableSet::new("Pathfinder", date(), vec![record(1), record(2)]);
        let path = store.save_observable("pf", &set).await.unwrap();

        assert!(store.has_observable("pf", date()));
        assert!(!path.with_extension("json.tmp").exists());
        let loaded = store.load_observable("pf", date()).await.unwrap();
        assert_eq!(loaded, set);
    }

    #[tokio::test]
    async fn test_ephemeris_artifact_saved() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let artifact = EphemerisArtifact {
            telescope: "Pathfinder".to_string(),
            date: date(),
            mode: PropagationMode::Rate,
            step_minutes: 30,
            duration_minutes: 600,
            observatory: None,
            source_queried_at: chrono::Utc::now(),
            observable_asteroids: Vec::new(),
        };
        store.save_ephemeris("pf", &artifact).await.unwrap();

        assert!(store.has_ephemeris("pf", date()));
        let loaded = store.load_ephemeris("pf", date()).await.unwrap();
        assert_eq!(loaded.step_minutes, 30);
    }

    #[tokio::test]
    async fn test_run_log_lists_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let telescope = Telescope {
            name: "Pathfinder".to_string(),
            slug: "pf".to_string(),
            latitude: 35.2,
            longitude: -82.87,
            altitude: 892.0,
            dec_min: -20.0,
            dec_max: 72.0,
            limiting_magnitude: 16.0,
            bright_limiting_magnitude: None,
            bright_field: false,
        };

        let artifacts = vec![store.ephemeris_path("pf", date())];
        let path = store
            .write_run_log(&telescope, date(), date(), &artifacts)
            .await
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Telescope: Pathfinder (pf)"));
        assert!(content.contains("Range: 2027-03-02 to 2027-03-02"));
        assert!(content.contains("ephemera/pf_2027-03-02.json"));
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.ensure_dirs().await.unwrap();
        std::fs::write(store.observable_path("pf", date()), "{ not json").unwrap();

        assert!(store.load_observable("pf", date()).await.is_err());
    }
}
