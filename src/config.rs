//! Run configuration.
//!
//! Defaults reproduce the published Québec report. A JSON file may override
//! any subset of fields:
//! ```json
//! {
//!   "population": 8604495,
//!   "display_window": 7,
//!   "output_path": "report.html",
//!   "vaccination": { "file": "data/vaccination.csv" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

const DATA_BASE_URL: &str = "https://msss.gouv.qc.ca/professionnels/statistiques/documents/covid19";
const HOSP_FILE: &str = "COVID19_Qc_RapportINSPQ_HospitalisationsSelonStatutVaccinalEtAge.csv";
const CASES_FILE: &str = "COVID19_Qc_RapportINSPQ_CasSelonStatutVaccinalEtAge.csv";

/// A remote dataset and the local file it is saved to. When a config file
/// overrides a source it must give both `url` and `file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub file: PathBuf,
}

/// The vaccination-rate dataset has no stable download URL. It must be
/// exported by hand from `download_page` (figure 2.1, "Télécharger les
/// données en format CSV") and saved at `file`. Expected columns are
/// `Date de vaccination`, `Ensemble du Québec` and `12 ans et plus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaccinationSource {
    pub file: PathBuf,
    pub download_page: String,
}

impl Default for VaccinationSource {
    fn default() -> Self {
        Self {
            file: PathBuf::from("vaccination.csv"),
            download_page: "https://www.inspq.qc.ca/covid-19/donnees/vaccination".to_string(),
        }
    }
}

/// What to do when a vaccination rate leaves a subgroup with no population
/// (0% for fully vaccinated, 100% for unvaccinated).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateRatePolicy {
    /// Abort the run with a math error.
    #[default]
    Fail,
    /// Skip the affected rows and keep going.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub hospitalizations: SourceConfig,
    pub cases: SourceConfig,
    pub vaccination: VaccinationSource,
    /// Total population of the region.
    pub population: u64,
    /// Rates are expressed per this many people.
    pub per_population: u64,
    /// Rolling averages are computed for every window in `1..=max_window` days.
    pub max_window: usize,
    /// The rolling-average window plotted in the report.
    pub display_window: usize,
    pub output_path: PathBuf,
    pub plotly_js_url: String,
    pub degenerate_rate: DegenerateRatePolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            hospitalizations: SourceConfig {
                url: format!("{DATA_BASE_URL}/{HOSP_FILE}"),
                file: PathBuf::from(HOSP_FILE),
            },
            cases: SourceConfig {
                url: format!("{DATA_BASE_URL}/{CASES_FILE}"),
                file: PathBuf::from(CASES_FILE),
            },
            vaccination: VaccinationSource::default(),
            population: 8_604_495,
            per_population: 100_000,
            max_window: 14,
            display_window: 7,
            output_path: ["..", "assets", "figures", "Hosps_and_cases_vs_vacc_rate.html"]
                .iter()
                .collect(),
            plotly_js_url: "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string(),
            degenerate_rate: DegenerateRatePolicy::Fail,
        }
    }
}

impl ReportConfig {
    /// Loads a config from a JSON file at `path`. Absent top-level fields
    /// keep their defaults; a `hospitalizations` or `cases` object replaces
    /// the whole source and needs both `url` and `file`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(ReportError::Config("population must be positive".into()));
        }
        if self.per_population == 0 {
            return Err(ReportError::Config("per_population must be positive".into()));
        }
        if self.max_window == 0 {
            return Err(ReportError::Config("max_window must be at least 1".into()));
        }
        if self.display_window == 0 || self.display_window > self.max_window {
            return Err(ReportError::Config(format!(
                "display_window must be within 1..={}, got {}",
                self.max_window, self.display_window
            )));
        }
        Ok(())
    }
}
