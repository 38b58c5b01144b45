//! Data types shared by the aggregation and normalization stages.

use chrono::NaiveDate;
use std::fmt;

use crate::config::{ReportConfig, SourceConfig};

/// Source label for people with one dose; excluded from every comparison.
pub const ONE_DOSE_LABEL: &str = "Vacciné 1 dose";
const UNVACCINATED_LABEL: &str = "Non-vacciné";
const FULLY_VACCINATED_LABEL: &str = "Vacciné 2 doses";

/// The event being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Hospitalizations,
    Cases,
}

impl Metric {
    /// Report panel order: hospitalizations on the left, cases on the right.
    pub const ALL: [Metric; 2] = [Metric::Hospitalizations, Metric::Cases];

    /// Name of the count column in the source CSV.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Hospitalizations => "Nb_Nvelles_Hosp",
            Metric::Cases => "Nb_Nvx_Cas",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Hospitalizations => "hospitalizations",
            Metric::Cases => "cases",
        }
    }

    pub fn panel_title(self, window: usize, per_population: u64) -> String {
        let what = match self {
            Metric::Hospitalizations => "New Hospitalizations",
            Metric::Cases => "New Cases",
        };
        format!(
            "{what} per {} ({window}-day Moving Avg)",
            group_thousands(per_population)
        )
    }

    pub fn axis_title(self) -> &'static str {
        match self {
            Metric::Hospitalizations => "Daily Hospitalizations",
            Metric::Cases => "Daily Cases",
        }
    }

    pub fn source(self, config: &ReportConfig) -> &SourceConfig {
        match self {
            Metric::Hospitalizations => &config.hospitalizations,
            Metric::Cases => &config.cases,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// The two vaccination subgroups compared in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VaccineStatus {
    Unvaccinated,
    FullyVaccinated,
}

impl VaccineStatus {
    pub const ALL: [VaccineStatus; 2] = [VaccineStatus::Unvaccinated, VaccineStatus::FullyVaccinated];

    pub fn label(self) -> &'static str {
        match self {
            VaccineStatus::Unvaccinated => "Unvaccinated",
            VaccineStatus::FullyVaccinated => "Fully Vaccinated (2 doses)",
        }
    }

    /// Maps a source (French) label to a retained status. One-dose and
    /// unrecognized labels yield `None`.
    pub fn translate(source_label: &str) -> Option<Self> {
        match source_label.trim() {
            UNVACCINATED_LABEL => Some(VaccineStatus::Unvaccinated),
            FULLY_VACCINATED_LABEL => Some(VaccineStatus::FullyVaccinated),
            _ => None,
        }
    }

    /// Fraction of the population in this subgroup, estimated from the
    /// population-wide vaccination rate (percent).
    pub fn population_share(self, rate_percent: f64) -> f64 {
        let rate = rate_percent / 100.0;
        match self {
            VaccineStatus::FullyVaccinated => rate,
            VaccineStatus::Unvaccinated => 1.0 - rate,
        }
    }
}

impl fmt::Display for VaccineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One source row: a count for a day, a status and some other dimension
/// (age group) that aggregation sums away. `value` is `None` for a blank
/// count cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub status: String,
    pub value: Option<f64>,
}

/// Population-wide vaccination rates (percent) for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VaccinationRate {
    pub date: NaiveDate,
    pub rate_total: f64,
    pub rate_12plus: Option<f64>,
}

/// Summed count for a `(date, source status label)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub date: NaiveDate,
    pub status: String,
    pub value: f64,
}

/// An aggregated row joined with its day's vaccination rate and normalized
/// per capita within its subgroup.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub status: VaccineStatus,
    pub value: f64,
    pub rate_total: f64,
    pub rate_12plus: Option<f64>,
    pub normalized: f64,
}

/// A normalized day for one subgroup, with its rolling averages.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub date: NaiveDate,
    pub status: VaccineStatus,
    pub value: f64,
    pub rate_total: f64,
    pub rate_12plus: Option<f64>,
    pub normalized: f64,
    /// Index `w - 1` holds the `w`-day trailing mean; `None` until the group
    /// has `w` samples.
    pub moving_averages: Vec<Option<f64>>,
}

impl SeriesRow {
    pub fn moving_average(&self, window: usize) -> Option<f64> {
        let idx = window.checked_sub(1)?;
        self.moving_averages.get(idx).copied().flatten()
    }
}

/// Fully processed series for one metric, ordered by date then status.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: Metric,
    pub max_window: usize,
    pub rows: Vec<SeriesRow>,
}

impl MetricSeries {
    /// `(date, w-day average)` points for one subgroup, skipping days where
    /// the average is undefined.
    pub fn points(
        &self,
        status: VaccineStatus,
        window: usize,
    ) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.status == status)
            .filter_map(move |row| row.moving_average(window).map(|v| (row.date, v)))
    }

    pub fn statuses(&self) -> Vec<VaccineStatus> {
        VaccineStatus::ALL
            .into_iter()
            .filter(|s| self.rows.iter().any(|row| row.status == *s))
            .collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_labels() {
        assert_eq!(
            VaccineStatus::translate("Non-vacciné"),
            Some(VaccineStatus::Unvaccinated)
        );
        assert_eq!(
            VaccineStatus::translate(" Vacciné 2 doses "),
            Some(VaccineStatus::FullyVaccinated)
        );
        assert_eq!(VaccineStatus::translate(ONE_DOSE_LABEL), None);
        assert_eq!(VaccineStatus::translate("Vacciné 3 doses"), None);
    }

    #[test]
    fn test_population_share() {
        assert_eq!(VaccineStatus::FullyVaccinated.population_share(75.0), 0.75);
        assert_eq!(VaccineStatus::Unvaccinated.population_share(75.0), 0.25);
    }

    #[test]
    fn test_panel_title() {
        assert_eq!(
            Metric::Hospitalizations.panel_title(7, 100_000),
            "New Hospitalizations per 100,000 (7-day Moving Avg)"
        );
        assert_eq!(
            Metric::Cases.panel_title(14, 1_000_000),
            "New Cases per 1,000,000 (14-day Moving Avg)"
        );
        assert_eq!(group_thousands(100), "100");
    }

    #[test]
    fn test_moving_average_lookup() {
        let row = SeriesRow {
            date: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            status: VaccineStatus::Unvaccinated,
            value: 1.0,
            rate_total: 50.0,
            rate_12plus: None,
            normalized: 2.0,
            moving_averages: vec![Some(2.0), None],
        };
        assert_eq!(row.moving_average(1), Some(2.0));
        assert_eq!(row.moving_average(2), None);
        assert_eq!(row.moving_average(0), None);
        assert_eq!(row.moving_average(3), None);
    }
}
