//! Date join, status filtering and per-capita normalization.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::analyzers::types::{
    AggregatedRow, Metric, NormalizedRow, ONE_DOSE_LABEL, VaccinationRate, VaccineStatus,
};
use crate::config::{DegenerateRatePolicy, ReportConfig};
use crate::error::{ReportError, Result};

/// Events per `per_population` people within a vaccination subgroup.
///
/// The subgroup size is estimated as `population` times the subgroup's share
/// of the population-wide `rate_percent`:
/// - fully vaccinated: `value * per_population / (population * rate/100)`
/// - unvaccinated: `value * per_population / (population * (1 - rate/100))`
///
/// Returns `None` when that share is not in `(0, 1]`, e.g. a 0% rate for
/// the fully vaccinated or 100% for the unvaccinated.
pub fn normalize_rate(
    status: VaccineStatus,
    value: f64,
    rate_percent: f64,
    population: u64,
    per_population: u64,
) -> Option<f64> {
    let share = status.population_share(rate_percent);
    if !(share > 0.0 && share <= 1.0) {
        return None;
    }
    Some(value * per_population as f64 / (population as f64 * share))
}

/// Inner-joins `rows` with `rates` on date, drops the one-dose category and
/// any label outside the compared subgroups, and normalizes each count.
///
/// # Errors
///
/// - [`ReportError::JoinMismatch`] if no row shares a date with `rates`.
/// - [`ReportError::Math`] for a degenerate rate under
///   [`DegenerateRatePolicy::Fail`].
pub fn normalize(
    metric: Metric,
    rows: &[AggregatedRow],
    rates: &[VaccinationRate],
    config: &ReportConfig,
) -> Result<Vec<NormalizedRow>> {
    let mut by_date: BTreeMap<chrono::NaiveDate, &VaccinationRate> = BTreeMap::new();
    for rate in rates {
        if by_date.insert(rate.date, rate).is_some() {
            warn!(date = %rate.date, "Duplicate vaccination-rate date, keeping the last row");
        }
    }

    let joined: Vec<(&AggregatedRow, &VaccinationRate)> = rows
        .iter()
        .filter_map(|row| by_date.get(&row.date).map(|rate| (row, *rate)))
        .collect();

    if joined.is_empty() {
        return Err(ReportError::JoinMismatch {
            metric: metric.to_string(),
        });
    }

    let unmatched: BTreeSet<_> = rows
        .iter()
        .filter(|row| !by_date.contains_key(&row.date))
        .map(|row| row.date)
        .collect();
    if !unmatched.is_empty() {
        warn!(
            %metric,
            dropped_dates = unmatched.len(),
            first = %unmatched.first().map(|d| d.to_string()).unwrap_or_default(),
            last = %unmatched.last().map(|d| d.to_string()).unwrap_or_default(),
            "Dates without a vaccination rate dropped by the join"
        );
    }

    let mut one_dose = 0usize;
    let mut unknown_labels = BTreeSet::new();
    let mut out = Vec::with_capacity(joined.len());

    for (row, rate) in joined {
        let Some(status) = VaccineStatus::translate(&row.status) else {
            if row.status.trim() == ONE_DOSE_LABEL {
                one_dose += 1;
            } else {
                unknown_labels.insert(row.status.as_str());
            }
            continue;
        };

        let normalized = match normalize_rate(
            status,
            row.value,
            rate.rate_total,
            config.population,
            config.per_population,
        ) {
            Some(v) => v,
            None => match config.degenerate_rate {
                DegenerateRatePolicy::Fail => {
                    return Err(ReportError::Math {
                        date: row.date,
                        status: status.to_string(),
                        rate: rate.rate_total,
                    });
                }
                DegenerateRatePolicy::Drop => {
                    warn!(%metric, date = %row.date, %status, rate = rate.rate_total, "Degenerate vaccination rate, row dropped");
                    continue;
                }
            },
        };

        out.push(NormalizedRow {
            date: row.date,
            status,
            value: row.value,
            rate_total: rate.rate_total,
            rate_12plus: rate.rate_12plus,
            normalized,
        });
    }

    debug!(%metric, one_dose, "One-dose rows excluded");
    if !unknown_labels.is_empty() {
        warn!(%metric, labels = ?unknown_labels, "Unrecognized vaccination status labels excluded");
    }

    Ok(out)
}
