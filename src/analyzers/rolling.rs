use std::collections::BTreeMap;

use crate::analyzers::types::{NormalizedRow, SeriesRow, VaccineStatus};
use crate::analyzers::utility::mean;

/// Attaches trailing means of the normalized rate for every window in
/// `1..=max_window`.
///
/// Means are taken within each status group over the group's last `w`
/// samples in date order. The first `w - 1` samples of a group have no
/// `w`-day mean. Output is ordered by date, then status.
pub fn rolling_averages(rows: Vec<NormalizedRow>, max_window: usize) -> Vec<SeriesRow> {
    let mut groups: BTreeMap<VaccineStatus, Vec<NormalizedRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.status).or_default().push(row);
    }

    let mut out = Vec::new();
    for (_, mut group) in groups {
        group.sort_by_key(|row| row.date);
        let values: Vec<f64> = group.iter().map(|row| row.normalized).collect();

        for (i, row) in group.into_iter().enumerate() {
            let moving_averages = (1..=max_window)
                .map(|w| {
                    if i + 1 < w {
                        None
                    } else {
                        mean(&values[i + 1 - w..=i])
                    }
                })
                .collect();

            out.push(SeriesRow {
                date: row.date,
                status: row.status,
                value: row.value,
                rate_total: row.rate_total,
                rate_12plus: row.rate_12plus,
                normalized: row.normalized,
                moving_averages,
            });
        }
    }

    out.sort_by_key(|row| (row.date, row.status));
    out
}
