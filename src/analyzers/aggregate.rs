use crate::analyzers::types::{AggregatedRow, RawRecord};
use std::collections::BTreeMap;

/// Sums raw records per `(date, status label)`, collapsing every other
/// dimension. Labels are kept verbatim, including ones later filtered out.
/// Blank counts add nothing, so a key whose counts are all blank sums to 0.
///
/// Output is ordered by date, then label.
pub fn aggregate(records: &[RawRecord]) -> Vec<AggregatedRow> {
    let mut sums: BTreeMap<(chrono::NaiveDate, &str), f64> = BTreeMap::new();

    for record in records {
        *sums.entry((record.date, record.status.as_str())).or_default() += record.value.unwrap_or(0.0);
    }

    sums.into_iter()
        .map(|((date, status), value)| AggregatedRow {
            date,
            status: status.to_string(),
            value,
        })
        .collect()
}
