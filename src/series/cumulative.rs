use chrono::NaiveDateTime;
use indexmap::IndexMap;

use super::{Metric, Point, SeriesCollection};
use crate::parser::scan::DataRecord;

/// Prefix sum of `points`, each entry keeping its own date.
pub fn running_sum(points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .scan(0u64, |total, p| {
            *total = total.saturating_add(p.value);
            Some(Point {
                date: p.date,
                value: *total,
            })
        })
        .collect()
}

/// Running sums per identifier, same order as `collection`.
pub fn per_identifier(collection: &SeriesCollection) -> Vec<(String, Vec<Point>)> {
    collection
        .iter()
        .map(|(id, points)| (id.to_string(), running_sum(points)))
        .collect()
}

/// Sum values per exact date across all records, then accumulate over the
/// distinct dates in the order they first appear in the scan.
/// Records without a date have no key and are left out.
pub fn global_total(records: &[DataRecord], metric: Metric) -> Vec<Point> {
    let mut by_date: IndexMap<NaiveDateTime, u64> = IndexMap::new();
    for record in records {
        if let Some(date) = record.date {
            let sum = by_date.entry(date).or_insert(0);
            *sum = sum.saturating_add(metric.value(record));
        }
    }

    let points: Vec<Point> = by_date
        .into_iter()
        .map(|(date, value)| Point {
            date: Some(date),
            value,
        })
        .collect();
    running_sum(&points)
}

pub fn total_title(metric: Metric) -> String {
    format!("Total Cumulative {}", metric.label())
}
