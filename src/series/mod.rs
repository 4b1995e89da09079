pub mod cumulative;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parser::scan::DataRecord;

/// Which per-record number a series carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Views,
    Users,
    ViewSeconds,
}

impl Metric {
    pub fn value(self, record: &DataRecord) -> u64 {
        match self {
            Metric::Views => record.views,
            Metric::Users => record.users,
            Metric::ViewSeconds => record.view_seconds,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Views => "Views",
            Metric::Users => "Users",
            Metric::ViewSeconds => "View Seconds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub date: Option<NaiveDateTime>,
    pub value: u64,
}

/// Series keyed by article identifier, in first-seen order. Points keep scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeriesCollection {
    series: IndexMap<String, Vec<Point>>,
}

impl SeriesCollection {
    pub fn build(records: &[DataRecord], metric: Metric) -> Self {
        let mut series: IndexMap<String, Vec<Point>> = IndexMap::new();
        for record in records {
            series.entry(record.identifier.clone()).or_default().push(Point {
                date: record.date,
                value: metric.value(record),
            });
        }
        Self { series }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Point])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Point>>) {
        self.series.into_iter().unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, views: u64) -> DataRecord {
        DataRecord {
            identifier: id.to_string(),
            views,
            users: views / 2,
            view_seconds: 60,
            date: None,
        }
    }

    fn get<'a>(c: &'a SeriesCollection, id: &str) -> &'a [Point] {
        c.iter().find(|(k, _)| *k == id).map(|(_, v)| v).unwrap()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let records = [record("a", 1), record("b", 2), record("a", 3)];
        let c = SeriesCollection::build(&records, Metric::Views);
        assert_eq!(c.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a", "b"]);
        let a: Vec<u64> = get(&c, "a").iter().map(|p| p.value).collect();
        assert_eq!(a, vec![1, 3]);
        assert_eq!(get(&c, "b").len(), 1);
    }

    #[test]
    fn keeps_scan_order_not_date_order() {
        let mut late = record("a", 1);
        late.date = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        let mut early = record("a", 2);
        early.date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        let c = SeriesCollection::build(&[late.clone(), early.clone()], Metric::Views);
        let dates: Vec<_> = get(&c, "a").iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![late.date, early.date]);
    }

    #[test]
    fn metric_selects_value() {
        let records = [record("a", 10)];
        assert_eq!(get(&SeriesCollection::build(&records, Metric::Users), "a")[0].value, 5);
        assert_eq!(get(&SeriesCollection::build(&records, Metric::ViewSeconds), "a")[0].value, 60);
    }

    #[test]
    fn empty_records() {
        let c = SeriesCollection::build(&[], Metric::Views);
        assert!(c.is_empty());
        assert_eq!(c.into_parts(), (Vec::new(), Vec::new()));
    }
}
