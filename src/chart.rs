use serde::Serialize;

use crate::parser::scan::DataRecord;
use crate::series::{cumulative, Metric, Point, SeriesCollection};

/// What the renderer gets: titles and series, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub titles: Vec<String>,
    pub series: Vec<Vec<Point>>,
}

impl ChartData {
    pub fn build(records: &[DataRecord], metric: Metric, cumulative: bool) -> Self {
        let collection = SeriesCollection::build(records, metric);
        if !cumulative {
            let (titles, series) = collection.into_parts();
            return Self { titles, series };
        }
        if collection.is_empty() {
            return Self::default();
        }

        let (mut titles, mut series): (Vec<String>, Vec<Vec<Point>>) = cumulative::per_identifier(&collection)
            .into_iter()
            .map(|(id, points)| (format!("{id} Cumulative"), points))
            .unzip();
        titles.push(cumulative::total_title(metric));
        series.push(cumulative::global_total(records, metric));
        Self { titles, series }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Subset picked by `selection`, kept in index order.
    pub fn select(&self, selection: &Selection) -> ChartData {
        let mut picked = ChartData::default();
        for idx in selection.indices(self.len()) {
            picked.titles.push(self.titles[idx].clone());
            picked.series.push(self.series[idx].clone());
        }
        picked
    }
}

/// The legend entries a viewer has ticked. Owned by one request, never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(Vec<usize>),
}

impl Selection {
    /// Parse `"0,2,5"`. Tokens that are not indices are skipped; an empty
    /// string selects nothing.
    pub fn parse(raw: &str) -> Self {
        Selection::Only(
            raw.split(',')
                .filter_map(|t| t.trim().parse::<usize>().ok())
                .collect(),
        )
    }

    pub fn contains(&self, idx: usize) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => v.contains(&idx),
        }
    }

    /// Sorted, deduplicated, in-range indices.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        (0..len).filter(|&i| self.contains(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2020, 1, day).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn record(id: &str, views: u64, date: Option<NaiveDateTime>) -> DataRecord {
        DataRecord {
            identifier: id.to_string(),
            views,
            users: 0,
            view_seconds: 0,
            date,
        }
    }

    fn values(points: &[Point]) -> Vec<u64> {
        points.iter().map(|p| p.value).collect()
    }

    #[test]
    fn plain_mode() {
        let records = [record("a", 1, at(1)), record("b", 2, at(1)), record("a", 3, at(2))];
        let chart = ChartData::build(&records, Metric::Views, false);
        assert_eq!(chart.titles, vec!["a", "b"]);
        assert_eq!(values(&chart.series[0]), vec![1, 3]);
        assert_eq!(values(&chart.series[1]), vec![2]);
    }

    #[test]
    fn cumulative_mode_titles_and_total() {
        let records = [record("a", 10, at(1)), record("b", 10, at(1)), record("a", 5, at(2))];
        let chart = ChartData::build(&records, Metric::Views, true);
        assert_eq!(chart.titles, vec!["a Cumulative", "b Cumulative", "Total Cumulative Views"]);
        assert_eq!(values(&chart.series[0]), vec![10, 15]);
        assert_eq!(values(&chart.series[2]), vec![20, 25]);
        assert_eq!(chart.series.len(), chart.titles.len());
    }

    #[test]
    fn empty_input_stays_empty_in_both_modes() {
        assert!(ChartData::build(&[], Metric::Views, false).is_empty());
        let chart = ChartData::build(&[], Metric::Views, true);
        assert!(chart.is_empty());
        assert!(chart.series.is_empty());
    }

    #[test]
    fn selection_parse() {
        assert_eq!(Selection::parse("0, 2,x,5"), Selection::Only(vec![0, 2, 5]));
        assert_eq!(Selection::parse(""), Selection::Only(vec![]));
    }

    #[test]
    fn select_subset_in_index_order() {
        let records = [record("a", 1, None), record("b", 2, None), record("c", 3, None)];
        let chart = ChartData::build(&records, Metric::Views, false);
        let picked = chart.select(&Selection::Only(vec![2, 0, 2, 9]));
        assert_eq!(picked.titles, vec!["a", "c"]);
        assert_eq!(values(&picked.series[1]), vec![3]);
        assert_eq!(chart.select(&Selection::All), chart);
        assert!(chart.select(&Selection::parse("")).is_empty());
    }
}
