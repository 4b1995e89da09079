pub mod lines;
pub mod normalize;
pub mod scan;

use tracing::debug;

use crate::chart::ChartData;
use crate::series::Metric;
use scan::{DataRecord, ScanStats};

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub cumulative: bool,
    pub metric: Metric,
}

pub struct Analysis {
    pub records: Vec<DataRecord>,
    pub stats: ScanStats,
    pub chart: ChartData,
}

/// Full pipeline for one digest: lines → classified → scanned records → chart series.
pub fn analyze(text: &str, options: &Options) -> Analysis {
    let classified = lines::classify_lines(text);
    let (records, stats) = scan::scan_lines(&classified);
    let chart = ChartData::build(&records, options.metric, options.cumulative);
    debug!(
        records = stats.records,
        dropped = stats.dropped,
        failed_dates = stats.failed_dates,
        series = chart.len(),
        "Analyzed digest"
    );
    Analysis { records, stats, chart }
}
