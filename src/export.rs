use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::chart::ChartData;
use crate::parser::scan::ScanStats;
use crate::series::{Metric, Point};

#[derive(Debug, Serialize)]
pub struct ExportDoc<'a> {
    pub metric: Metric,
    pub cumulative: bool,
    pub stats: &'a ScanStats,
    pub titles: &'a [String],
    pub series: &'a [Vec<Point>],
}

impl<'a> ExportDoc<'a> {
    pub fn new(chart: &'a ChartData, stats: &'a ScanStats, metric: Metric, cumulative: bool) -> Self {
        Self {
            metric,
            cumulative,
            stats,
            titles: &chart.titles,
            series: &chart.series,
        }
    }
}

/// Pretty JSON to `out`, or stdout when no path is given.
pub fn write_json(out: Option<&Path>, doc: &ExportDoc<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(doc).context("Failed to serialize chart data")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")
        }
    }
}
