mod chart;
mod export;
mod parser;
mod render;
mod series;
mod server;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use parser::{analyze, Analysis, Options};
use series::Metric;

#[derive(Parser)]
#[command(name = "article_stats", about = "Chart per-article stats from an articles digest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SeriesArgs {
    /// Raw digest text copied from chat
    input: PathBuf,
    /// Running totals per article plus a global total
    #[arg(short, long)]
    cumulative: bool,
    /// Which number to chart
    #[arg(short, long, value_enum, default_value_t = Metric::Views)]
    metric: Metric,
}

impl SeriesArgs {
    fn options(&self) -> Options {
        Options {
            cumulative: self.cumulative,
            metric: self.metric,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the chart page with a selectable legend
    Serve {
        #[command(flatten)]
        series: SeriesArgs,
        /// Hide the legend checkboxes
        #[arg(short = 'n', long)]
        no_checkbox: bool,
        #[arg(long)]
        address: Option<String>,
        /// First port to try; busy ports are skipped
        #[arg(short, long)]
        port: Option<u16>,
        /// How many ports to try before giving up
        #[arg(long)]
        attempts: Option<u32>,
    },
    /// Print a per-article table
    Summary {
        #[command(flatten)]
        series: SeriesArgs,
    },
    /// Write titles and series as JSON
    Export {
        #[command(flatten)]
        series: SeriesArgs,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Summarize many digests, each on its own
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Metric::Views)]
        metric: Metric,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            series,
            no_checkbox,
            address,
            port,
            attempts,
        } => {
            let mut settings = settings::load()?;
            if let Some(address) = address {
                settings.address = address;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(attempts) = attempts {
                settings.attempts = attempts;
            }

            let analysis = load_digest(&series.input, &series.options())?;
            if analysis.chart.is_empty() {
                warn!("No article lines found in {:?}; serving an empty chart", series.input);
            }
            let state = Arc::new(server::AppState {
                chart: analysis.chart,
                y_label: series.metric.label().to_lowercase(),
                legend_form: !no_checkbox,
            });
            server::serve(state, &settings).await
        }
        Commands::Summary { series } => {
            let analysis = load_digest(&series.input, &series.options())?;
            if analysis.chart.is_empty() {
                println!("No article lines found.");
                return Ok(());
            }
            print_summary(&analysis, &series.options());
            Ok(())
        }
        Commands::Export { series, out } => {
            let analysis = load_digest(&series.input, &series.options())?;
            let doc = export::ExportDoc::new(
                &analysis.chart,
                &analysis.stats,
                series.metric,
                series.cumulative,
            );
            export::write_json(out.as_deref(), &doc)?;
            if let Some(path) = out {
                println!("Wrote {} series to {:?}", analysis.chart.len(), path);
            }
            Ok(())
        }
        Commands::Batch { inputs, metric } => {
            let rows = summarize_files(&inputs, metric);
            print_batch(&rows, metric);

            let elapsed = t0.elapsed();
            if elapsed.as_secs() >= 1 {
                println!("\nDone in {:.1}s", elapsed.as_secs_f64());
            }
            Ok(())
        }
    }
}

fn load_digest(path: &Path, options: &Options) -> Result<Analysis> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let analysis = analyze(&text, options);
    info!(
        "Read {} records for {} articles from {:?} ({} dropped, {} bad dates)",
        analysis.stats.records,
        article_count(&analysis),
        path,
        analysis.stats.dropped,
        analysis.stats.failed_dates,
    );
    Ok(analysis)
}

fn article_count(analysis: &Analysis) -> usize {
    let mut seen: Vec<&str> = analysis.records.iter().map(|r| r.identifier.as_str()).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn print_summary(analysis: &Analysis, options: &Options) {
    let total_header = if options.cumulative { "Final" } else { "Total" };
    println!(
        "{:>3} | {:<40} | {:>6} | {:<10} | {:<10} | {:>10}",
        "#", "Article", "Points", "First", "Last", total_header
    );
    println!("{}", "-".repeat(94));

    for (i, (title, points)) in analysis.chart.titles.iter().zip(&analysis.chart.series).enumerate() {
        let mut dated = points.iter().filter_map(|p| p.date);
        let first = dated.next();
        let last = dated.last().or(first);
        let total = series_total(points, options.cumulative);

        println!(
            "{:>3} | {:<40} | {:>6} | {:<10} | {:<10} | {:>10}",
            i + 1,
            truncate(title, 40),
            points.len(),
            format_date(first),
            format_date(last),
            total
        );
    }

    let s = &analysis.stats;
    println!(
        "\n{} lines: {} report headers ({} unparseable), {} records, {} dropped, {} ignored",
        s.lines,
        s.date_lines,
        s.failed_dates,
        s.records,
        s.dropped,
        s.ignored()
    );
}

/// Final value of a running series, or the saturating sum of a plain one.
fn series_total(points: &[series::Point], cumulative: bool) -> u64 {
    if cumulative {
        points.last().map_or(0, |p| p.value)
    } else {
        points.iter().fold(0u64, |acc, p| acc.saturating_add(p.value))
    }
}

struct BatchRow {
    path: PathBuf,
    outcome: Result<(parser::scan::ScanStats, usize, u64)>,
}

/// Each digest is analyzed independently; no state crosses files.
fn summarize_files(paths: &[PathBuf], metric: Metric) -> Vec<BatchRow> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(paths.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let options = Options {
        cumulative: false,
        metric,
    };
    let rows = paths
        .par_iter()
        .map(|path| {
            let outcome = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))
                .map(|text| {
                    let analysis = analyze(&text, &options);
                    let total = analysis
                        .records
                        .iter()
                        .fold(0u64, |acc, r| acc.saturating_add(metric.value(r)));
                    (analysis.stats, analysis.chart.len(), total)
                });
            if let Err(e) = &outcome {
                warn!("{:#}", e);
            }
            pb.inc(1);
            BatchRow {
                path: path.clone(),
                outcome,
            }
        })
        .collect();

    pb.finish_and_clear();
    rows
}

fn print_batch(rows: &[BatchRow], metric: Metric) {
    println!(
        "{:<40} | {:>8} | {:>8} | {:>7} | {:>9} | {:>12}",
        "File",
        "Articles",
        "Records",
        "Dropped",
        "Bad dates",
        metric.label()
    );
    println!("{}", "-".repeat(100));

    for row in rows {
        let name = truncate(&row.path.display().to_string(), 40);
        match &row.outcome {
            Ok((stats, articles, total)) => println!(
                "{:<40} | {:>8} | {:>8} | {:>7} | {:>9} | {:>12}",
                name, articles, stats.records, stats.dropped, stats.failed_dates, total
            ),
            Err(e) => println!("{:<40} | error: {}", name, e),
        }
    }

    let ok = rows.iter().filter(|r| r.outcome.is_ok()).count();
    println!("\n{} digests ({} unreadable)", rows.len(), rows.len() - ok);
}

fn format_date(date: Option<chrono::NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}
