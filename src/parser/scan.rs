use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use super::lines::Line;
use super::normalize::{parse_count, parse_duration, parse_report_date, FieldError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRecord {
    pub identifier: String,
    pub views: u64,
    pub users: u64,
    pub view_seconds: u64,
    pub date: Option<NaiveDateTime>,
}

/// Tallies of what a scan saw, for logs and the summary table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub lines: usize,
    pub date_lines: usize,
    pub failed_dates: usize,
    pub records: usize,
    pub dropped: usize,
}

impl ScanStats {
    pub fn ignored(&self) -> usize {
        self.lines - self.date_lines - self.records - self.dropped
    }
}

#[derive(Debug, Default)]
struct ScanState {
    current_date: Option<NaiveDateTime>,
    records: Vec<DataRecord>,
    stats: ScanStats,
}

/// Fold classified lines into records, carrying the last successfully parsed
/// reporting date forward onto every data line that follows it.
pub fn scan_lines(lines: &[Line<'_>]) -> (Vec<DataRecord>, ScanStats) {
    let state = lines
        .iter()
        .enumerate()
        .fold(ScanState::default(), |mut state, (idx, line)| {
            state.stats.lines += 1;
            match line {
                Line::DateContext { date } => {
                    state.stats.date_lines += 1;
                    match parse_report_date(date) {
                        Ok(parsed) => state.current_date = Some(parsed),
                        Err(e) => {
                            state.stats.failed_dates += 1;
                            warn!(line = idx + 1, error = %e, "Keeping previous reporting date");
                        }
                    }
                }
                Line::Data { slug, views, users, time } => {
                    match build_record(slug, views, users, time, state.current_date) {
                        Ok(record) => {
                            state.stats.records += 1;
                            state.records.push(record);
                        }
                        Err(e) => {
                            state.stats.dropped += 1;
                            debug!(line = idx + 1, slug = %slug, error = %e, "Dropping data line");
                        }
                    }
                }
                Line::Unrecognized => {}
            }
            state
        });

    (state.records, state.stats)
}

fn build_record(
    slug: &str,
    views: &str,
    users: &str,
    time: &str,
    date: Option<NaiveDateTime>,
) -> Result<DataRecord, FieldError> {
    Ok(DataRecord {
        identifier: slug.to_string(),
        views: parse_count(views)?,
        users: parse_count(users)?,
        view_seconds: parse_duration(time)?,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lines::classify_lines;
    use chrono::NaiveDate;

    fn scan(text: &str) -> (Vec<DataRecord>, ScanStats) {
        scan_lines(&classify_lines(text))
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    #[test]
    fn date_context_applies_to_following_lines() {
        let (records, _) = scan(
            "Between A and 2020-01-01, your articles\n→ realpython.com/x/: 10 views, 5 users, 1:00 avg reading time",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, day(2020, 1, 1));
        assert_eq!(records[0].views, 10);
        assert_eq!(records[0].users, 5);
        assert_eq!(records[0].view_seconds, 60);
    }

    #[test]
    fn header_with_data_shape_yields_no_record() {
        let text = "\
Between A and 2020-01-01, your articles → realpython.com/x/: 1 views, 1 users, 0:10 avg reading time
→ realpython.com/y/: 2 views, 1 users, 0:10 avg reading time";
        let (records, stats) = scan(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "y");
        assert_eq!(records[0].date, day(2020, 1, 1));
        assert_eq!(stats.date_lines, 1);
        assert_eq!(stats.records, 1);
    }

    #[test]
    fn no_context_means_no_date() {
        let (records, _) = scan("→ realpython.com/x/: 10 views, 5 users, 1:00 avg reading time");
        assert_eq!(records[0].date, None);
    }

    #[test]
    fn newer_context_wins() {
        let text = "\
Between A and 2020-01-01, your articles
→ realpython.com/x/: 1 views, 1 users, 0:10 avg reading time
Between B and 2020-01-08, your articles
→ realpython.com/x/: 2 views, 1 users, 0:10 avg reading time";
        let (records, _) = scan(text);
        assert_eq!(records[0].date, day(2020, 1, 1));
        assert_eq!(records[1].date, day(2020, 1, 8));
    }

    #[test]
    fn failed_date_keeps_previous_context() {
        let text = "\
Between A and 2020-01-01, your articles
Between B and someday soon, your articles
→ realpython.com/x/: 1 views, 1 users, 0:10 avg reading time";
        let (records, stats) = scan(text);
        assert_eq!(records[0].date, day(2020, 1, 1));
        assert_eq!(stats.date_lines, 2);
        assert_eq!(stats.failed_dates, 1);
    }

    #[test]
    fn failed_first_date_leaves_context_absent() {
        let text = "\
Between B and someday soon, your articles
→ realpython.com/x/: 1 views, 1 users, 0:10 avg reading time";
        let (records, _) = scan(text);
        assert_eq!(records[0].date, None);
    }

    #[test]
    fn malformed_data_line_is_dropped_whole() {
        let text = "\
→ realpython.com/x/: 12a views, 5 users, 1:00 avg reading time
→ realpython.com/y/: 12 views, 5 users, 100 avg reading time
→ realpython.com/z/: 12 views, 5 users, 1:00 avg reading time";
        let (records, stats) = scan(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "z");
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn stats_account_for_every_line() {
        let text = "\
Weekly digest
Between A and 2020-01-01, your articles
→ realpython.com/x/: 1 views, 1 users, 0:10 avg reading time
→ realpython.com/y/: x views, 1 users, 0:10 avg reading time

Thanks!";
        let (_, stats) = scan(text);
        assert_eq!(stats.lines, 6);
        assert_eq!(stats.date_lines, 1);
        assert_eq!(stats.records, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.ignored(), 3);
    }

    #[test]
    fn empty_input() {
        let (records, stats) = scan("");
        assert!(records.is_empty());
        assert_eq!(stats, ScanStats::default());
    }
}
