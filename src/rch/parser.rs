//! RCH flat-file parser
//!
//! An RCH file carries one daily measurement per line for a single reach or
//! reservoir outlet, preceded by a two-line header block:
//!
//! ```text
//! RCH  Liptovska Mara
//! YEAR DOY      FLOW
//! 2024   1    12.500
//! 2024   2    12.300
//! ```
//!
//! Data lines are whitespace-separated. Dates are encoded either as
//! `YEAR DOY` (day-of-year) or as a single explicit `YYYY-MM-DD` token.
//! Hydrological archives routinely contain a handful of malformed rows, so
//! the parser is fail-soft per line: a bad date skips the line, a bad value
//! keeps the line with a missing value. Only a file with no recognizable
//! structure at all is rejected.

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// One parsed row of an RCH file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RchRecord {
    pub date: NaiveDate,
    /// `None` marks a missing or unparsable measurement. The date is kept
    /// so gap-aware consumers see the hole instead of a fabricated zero.
    pub value: Option<f64>,
}

/// Metadata accompanying a parsed file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RchMetadata {
    pub source_file_name: Option<String>,
    pub record_count: usize,
}

/// A fully parsed RCH file. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RchParsedData {
    pub timeseries: Vec<RchRecord>,
    pub metadata: RchMetadata,
}

/// Per-line parse outcome, accumulated so skip causes stay inspectable
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record(RchRecord),
    Skipped { line_no: usize, reason: String },
}

/// Parse raw RCH file content
pub fn parse(content: &str) -> Result<RchParsedData> {
    parse_named(content, None)
}

/// Parse raw RCH file content, recording the source file name in metadata
pub fn parse_named(content: &str, source_file_name: Option<String>) -> Result<RchParsedData> {
    let mut lines = content.lines();

    // Header block: signature line + column-header line. Anything else is
    // an unrecognized layout.
    let signature = lines
        .next()
        .ok_or_else(|| AppError::Parse("empty input".to_string()))?;
    if signature.split_whitespace().next() != Some("RCH") {
        return Err(AppError::Parse(
            "unrecognized layout: missing RCH signature line".to_string(),
        ));
    }
    if lines.next().is_none() {
        return Err(AppError::Parse("missing column header line".to_string()));
    }

    let mut timeseries = Vec::new();
    let mut data_lines = 0usize;
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        data_lines += 1;
        // Header block is two lines, so data starts at line 3.
        match parse_line(line, idx + 3) {
            LineOutcome::Record(record) => timeseries.push(record),
            LineOutcome::Skipped { line_no, reason } => {
                debug!("skipping RCH line {}: {}", line_no, reason);
            }
        }
    }

    if data_lines == 0 {
        return Err(AppError::Parse("no data records after header".to_string()));
    }

    let record_count = timeseries.len();
    Ok(RchParsedData {
        timeseries,
        metadata: RchMetadata {
            source_file_name,
            record_count,
        },
    })
}

/// Parse a single data line into a record or a skip reason
pub fn parse_line(line: &str, line_no: usize) -> LineOutcome {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return LineOutcome::Skipped {
            line_no,
            reason: "blank line".to_string(),
        };
    }

    let (date, value_field) = if fields[0].contains('-') {
        // Explicit date token: YYYY-MM-DD VALUE
        match NaiveDate::parse_from_str(fields[0], "%Y-%m-%d") {
            Ok(d) => (d, fields.get(1)),
            Err(_) => {
                return LineOutcome::Skipped {
                    line_no,
                    reason: format!("invalid date token '{}'", fields[0]),
                }
            }
        }
    } else {
        // Day-of-year encoding: YEAR DOY VALUE
        if fields.len() < 2 {
            return LineOutcome::Skipped {
                line_no,
                reason: "expected year and day-of-year".to_string(),
            };
        }
        let year: i32 = match fields[0].parse() {
            Ok(y) => y,
            Err(_) => {
                return LineOutcome::Skipped {
                    line_no,
                    reason: format!("invalid year '{}'", fields[0]),
                }
            }
        };
        let doy: u32 = match fields[1].parse() {
            Ok(d) => d,
            Err(_) => {
                return LineOutcome::Skipped {
                    line_no,
                    reason: format!("invalid day-of-year '{}'", fields[1]),
                }
            }
        };
        match NaiveDate::from_yo_opt(year, doy) {
            Some(d) => (d, fields.get(2)),
            None => {
                return LineOutcome::Skipped {
                    line_no,
                    reason: format!("day-of-year {} out of range for {}", doy, year),
                }
            }
        }
    };

    // Value parsing is an independent failure channel: a bad value keeps
    // the date and records a gap.
    let value = value_field.and_then(|v| v.parse::<f64>().ok());

    LineOutcome::Record(RchRecord { date, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "RCH  Liptovska Mara\n\
                          YEAR DOY      FLOW\n\
                          2024   1    12.500\n\
                          2024   2    12.300\n\
                          2024   3    11.900\n";

    #[test]
    fn test_parse_well_formed() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.timeseries.len(), 3);
        assert_eq!(parsed.metadata.record_count, 3);
        assert_eq!(
            parsed.timeseries[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(parsed.timeseries[0].value, Some(12.5));
        assert_eq!(
            parsed.timeseries[2].date,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(parse(""), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_header_only_is_parse_error() {
        let content = "RCH  Somewhere\nYEAR DOY FLOW\n";
        assert!(matches!(parse(content), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_unrecognized_layout_is_parse_error() {
        let content = "timestamp,value\n2024-01-01,1.0\n";
        assert!(matches!(parse(content), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_bad_date_line_is_skipped() {
        let content = "RCH x\nYEAR DOY FLOW\n2024 1 1.0\n2024 999 2.0\n2024 3 3.0\n";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.timeseries.len(), 2);
        assert_eq!(
            parsed.timeseries[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_bad_value_keeps_date_as_missing() {
        let content = "RCH x\nYEAR DOY FLOW\n2024 1 n/a\n2024 2 5.5\n";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.timeseries.len(), 2);
        assert_eq!(parsed.timeseries[0].value, None);
        assert_eq!(
            parsed.timeseries[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(parsed.timeseries[1].value, Some(5.5));
    }

    #[test]
    fn test_missing_value_field_is_missing() {
        let content = "RCH x\nYEAR DOY FLOW\n2024 1\n";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.timeseries[0].value, None);
    }

    #[test]
    fn test_explicit_date_tokens() {
        let content = "RCH x\nDATE FLOW\n2024-02-29 8.25\n2024-03-01 8.00\n";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.timeseries.len(), 2);
        assert_eq!(
            parsed.timeseries[0].date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(parsed.timeseries[0].value, Some(8.25));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let content = "RCH x\nYEAR DOY FLOW\n2024 1 1.0\n\n   \n2024 2 2.0\n";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.timeseries.len(), 2);
    }

    #[test]
    fn test_file_order_preserved_not_resorted() {
        // Out-of-order dates are a data-quality signal, not hidden.
        let content = "RCH x\nYEAR DOY FLOW\n2024 5 1.0\n2024 2 2.0\n";
        let parsed = parse(content).unwrap();
        assert!(parsed.timeseries[0].date > parsed.timeseries[1].date);
    }

    #[test]
    fn test_record_count_matches_generated_file() {
        let n = 120;
        let mut content = String::from("RCH gen\nYEAR DOY FLOW\n");
        for doy in 1..=n {
            content.push_str(&format!("2023 {} {:.3}\n", doy, doy as f64 * 0.5));
        }
        let parsed = parse(&content).unwrap();
        assert_eq!(parsed.metadata.record_count, n as usize);
        assert_eq!(parsed.timeseries.len(), n as usize);
    }

    #[test]
    fn test_source_file_name_recorded() {
        let parsed = parse_named(SAMPLE, Some("mara.rch".to_string())).unwrap();
        assert_eq!(
            parsed.metadata.source_file_name.as_deref(),
            Some("mara.rch")
        );
    }
}
