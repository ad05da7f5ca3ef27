//! Time-series store client
//!
//! Issues a windowed Flux range query against an InfluxDB v2 endpoint and
//! reshapes the annotated-CSV result into uniform [`TimePoint`] records.
//!
//! The decode side is push-based: a task reads the CSV body and emits one
//! [`RowEvent`] per record onto a channel. [`collect_rows`] is the bridge to
//! the pull contract: it buffers rows until the stream signals completion,
//! or drops everything collected so far when an error event arrives (no
//! partial-result contract).

use crate::config::Config;
use crate::error::{AppError, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::debug;

/// Columns of the annotated-CSV result that carry no field data
const META_COLUMNS: &[&str] = &["", "result", "table", "_start", "_stop", "_measurement"];

/// One row of a range query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    /// Date-only ISO string derived from the row's `_time` column
    pub time: String,
    pub fields: BTreeMap<String, Value>,
}

/// Push-side event of the row stream
#[derive(Debug)]
pub enum RowEvent {
    Row(TimePoint),
    Error(String),
    Complete,
}

/// Bridge the push-based row stream to a pull contract.
///
/// Buffers rows until `Complete`; an `Error` event aborts the collection
/// and discards the partial buffer. A stream that ends without either
/// signal is treated as an error.
pub async fn collect_rows(mut rx: mpsc::Receiver<RowEvent>) -> Result<Vec<TimePoint>> {
    let mut buffer = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            RowEvent::Row(point) => buffer.push(point),
            RowEvent::Error(message) => return Err(AppError::Query(message)),
            RowEvent::Complete => return Ok(buffer),
        }
    }
    Err(AppError::Query(
        "row stream ended without completion".to_string(),
    ))
}

/// Client for the external time-series database
pub struct TsdbClient {
    client: Client,
    url: String,
    org: String,
    token: String,
    bucket: String,
}

impl TsdbClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            url: config.influx_url.clone(),
            org: config.influx_org.clone(),
            token: config.influx_token.clone(),
            bucket: config.influx_bucket.clone(),
        }
    }

    /// Range query for one measurement over a trailing window
    pub async fn query_range(&self, measurement: &str, window_days: u32) -> Result<Vec<TimePoint>> {
        let flux = format!(
            "from(bucket: \"{}\") \
             |> range(start: -{}d) \
             |> filter(fn: (r) => r._measurement == \"{}\") \
             |> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")",
            self.bucket, window_days, measurement
        );
        debug!("flux query: {}", flux);

        let response = self
            .client
            .post(format!("{}/api/v2/query?org={}", self.url, self.org))
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/csv")
            .json(&serde_json::json!({ "query": flux, "type": "flux" }))
            .send()
            .await
            .map_err(|e| AppError::Query(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Query(format!(
                "time-series store returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Query(e.to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move { push_csv_rows(&body, tx).await });
        collect_rows(rx).await
    }
}

/// Decode the annotated-CSV body and push one event per record.
///
/// Annotation lines (`#datatype`, `#group`, `#default`) are dropped. The
/// pivot in the query yields a single table, so one header line is
/// expected; a repeated header row (as emitted between tables) is
/// recognized and skipped, but a second table with a *different* column
/// layout is not supported and would misalign against the first header.
async fn push_csv_rows(body: &str, tx: mpsc::Sender<RowEvent>) {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            let _ = tx.send(RowEvent::Error(e.to_string())).await;
            return;
        }
    };

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                // Abort the in-flight collection; buffered rows are discarded
                // by the collector.
                let _ = tx.send(RowEvent::Error(e.to_string())).await;
                return;
            }
        };
        if record == headers {
            continue;
        }
        if let Some(point) = record_to_point(&headers, &record) {
            if tx.send(RowEvent::Row(point)).await.is_err() {
                return;
            }
        }
    }

    let _ = tx.send(RowEvent::Complete).await;
}

/// Map one CSV record to a point; rows without a timestamp are dropped
fn record_to_point(headers: &csv::StringRecord, record: &csv::StringRecord) -> Option<TimePoint> {
    let mut time = None;
    let mut fields = BTreeMap::new();

    for (header, value) in headers.iter().zip(record.iter()) {
        if header == "_time" {
            if !value.is_empty() {
                time = Some(date_only(value));
            }
            continue;
        }
        if META_COLUMNS.contains(&header) || value.is_empty() {
            continue;
        }
        let parsed = value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        fields.insert(header.to_string(), parsed);
    }

    Some(TimePoint {
        time: time?,
        fields,
    })
}

/// Reduce an RFC 3339 timestamp to its date component
fn date_only(timestamp: &str) -> String {
    match timestamp.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_rows_buffers_until_complete() {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            for day in 1..=3 {
                let point = TimePoint {
                    time: format!("2024-01-0{}", day),
                    fields: BTreeMap::new(),
                };
                tx.send(RowEvent::Row(point)).await.unwrap();
            }
            tx.send(RowEvent::Complete).await.unwrap();
        });

        let rows = collect_rows(rx).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time, "2024-01-01");
    }

    #[tokio::test]
    async fn test_collect_rows_error_discards_partial() {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let point = TimePoint {
                time: "2024-01-01".to_string(),
                fields: BTreeMap::new(),
            };
            tx.send(RowEvent::Row(point)).await.unwrap();
            tx.send(RowEvent::Error("broken pipe".to_string()))
                .await
                .unwrap();
        });

        match collect_rows(rx).await {
            Err(AppError::Query(message)) => assert!(message.contains("broken pipe")),
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_collect_rows_dropped_sender_is_error() {
        let (tx, rx) = mpsc::channel::<RowEvent>(1);
        drop(tx);
        assert!(matches!(collect_rows(rx).await, Err(AppError::Query(_))));
    }

    #[tokio::test]
    async fn test_push_csv_rows_decodes_annotated_body() {
        let body = "\
#datatype string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,double,double\n\
,result,table,_start,_stop,_time,level,volume\n\
,_result,0,2024-01-01T00:00:00Z,2024-02-01T00:00:00Z,2024-01-05T00:00:00Z,512.25,190.5\n\
,_result,0,2024-01-01T00:00:00Z,2024-02-01T00:00:00Z,2024-01-06T00:00:00Z,512.10,189.9\n";

        let (tx, rx) = mpsc::channel(8);
        push_csv_rows(body, tx).await;
        let rows = collect_rows(rx).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, "2024-01-05");
        assert_eq!(rows[0].fields["level"], serde_json::json!(512.25));
        assert_eq!(rows[1].fields["volume"], serde_json::json!(189.9));
        assert!(!rows[0].fields.contains_key("_start"));
    }

    #[tokio::test]
    async fn test_push_csv_rows_skips_repeated_header_between_tables() {
        let body = "\
,result,table,_time,level\n\
,_result,0,2024-01-05T00:00:00Z,512.25\n\
,result,table,_time,level\n\
,_result,1,2024-01-06T00:00:00Z,511.80\n";

        let (tx, rx) = mpsc::channel(8);
        push_csv_rows(body, tx).await;
        let rows = collect_rows(rx).await.unwrap();

        // Rows from both tables survive; the repeated header does not
        // become a bogus point with time "_time".
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, "2024-01-05");
        assert_eq!(rows[1].time, "2024-01-06");
    }

    #[tokio::test]
    async fn test_push_csv_rows_skips_rows_without_time() {
        let body = ",result,table,_time,level\n,_result,0,2024-01-05T00:00:00Z,512.25\n,_result,0,,511.00\n";
        let (tx, rx) = mpsc::channel(8);
        push_csv_rows(body, tx).await;
        let rows = collect_rows(rx).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_date_only() {
        assert_eq!(date_only("2024-01-05T10:00:00Z"), "2024-01-05");
        assert_eq!(date_only("2024-01-05"), "2024-01-05");
    }
}
