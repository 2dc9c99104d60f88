use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

use crate::domain::{Record, RecordType};
use crate::error::RegError;
use crate::table::TableClient;

/// Linear backoff: attempt `n` waits `base_delay * n` before retrying.
/// Only transient failures (5xx, network) are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub insert_batch: usize,
    pub delete_batch: usize,
    /// Pause between insert batches, to keep write pressure off the backend.
    pub insert_delay: Duration,
    pub delete_delay: Duration,
    pub page_limit: usize,
    /// Hard ceiling on pagination; past it the fetch stops with a warning.
    pub max_pages: usize,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            insert_batch: 10,
            delete_batch: 20,
            insert_delay: Duration::from_millis(1000),
            delete_delay: Duration::from_millis(500),
            page_limit: 1000,
            max_pages: 20,
            retry: RetryPolicy::default(),
        }
    }
}

/// Injected so tests run without wall-clock delays.
pub type SleepFn = dyn Fn(Duration) + Sync;

pub fn thread_sleep(duration: Duration) {
    thread::sleep(duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Insert,
    Delete,
}

/// Emitted after every settled batch.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub phase: SyncPhase,
    pub processed: usize,
    pub total: usize,
    pub success: usize,
    pub fail: usize,
    pub skip: usize,
    pub elapsed: Duration,
    /// Remaining time at observed throughput; None until throughput exists.
    pub eta: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, snapshot: &ProgressSnapshot);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _snapshot: &ProgressSnapshot) {}
}

#[derive(Debug, Default, Clone)]
pub struct BulkReport {
    pub total: usize,
    pub success: usize,
    pub fail: usize,
    pub skip: usize,
    pub failures: Vec<String>,
}

fn with_retry<T>(
    retry: &RetryPolicy,
    sleep: &SleepFn,
    mut op: impl FnMut() -> Result<T, RegError>,
) -> Result<T, RegError> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < retry.max_attempts => {
                warn!(attempt, max = retry.max_attempts, error = %err, "retrying transient failure");
                sleep(retry.delay_for(attempt));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn snapshot(
    phase: SyncPhase,
    report: &BulkReport,
    started: Instant,
) -> ProgressSnapshot {
    let processed = report.success + report.fail + report.skip;
    let elapsed = started.elapsed();
    let eta = if processed > 0 && elapsed > Duration::ZERO {
        let per_item = elapsed.as_secs_f64() / processed as f64;
        let remaining = report.total.saturating_sub(processed);
        Some(Duration::from_secs_f64(per_item * remaining as f64))
    } else {
        None
    };
    ProgressSnapshot {
        phase,
        processed,
        total: report.total,
        success: report.success,
        fail: report.fail,
        skip: report.skip,
        elapsed,
        eta,
    }
}

/// Fetches the whole table, page by page, until an empty page or the page
/// ceiling. Rows come back untyped.
pub fn fetch_all_rows<C: TableClient + ?Sized>(
    client: &C,
    table: &str,
    options: &SyncOptions,
) -> Result<Vec<Value>, RegError> {
    let mut rows = Vec::new();
    for page in 1..=options.max_pages {
        let batch = client.list(table, page, options.page_limit)?;
        if batch.is_empty() {
            return Ok(rows);
        }
        let full_page = batch.len() == options.page_limit;
        rows.extend(batch);
        if !full_page {
            return Ok(rows);
        }
    }
    warn!(table, pages = options.max_pages, "page ceiling reached, corpus may be truncated");
    Ok(rows)
}

/// Typed full-table fetch. Rows that fail to deserialize are logged and
/// skipped rather than failing the whole load.
pub fn fetch_all_records<C: TableClient + ?Sized>(
    client: &C,
    record_type: RecordType,
    options: &SyncOptions,
) -> Result<Vec<Record>, RegError> {
    let rows = fetch_all_rows(client, record_type.table_name(), options)?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match Record::from_value(record_type, row) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(table = record_type.table_name(), error = %err, "skipping malformed row");
            }
        }
    }
    Ok(records)
}

/// Inserts rows in concurrent batches. Every row in a batch is issued at
/// once and all are allowed to settle; one failure never aborts the run.
/// `skip_offset` pre-counts rows dropped before the insert (duplicates),
/// so progress totals cover the whole submission.
pub fn bulk_create<C: TableClient + ?Sized>(
    client: &C,
    table: &str,
    rows: &[Value],
    skip_offset: usize,
    options: &SyncOptions,
    sleep: &SleepFn,
    sink: &dyn ProgressSink,
) -> BulkReport {
    let mut report = BulkReport {
        total: rows.len() + skip_offset,
        skip: skip_offset,
        ..BulkReport::default()
    };
    let started = Instant::now();

    for (batch_index, batch) in rows.chunks(options.insert_batch).enumerate() {
        if batch_index > 0 {
            sleep(options.insert_delay);
        }
        let results: Vec<Result<Value, RegError>> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|row| {
                    scope.spawn(move || {
                        with_retry(&options.retry, sleep, || client.create(table, row))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(RegError::TableHttp("worker panicked".to_string())))
                })
                .collect()
        });
        for result in results {
            match result {
                Ok(_) => report.success += 1,
                Err(err) => {
                    report.fail += 1;
                    report.failures.push(err.to_string());
                }
            }
        }
        sink.event(&snapshot(SyncPhase::Insert, &report, started));
    }
    report
}

/// Deletes records by id in concurrent batches, same settle-all shape as
/// [`bulk_create`].
pub fn bulk_delete<C: TableClient + ?Sized>(
    client: &C,
    table: &str,
    ids: &[String],
    options: &SyncOptions,
    sleep: &SleepFn,
    sink: &dyn ProgressSink,
) -> BulkReport {
    let mut report = BulkReport {
        total: ids.len(),
        ..BulkReport::default()
    };
    let started = Instant::now();

    for (batch_index, batch) in ids.chunks(options.delete_batch).enumerate() {
        if batch_index > 0 {
            sleep(options.delete_delay);
        }
        let results: Vec<Result<(), RegError>> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|id| {
                    scope.spawn(move || {
                        with_retry(&options.retry, sleep, || client.delete(table, id))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(RegError::TableHttp("worker panicked".to_string())))
                })
                .collect()
        });
        for result in results {
            match result {
                Ok(()) => report.success += 1,
                Err(err) => {
                    report.fail += 1;
                    report.failures.push(err.to_string());
                }
            }
        }
        sink.event(&snapshot(SyncPhase::Delete, &report, started));
    }
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct FlakyClient {
        /// Failures to serve before requests start succeeding.
        failures_left: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl TableClient for FlakyClient {
        fn list(&self, _table: &str, _page: usize, _limit: usize) -> Result<Vec<Value>, RegError> {
            Ok(Vec::new())
        }

        fn get(&self, table: &str, id: &str) -> Result<Value, RegError> {
            Err(RegError::RecordNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })
        }

        fn create(&self, _table: &str, row: &Value) -> Result<Value, RegError> {
            *self.calls.lock().unwrap() += 1;
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(RegError::TableStatus {
                    status: 503,
                    message: "busy".to_string(),
                });
            }
            Ok(row.clone())
        }

        fn update(&self, _table: &str, _id: &str, row: &Value) -> Result<Value, RegError> {
            Ok(row.clone())
        }

        fn patch(&self, _table: &str, _id: &str, fields: &Value) -> Result<Value, RegError> {
            Ok(fields.clone())
        }

        fn delete(&self, _table: &str, _id: &str) -> Result<(), RegError> {
            *self.calls.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn no_sleep(_: Duration) {}

    #[test]
    fn retry_recovers_from_transient_failures() {
        let client = FlakyClient {
            failures_left: Mutex::new(2),
            ..FlakyClient::default()
        };
        let options = SyncOptions::default();
        let report = bulk_create(
            &client,
            "msds",
            &[json!({"spec_no": "A-1"})],
            0,
            &options,
            &no_sleep,
            &NoopSink,
        );
        assert_eq!(report.success, 1);
        assert_eq!(report.fail, 0);
        assert_eq!(*client.calls.lock().unwrap(), 3);
    }

    #[test]
    fn retries_are_bounded() {
        let client = FlakyClient {
            failures_left: Mutex::new(10),
            ..FlakyClient::default()
        };
        let options = SyncOptions::default();
        let report = bulk_create(
            &client,
            "msds",
            &[json!({})],
            0,
            &options,
            &no_sleep,
            &NoopSink,
        );
        assert_eq!(report.fail, 1);
        assert_eq!(*client.calls.lock().unwrap(), 3);
    }

    #[test]
    fn terminal_errors_are_not_retried() {
        struct BadRequest(Mutex<u32>);
        impl TableClient for BadRequest {
            fn list(&self, _: &str, _: usize, _: usize) -> Result<Vec<Value>, RegError> {
                Ok(Vec::new())
            }
            fn get(&self, _: &str, _: &str) -> Result<Value, RegError> {
                Ok(Value::Null)
            }
            fn create(&self, _: &str, _: &Value) -> Result<Value, RegError> {
                *self.0.lock().unwrap() += 1;
                Err(RegError::TableStatus {
                    status: 400,
                    message: "bad payload".to_string(),
                })
            }
            fn update(&self, _: &str, _: &str, _: &Value) -> Result<Value, RegError> {
                Ok(Value::Null)
            }
            fn patch(&self, _: &str, _: &str, _: &Value) -> Result<Value, RegError> {
                Ok(Value::Null)
            }
            fn delete(&self, _: &str, _: &str) -> Result<(), RegError> {
                Ok(())
            }
        }
        let client = BadRequest(Mutex::new(0));
        let report = bulk_create(
            &client,
            "msds",
            &[json!({})],
            0,
            &SyncOptions::default(),
            &no_sleep,
            &NoopSink,
        );
        assert_eq!(report.fail, 1);
        assert_eq!(*client.0.lock().unwrap(), 1);
    }

    #[test]
    fn delay_grows_linearly_with_attempt() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
        assert_eq!(retry.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn skip_offset_counts_toward_progress_totals() {
        let client = FlakyClient::default();
        let report = bulk_create(
            &client,
            "msds",
            &[json!({})],
            4,
            &SyncOptions::default(),
            &no_sleep,
            &NoopSink,
        );
        assert_eq!(report.total, 5);
        assert_eq!(report.skip, 4);
        assert_eq!(report.success, 1);
    }
}
