use tracing::{info, warn};

use crate::access;
use crate::classify;
use crate::dedup;
use crate::domain::{Record, RecordType, ReviewNeededRecord, UserContext};
use crate::error::RegError;
use crate::export;
use crate::mapper;
use crate::parser;
use crate::review::ReviewFilter;
use crate::sync::{self, BulkReport, ProgressSink, SyncOptions};
use crate::table::TableClient;

#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    /// Rows mapped from the pasted text.
    pub parsed: usize,
    /// Rows skipped because an equal-keyed record already exists.
    pub duplicates: usize,
    pub bulk: BulkReport,
}

#[derive(Debug, Default, Clone)]
pub struct PurgeReport {
    pub groups: usize,
    pub bulk: BulkReport,
}

/// Ties the pipeline together over one table backend. Every operation
/// takes the caller's identity from construction; nothing is ambient.
pub struct App<C: TableClient> {
    client: C,
    user: Option<UserContext>,
    options: SyncOptions,
    sleep: Box<dyn Fn(std::time::Duration) + Sync>,
}

impl<C: TableClient> App<C> {
    pub fn new(client: C, user: Option<UserContext>, options: SyncOptions) -> Self {
        Self {
            client,
            user,
            options,
            sleep: Box::new(sync::thread_sleep),
        }
    }

    /// Replaces the inter-batch/retry sleep, so tests run instantly.
    pub fn with_sleep(mut self, sleep: impl Fn(std::time::Duration) + Sync + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    /// Parses pasted tabular text, maps it, drops rows already present on
    /// the backend, and inserts the rest in batches.
    ///
    /// The duplicate snapshot is taken once up front; records inserted by
    /// someone else between snapshot and insert are not seen.
    pub fn import_text(
        &self,
        text: &str,
        record_type: RecordType,
        sink: &dyn ProgressSink,
    ) -> Result<ImportReport, RegError> {
        let table = parser::parse(text, Some(record_type));
        let records = mapper::map_table(&table, record_type, self.user.as_ref());
        if records.is_empty() {
            return Err(RegError::EmptyInput);
        }

        // If the snapshot cannot be fetched the import still runs; the
        // write path stays available and `dedup` reconciles later.
        let existing = match sync::fetch_all_records(&self.client, record_type, &self.options) {
            Ok(existing) => existing,
            Err(err) => {
                warn!(table = record_type.table_name(), error = %err, "duplicate pre-check unavailable, importing without it");
                Vec::new()
            }
        };
        let mut fresh = Vec::new();
        let mut duplicates = 0;
        for record in records.iter() {
            if dedup::is_duplicate(record, &existing) {
                duplicates += 1;
            } else {
                fresh.push(
                    record
                        .to_value()
                        .map_err(|err| RegError::UnexpectedResponse(err.to_string()))?,
                );
            }
        }
        info!(
            table = record_type.table_name(),
            parsed = records.len(),
            duplicates,
            "starting import"
        );

        let bulk = sync::bulk_create(
            &self.client,
            record_type.table_name(),
            &fresh,
            duplicates,
            &self.options,
            self.sleep.as_ref(),
            sink,
        );
        Ok(ImportReport {
            parsed: records.len(),
            duplicates,
            bulk,
        })
    }

    /// Finds equal-keyed groups already on the backend and deletes every
    /// member except the oldest.
    pub fn purge_duplicates(
        &self,
        record_type: RecordType,
        sink: &dyn ProgressSink,
    ) -> Result<PurgeReport, RegError> {
        let corpus = sync::fetch_all_records(&self.client, record_type, &self.options)?;
        let groups = dedup::find_duplicate_groups(&corpus);
        let mut ids = Vec::new();
        for group in &groups {
            for record in &group.delete {
                match record.id() {
                    Some(id) => ids.push(id.to_string()),
                    None => {
                        warn!(key = %group.key, "duplicate without id, cannot delete");
                    }
                }
            }
        }
        info!(
            table = record_type.table_name(),
            groups = groups.len(),
            deletions = ids.len(),
            "purging duplicates"
        );
        let bulk = sync::bulk_delete(
            &self.client,
            record_type.table_name(),
            &ids,
            &self.options,
            self.sleep.as_ref(),
            sink,
        );
        Ok(PurgeReport {
            groups: groups.len(),
            bulk,
        })
    }

    /// Full-corpus load, restricted to records the caller may see. MSDS
    /// records come back with their mixture type freshly derived.
    pub fn fetch_records(&self, record_type: RecordType) -> Result<Vec<Record>, RegError> {
        let mut records = sync::fetch_all_records(&self.client, record_type, &self.options)?;
        if let Some(user) = &self.user {
            records.retain(|record| access::can_access_record(user, record));
        }
        if record_type == RecordType::Msds {
            let mut items: Vec<_> = records
                .into_iter()
                .filter_map(|record| match record {
                    Record::Msds(item) => Some(item),
                    _ => None,
                })
                .collect();
            classify::classify(&mut items);
            records = items.into_iter().map(Record::Msds).collect();
        }
        Ok(records)
    }

    /// Review-needed items still awaiting action under `filter`'s law.
    pub fn review_worklist(
        &self,
        filter: ReviewFilter,
    ) -> Result<Vec<ReviewNeededRecord>, RegError> {
        let records = self.fetch_records(RecordType::ReviewNeeded)?;
        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                Record::ReviewNeeded(item) if filter.matches(&item) => Some(item),
                _ => None,
            })
            .collect())
    }

    /// CSV of everything the caller may see, BOM-prefixed for Excel.
    pub fn export_csv(&self, record_type: RecordType) -> Result<String, RegError> {
        let records = self.fetch_records(record_type)?;
        export::to_csv_with_bom(&records, record_type)
    }

    pub fn get_record(&self, record_type: RecordType, id: &str) -> Result<Record, RegError> {
        let value = self.client.get(record_type.table_name(), id)?;
        Record::from_value(record_type, value)
            .map_err(|err| RegError::UnexpectedResponse(err.to_string()))
    }

    pub fn update_record(&self, record: &Record) -> Result<(), RegError> {
        let table = record.record_type().table_name();
        let id = record.id().ok_or_else(|| RegError::RecordNotFound {
            table: table.to_string(),
            id: String::new(),
        })?;
        let value = record
            .to_value()
            .map_err(|err| RegError::UnexpectedResponse(err.to_string()))?;
        self.client.update(table, id, &value)?;
        Ok(())
    }

    pub fn patch_record(
        &self,
        record_type: RecordType,
        id: &str,
        fields: &serde_json::Value,
    ) -> Result<(), RegError> {
        self.client.patch(record_type.table_name(), id, fields)?;
        Ok(())
    }

    pub fn delete_record(&self, record_type: RecordType, id: &str) -> Result<(), RegError> {
        self.client.delete(record_type.table_name(), id)
    }
}
