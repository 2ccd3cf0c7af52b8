use async_trait::async_trait;
use service_migration_shared::{LegacyRecordFilter, LegacyServiceRecord, MetadataCache};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::errors::LegacySourceError;
use crate::interfaces::{LegacyPage, LegacyRecordSource, PageCursor};

/// Legacy source backed by a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLegacySource {
    records: BTreeMap<i64, LegacyServiceRecord>,
    metadata: MetadataCache,
}

impl InMemoryLegacySource {
    pub fn new(records: impl IntoIterator<Item = LegacyServiceRecord>, metadata: MetadataCache) -> Self {
        Self {
            records: records.into_iter().map(|record| (record.id, record)).collect(),
            metadata,
        }
    }

    pub fn insert(&mut self, record: LegacyServiceRecord) {
        self.records.insert(record.id, record);
    }
}

#[async_trait]
impl LegacyRecordSource for InMemoryLegacySource {
    async fn read_by_id(&self, id: i64) -> Result<Option<LegacyServiceRecord>, LegacySourceError> {
        Ok(self.records.get(&id).cloned())
    }

    async fn read_page(
        &self,
        cursor: Option<PageCursor>,
        filter: &LegacyRecordFilter,
        page_size: usize,
    ) -> Result<LegacyPage, LegacySourceError> {
        let lower = match cursor {
            Some(PageCursor(last_id)) => Bound::Excluded(last_id),
            None => Bound::Unbounded,
        };
        let mut matching = self
            .records
            .range((lower, Bound::Unbounded))
            .map(|(_, record)| record)
            .filter(|record| filter.matches(record));

        let records: Vec<LegacyServiceRecord> =
            matching.by_ref().take(page_size).cloned().collect();
        let has_more = matching.next().is_some();
        let next_cursor = match records.last() {
            Some(last) if has_more => Some(PageCursor(last.id)),
            _ => None,
        };

        Ok(LegacyPage {
            records,
            next_cursor,
        })
    }

    async fn read_metadata(&self) -> Result<MetadataCache, LegacySourceError> {
        Ok(self.metadata.clone())
    }
}
