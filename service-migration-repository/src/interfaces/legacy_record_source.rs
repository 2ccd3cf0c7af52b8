//! Read access to the legacy service directory.

use async_trait::async_trait;
use service_migration_shared::{LegacyRecordFilter, LegacyServiceRecord, MetadataCache};

use crate::errors::LegacySourceError;

/// Position in a keyset-paginated scan: the id of the last record returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageCursor(pub i64);

/// One page of legacy records.
///
/// `next_cursor` is `None` when the scan is complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyPage {
    pub records: Vec<LegacyServiceRecord>,
    pub next_cursor: Option<PageCursor>,
}

/// Reads individual or paginated legacy records.
#[async_trait]
pub trait LegacyRecordSource: Send + Sync {
    /// Read one record with all of its child rows.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The record exists
    /// * `Ok(None)` - No record has this id
    /// * `Err(LegacySourceError)` - The source could not be read
    async fn read_by_id(&self, id: i64) -> Result<Option<LegacyServiceRecord>, LegacySourceError>;

    /// Read the page of records that follows `cursor`, in ascending id order.
    ///
    /// # Arguments
    ///
    /// * `cursor` - Position returned by the previous page, `None` for the first page
    /// * `filter` - Type and status restrictions
    /// * `page_size` - Maximum number of records in the page
    async fn read_page(
        &self,
        cursor: Option<PageCursor>,
        filter: &LegacyRecordFilter,
        page_size: usize,
    ) -> Result<LegacyPage, LegacySourceError>;

    /// Load the reference data the transformers resolve ids against.
    async fn read_metadata(&self) -> Result<MetadataCache, LegacySourceError>;
}
