use serde::Serialize;
use tracing::info;

/// Run-scoped counters.
///
/// `unsupported`, `skipped`, `migrated` and `errors` partition `total`: every
/// processed record lands in exactly one of them. `supported` and
/// `transformed` are progress counters that overlap the terminal buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncMetrics {
    pub total: u64,
    pub supported: u64,
    pub unsupported: u64,
    pub transformed: u64,
    pub migrated: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl SyncMetrics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Sum of the terminal buckets. Equals `total` after every record.
    pub fn terminal_count(&self) -> u64 {
        self.unsupported + self.skipped + self.migrated + self.errors
    }

    pub fn log_summary(&self, mode: &str) {
        info!(
            mode,
            total = self.total,
            supported = self.supported,
            unsupported = self.unsupported,
            transformed = self.transformed,
            migrated = self.migrated,
            skipped = self.skipped,
            errors = self.errors,
            "Sync summary"
        );
    }
}
