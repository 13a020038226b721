//! Extraction metrics.

use std::time::Instant;

/// Row counter tagged with the source database and table.
///
/// Incremented per emitted record; logs a summary counter metric when the
/// stream finishes.
#[derive(Debug)]
pub struct RecordCounter {
    database: String,
    table: String,
    count: u64,
    started: Instant,
}

impl RecordCounter {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        RecordCounter {
            database: database.into(),
            table: table.into(),
            count: 0,
            started: Instant::now(),
        }
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Log the counter metric and consume the counter.
    pub fn finish(self) {
        tracing::info!(
            metric = "record_count",
            value = self.count,
            database = %self.database,
            table = %self.table,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "stream extraction finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_increments() {
        let mut counter = RecordCounter::new("APP", "USERS");
        assert_eq!(counter.count(), 0);
        counter.increment();
        counter.increment();
        assert_eq!(counter.count(), 2);
        counter.finish();
    }
}
