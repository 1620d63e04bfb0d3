use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::RawRow;
use crate::schema::TicketTable;

const HOUR: Duration = Duration::from_secs(60 * 60);
const PNL_TTL: Duration = Duration::from_secs(5 * 60);

/// One memoized read. Each key corresponds to exactly one query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    BadgingTickets,
    LiveDispatches,
    DirectoryOptions,
    DirectoryBadges,
    BudgetTotals,
    PnlTickets,
}

impl CacheKey {
    pub const ALL: [CacheKey; 6] = [
        CacheKey::BadgingTickets,
        CacheKey::LiveDispatches,
        CacheKey::DirectoryOptions,
        CacheKey::DirectoryBadges,
        CacheKey::BudgetTotals,
        CacheKey::PnlTickets,
    ];

    pub fn ttl(self) -> Duration {
        match self {
            CacheKey::PnlTickets => PNL_TTL,
            _ => HOUR,
        }
    }

    pub fn table(self) -> TicketTable {
        match self {
            CacheKey::BadgingTickets | CacheKey::BudgetTotals => TicketTable::Badging,
            CacheKey::LiveDispatches | CacheKey::PnlTickets => TicketTable::Live,
            CacheKey::DirectoryOptions | CacheKey::DirectoryBadges => TicketTable::Directory,
        }
    }
}

struct Entry {
    rows: Vec<RawRow>,
    stored_at: Instant,
}

/// Time-boxed memoization of raw query results for one session.
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<CacheKey, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: CacheKey, now: Instant) -> Option<&[RawRow]> {
        let entry = self.entries.get(&key)?;
        if now.saturating_duration_since(entry.stored_at) >= key.ttl() {
            return None;
        }
        debug!(target: "desk::cache", ?key, rows = entry.rows.len(), "hit");
        Some(&entry.rows)
    }

    pub fn put(&mut self, key: CacheKey, rows: Vec<RawRow>, now: Instant) {
        self.entries.insert(key, Entry { rows, stored_at: now });
    }

    /// Drop every entry whose query reads `table`.
    pub fn invalidate_table(&mut self, table: TicketTable) {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.table() != table);
        debug!(
            target: "desk::cache",
            table = table.name(),
            dropped = before - self.entries.len(),
            "invalidate"
        );
    }

    #[cfg(test)]
    pub fn contains(&self, key: CacheKey) -> bool {
        self.entries.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_after_ttl() {
        let mut cache = QueryCache::new();
        let t0 = Instant::now();
        cache.put(CacheKey::PnlTickets, vec![RawRow::new()], t0);
        assert!(cache.get(CacheKey::PnlTickets, t0 + Duration::from_secs(299)).is_some());
        assert!(cache.get(CacheKey::PnlTickets, t0 + PNL_TTL).is_none());

        cache.put(CacheKey::BadgingTickets, Vec::new(), t0);
        assert!(cache.get(CacheKey::BadgingTickets, t0 + Duration::from_secs(3599)).is_some());
        assert!(cache.get(CacheKey::BadgingTickets, t0 + HOUR).is_none());
    }

    #[test]
    fn test_invalidate_table_drops_all_readers() {
        let mut cache = QueryCache::new();
        let now = Instant::now();
        for key in CacheKey::ALL {
            cache.put(key, Vec::new(), now);
        }
        cache.invalidate_table(TicketTable::Live);
        assert!(!cache.contains(CacheKey::LiveDispatches));
        assert!(!cache.contains(CacheKey::PnlTickets));
        assert!(cache.contains(CacheKey::BadgingTickets));
        assert!(cache.contains(CacheKey::BudgetTotals));
        assert!(cache.contains(CacheKey::DirectoryOptions));

        cache.invalidate_table(TicketTable::Badging);
        assert!(!cache.contains(CacheKey::BudgetTotals));
    }
}
