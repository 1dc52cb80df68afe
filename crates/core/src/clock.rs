//! Injectable time and identifier sources.
//!
//! Everything that needs "now" or a fresh unique id takes one of these
//! instead of reaching for the system directly, so issuance and validation
//! stay deterministic under test.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of opaque, collision-resistant identifiers.
///
/// Uniqueness must not depend on the clock: two calls within the same tick
/// return different values.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

impl<T> Clock for Arc<T>
where
    T: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<T> IdGenerator for Arc<T>
where
    T: IdGenerator + ?Sized,
{
    fn next_id(&self) -> String {
        (**self).next_id()
    }
}

/// Wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 UUIDs, hex-encoded without hyphens (32 chars).
#[derive(Debug, Default, Copy, Clone)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Clock frozen at the given unix second.
    pub fn at_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn random_ids_are_hex_and_distinct() {
        let ids = RandomIdGenerator;
        let generated: HashSet<String> = (0..1_000).map(|_| ids.next_id()).collect();

        assert_eq!(generated.len(), 1_000);
        assert!(generated
            .iter()
            .all(|id| id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn fixed_clock_only_moves_when_told() {
        let clock = FixedClock::at_unix(1_000);
        assert_eq!(clock.now().timestamp(), 1_000);

        clock.advance(TimeDelta::seconds(30));
        assert_eq!(clock.now().timestamp(), 1_030);
    }

    #[test]
    fn arc_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_unix(42));
        assert_eq!(clock.now().timestamp(), 42);
    }
}
