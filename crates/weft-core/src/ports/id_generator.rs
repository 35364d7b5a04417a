//! IdGenerator port - continue-as-new で使う run ID の発行
//!
//! Workflow の `run()` からは呼ばないこと。ID を発行するのは Scheduler 側です。

use ulid::Ulid;

use crate::domain::ids::RunId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn next_run_id(&self) -> RunId;
}

/// 時刻部分を Clock から、残りを乱数から作る ULID 発行器
///
/// FixedClock を渡すと timestamp 部分が固定されます。
#[derive(Debug, Clone)]
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn next_run_id(&self) -> RunId {
        let millis = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        RunId::from(Ulid::from_parts(millis, rand::random()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn consecutive_ids_differ() {
        let ids = UlidGenerator::new(SystemClock);
        let (a, b) = (ids.next_run_id(), ids.next_run_id());
        assert_ne!(a, b);
        assert!(a.to_string().starts_with(RunId::PREFIX));
    }

    #[test]
    fn timestamp_comes_from_the_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ids = UlidGenerator::new(FixedClock::new(at));

        let id = ids.next_run_id();
        assert_eq!(id.timestamp_ms(), at.timestamp_millis() as u64);
    }
}
