//! Clock port - 現在時刻の取得元
//!
//! Workflow の `run()` からは使わないこと（replay が決定的でなくなる）。
//! Transport の記録や run ID の生成など、backend 側の処理で使います。

use chrono::{DateTime, Utc};

/// LocalTransport の記録時刻と run ID の timestamp に使う
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 本番用
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// テスト用: 常に同じ時刻を返す
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
