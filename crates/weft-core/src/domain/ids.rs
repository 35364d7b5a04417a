//! Identifiers used when talking to the backend.
//!
//! - `RunId`: workflow execution 1 回分。continue-as-new のたびに新しくなる
//! - `CallId`: decision pass の中での remote call の通し番号
//!
//! `CallId` は時刻や乱数から作ってはいけません。replay のたびに同じ呼び出しが
//! 同じ番号を得ることで、history のイベントと対応付けられます。

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Workflow run の ID（ULID、表示は `run-` 付き）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Ulid);

impl RunId {
    pub const PREFIX: &'static str = "run-";

    pub fn ulid(&self) -> Ulid {
        self.0
    }

    /// 生成時刻（ULID の timestamp 部分、ミリ秒）
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl From<Ulid> for RunId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

/// Remote call の通し番号（decision pass ごとに 1 から振り直す）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    pub const FIRST: CallId = CallId(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.0)
    }
}
