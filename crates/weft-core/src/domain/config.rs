//! Remote call configuration (identity, timeouts, task list, retry, delay).
//!
//! Invariants:
//! - timeouts are positive or absent (zero / negative become `None`)
//! - `retry` / `delay` never go below zero
//! - an empty task list means "use the default task list"
//!
//! Deserialization goes through the same normalization as the builders, so a
//! config file can't smuggle a negative retry past these rules.
//!
//! retry / delay are pass-through: the core never retries anything itself.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_RETRY: u64 = 3;
pub const DEFAULT_DELAY: u64 = 0;

fn positive_or_none(value: Option<i64>) -> Option<u64> {
    value
        .and_then(|v| u64::try_from(v).ok())
        .filter(|v| *v > 0)
}

fn clamp_non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Remote task の識別子（name + version）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    pub name: String,
    pub version: String,
}

impl TaskIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

// ========================================
// Activity
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawActivityConfig")]
pub struct ActivityConfig {
    #[serde(flatten)]
    identity: TaskIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    heartbeat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule_to_close: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule_to_start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_to_close: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_list: Option<String>,
    retry: u64,
    delay: u64,
    error_handling: bool,
}

#[derive(Deserialize)]
struct RawActivityConfig {
    #[serde(flatten)]
    identity: TaskIdentity,
    #[serde(default)]
    heartbeat: Option<i64>,
    #[serde(default)]
    schedule_to_close: Option<i64>,
    #[serde(default)]
    schedule_to_start: Option<i64>,
    #[serde(default)]
    start_to_close: Option<i64>,
    #[serde(default)]
    task_list: Option<String>,
    #[serde(default)]
    retry: Option<i64>,
    #[serde(default)]
    delay: i64,
    #[serde(default)]
    error_handling: bool,
}

impl From<RawActivityConfig> for ActivityConfig {
    fn from(raw: RawActivityConfig) -> Self {
        Self {
            identity: raw.identity,
            heartbeat: positive_or_none(raw.heartbeat),
            schedule_to_close: positive_or_none(raw.schedule_to_close),
            schedule_to_start: positive_or_none(raw.schedule_to_start),
            start_to_close: positive_or_none(raw.start_to_close),
            task_list: non_empty(raw.task_list),
            retry: raw.retry.map_or(DEFAULT_RETRY, clamp_non_negative),
            delay: clamp_non_negative(raw.delay),
            error_handling: raw.error_handling,
        }
    }
}

impl ActivityConfig {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            identity: TaskIdentity::new(name, version),
            heartbeat: None,
            schedule_to_close: None,
            schedule_to_start: None,
            start_to_close: None,
            task_list: None,
            retry: DEFAULT_RETRY,
            delay: DEFAULT_DELAY,
            error_handling: false,
        }
    }

    pub fn heartbeat(mut self, seconds: i64) -> Self {
        self.heartbeat = positive_or_none(Some(seconds));
        self
    }

    pub fn schedule_to_close(mut self, seconds: i64) -> Self {
        self.schedule_to_close = positive_or_none(Some(seconds));
        self
    }

    pub fn schedule_to_start(mut self, seconds: i64) -> Self {
        self.schedule_to_start = positive_or_none(Some(seconds));
        self
    }

    pub fn start_to_close(mut self, seconds: i64) -> Self {
        self.start_to_close = positive_or_none(Some(seconds));
        self
    }

    pub fn task_list(mut self, task_list: impl Into<String>) -> Self {
        self.task_list = non_empty(Some(task_list.into()));
        self
    }

    pub fn retry(mut self, retry: i64) -> Self {
        self.retry = clamp_non_negative(retry);
        self
    }

    pub fn delay(mut self, delay: i64) -> Self {
        self.delay = clamp_non_negative(delay);
        self
    }

    pub fn error_handling(mut self, enabled: bool) -> Self {
        self.error_handling = enabled;
        self
    }

    pub fn identity(&self) -> &TaskIdentity {
        &self.identity
    }

    pub fn heartbeat_timeout(&self) -> Option<u64> {
        self.heartbeat
    }

    pub fn schedule_to_close_timeout(&self) -> Option<u64> {
        self.schedule_to_close
    }

    pub fn schedule_to_start_timeout(&self) -> Option<u64> {
        self.schedule_to_start
    }

    pub fn start_to_close_timeout(&self) -> Option<u64> {
        self.start_to_close
    }

    pub fn task_list_name(&self) -> Option<&str> {
        self.task_list.as_deref()
    }

    pub fn retries(&self) -> u64 {
        self.retry
    }

    pub fn delay_seconds(&self) -> u64 {
        self.delay
    }

    pub fn handles_errors(&self) -> bool {
        self.error_handling
    }

    /// `CallOptions` の値で上書きしたコピーを返す（指定のないものはそのまま）
    pub fn with_overrides(&self, options: &CallOptions) -> Self {
        let mut config = self.clone();
        if options.heartbeat.is_some() {
            config.heartbeat = options.heartbeat;
        }
        if options.schedule_to_close.is_some() {
            config.schedule_to_close = options.schedule_to_close;
        }
        if options.schedule_to_start.is_some() {
            config.schedule_to_start = options.schedule_to_start;
        }
        if options.start_to_close.is_some() {
            config.start_to_close = options.start_to_close;
        }
        if options.task_list.is_some() {
            config.task_list = options.task_list.clone();
        }
        if let Some(retry) = options.retry {
            config.retry = retry;
        }
        if let Some(delay) = options.delay {
            config.delay = delay;
        }
        config
    }
}

// ========================================
// Workflow
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawWorkflowConfig")]
pub struct WorkflowConfig {
    #[serde(flatten)]
    identity: TaskIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_list: Option<String>,
    retry: u64,
    delay: u64,
    error_handling: bool,
}

#[derive(Deserialize)]
struct RawWorkflowConfig {
    #[serde(flatten)]
    identity: TaskIdentity,
    #[serde(default)]
    decision_duration: Option<i64>,
    #[serde(default)]
    workflow_duration: Option<i64>,
    #[serde(default)]
    task_list: Option<String>,
    #[serde(default)]
    retry: Option<i64>,
    #[serde(default)]
    delay: i64,
    #[serde(default)]
    error_handling: bool,
}

impl From<RawWorkflowConfig> for WorkflowConfig {
    fn from(raw: RawWorkflowConfig) -> Self {
        Self {
            identity: raw.identity,
            decision_duration: positive_or_none(raw.decision_duration),
            workflow_duration: positive_or_none(raw.workflow_duration),
            task_list: non_empty(raw.task_list),
            retry: raw.retry.map_or(DEFAULT_RETRY, clamp_non_negative),
            delay: clamp_non_negative(raw.delay),
            error_handling: raw.error_handling,
        }
    }
}

impl WorkflowConfig {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            identity: TaskIdentity::new(name, version),
            decision_duration: None,
            workflow_duration: None,
            task_list: None,
            retry: DEFAULT_RETRY,
            delay: DEFAULT_DELAY,
            error_handling: false,
        }
    }

    pub fn decision_duration(mut self, seconds: i64) -> Self {
        self.decision_duration = positive_or_none(Some(seconds));
        self
    }

    pub fn workflow_duration(mut self, seconds: i64) -> Self {
        self.workflow_duration = positive_or_none(Some(seconds));
        self
    }

    pub fn task_list(mut self, task_list: impl Into<String>) -> Self {
        self.task_list = non_empty(Some(task_list.into()));
        self
    }

    pub fn retry(mut self, retry: i64) -> Self {
        self.retry = clamp_non_negative(retry);
        self
    }

    pub fn delay(mut self, delay: i64) -> Self {
        self.delay = clamp_non_negative(delay);
        self
    }

    pub fn error_handling(mut self, enabled: bool) -> Self {
        self.error_handling = enabled;
        self
    }

    pub fn identity(&self) -> &TaskIdentity {
        &self.identity
    }

    pub fn decision_duration_timeout(&self) -> Option<u64> {
        self.decision_duration
    }

    pub fn workflow_duration_timeout(&self) -> Option<u64> {
        self.workflow_duration
    }

    pub fn task_list_name(&self) -> Option<&str> {
        self.task_list.as_deref()
    }

    pub fn retries(&self) -> u64 {
        self.retry
    }

    pub fn delay_seconds(&self) -> u64 {
        self.delay
    }

    pub fn handles_errors(&self) -> bool {
        self.error_handling
    }

    pub fn with_overrides(&self, options: &CallOptions) -> Self {
        let mut config = self.clone();
        if options.decision_duration.is_some() {
            config.decision_duration = options.decision_duration;
        }
        if options.workflow_duration.is_some() {
            config.workflow_duration = options.workflow_duration;
        }
        if options.task_list.is_some() {
            config.task_list = options.task_list.clone();
        }
        if let Some(retry) = options.retry {
            config.retry = retry;
        }
        if let Some(delay) = options.delay {
            config.delay = delay;
        }
        config
    }
}

// ========================================
// Per-call overrides
// ========================================

/// 次の remote call だけに適用する設定の上書き
///
/// activity 用と workflow 用の項目が混在しています。
/// 呼び出し先に関係ない項目は無視されます。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCallOptions")]
pub struct CallOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    heartbeat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule_to_close: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule_to_start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_to_close: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<u64>,
}

#[derive(Deserialize)]
struct RawCallOptions {
    #[serde(default)]
    heartbeat: Option<i64>,
    #[serde(default)]
    schedule_to_close: Option<i64>,
    #[serde(default)]
    schedule_to_start: Option<i64>,
    #[serde(default)]
    start_to_close: Option<i64>,
    #[serde(default)]
    decision_duration: Option<i64>,
    #[serde(default)]
    workflow_duration: Option<i64>,
    #[serde(default)]
    task_list: Option<String>,
    #[serde(default)]
    retry: Option<i64>,
    #[serde(default)]
    delay: Option<i64>,
}

impl From<RawCallOptions> for CallOptions {
    fn from(raw: RawCallOptions) -> Self {
        Self {
            heartbeat: positive_or_none(raw.heartbeat),
            schedule_to_close: positive_or_none(raw.schedule_to_close),
            schedule_to_start: positive_or_none(raw.schedule_to_start),
            start_to_close: positive_or_none(raw.start_to_close),
            decision_duration: positive_or_none(raw.decision_duration),
            workflow_duration: positive_or_none(raw.workflow_duration),
            task_list: non_empty(raw.task_list),
            retry: raw.retry.map(clamp_non_negative),
            delay: raw.delay.map(clamp_non_negative),
        }
    }
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heartbeat(mut self, seconds: i64) -> Self {
        self.heartbeat = positive_or_none(Some(seconds));
        self
    }

    pub fn schedule_to_close(mut self, seconds: i64) -> Self {
        self.schedule_to_close = positive_or_none(Some(seconds));
        self
    }

    pub fn schedule_to_start(mut self, seconds: i64) -> Self {
        self.schedule_to_start = positive_or_none(Some(seconds));
        self
    }

    pub fn start_to_close(mut self, seconds: i64) -> Self {
        self.start_to_close = positive_or_none(Some(seconds));
        self
    }

    pub fn decision_duration(mut self, seconds: i64) -> Self {
        self.decision_duration = positive_or_none(Some(seconds));
        self
    }

    pub fn workflow_duration(mut self, seconds: i64) -> Self {
        self.workflow_duration = positive_or_none(Some(seconds));
        self
    }

    pub fn task_list(mut self, task_list: impl Into<String>) -> Self {
        self.task_list = non_empty(Some(task_list.into()));
        self
    }

    pub fn retry(mut self, retry: i64) -> Self {
        self.retry = Some(clamp_non_negative(retry));
        self
    }

    pub fn delay(mut self, delay: i64) -> Self {
        self.delay = Some(clamp_non_negative(delay));
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 後から指定された値を優先して 2 つの上書きをまとめる
    pub fn merge(self, later: CallOptions) -> Self {
        Self {
            heartbeat: later.heartbeat.or(self.heartbeat),
            schedule_to_close: later.schedule_to_close.or(self.schedule_to_close),
            schedule_to_start: later.schedule_to_start.or(self.schedule_to_start),
            start_to_close: later.start_to_close.or(self.start_to_close),
            decision_duration: later.decision_duration.or(self.decision_duration),
            workflow_duration: later.workflow_duration.or(self.workflow_duration),
            task_list: later.task_list.or(self.task_list),
            retry: later.retry.or(self.retry),
            delay: later.delay.or(self.delay),
        }
    }
}
