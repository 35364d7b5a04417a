//! Decision model: what a workflow decision pass asks the backend to do.
//!
//! `Decision` は Scheduler が 1 回の decision pass で積み上げる出力、
//! `HistoryEvent` は backend が永続化している入力（イベントログ）です。
//! 次のパスでは history から Scheduler の状態を組み立て直します。

use serde::{Deserialize, Serialize};

use super::config::{ActivityConfig, WorkflowConfig};
use super::ids::{CallId, RunId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Activity を task list に積む
    ScheduleActivity {
        call_id: CallId,
        input: String,
        config: ActivityConfig,
    },

    /// Child workflow を開始する
    StartSubworkflow {
        call_id: CallId,
        input: String,
        config: WorkflowConfig,
    },

    /// Workflow を完了する
    Complete { result: String },

    /// Workflow を失敗させる
    Fail { reason: String },

    /// 何もせず、history が増えたら再実行してもらう
    Suspend,

    /// continue-as-new
    Restart { input: String, next_run_id: RunId },
}

impl Decision {
    /// finish / fail / suspend / restart のいずれか
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::ScheduleActivity { .. } | Self::StartSubworkflow { .. }
        )
    }

    pub fn call_id(&self) -> Option<CallId> {
        match self {
            Self::ScheduleActivity { call_id, .. } | Self::StartSubworkflow { call_id, .. } => {
                Some(*call_id)
            }
            _ => None,
        }
    }
}

/// backend の history に記録されたイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEvent {
    Scheduled { call_id: CallId, input: String },
    Completed { call_id: CallId, result: String },
    Failed { call_id: CallId, reason: String },
    TimedOut { call_id: CallId },
}

impl HistoryEvent {
    pub fn call_id(&self) -> CallId {
        match self {
            Self::Scheduled { call_id, .. }
            | Self::Completed { call_id, .. }
            | Self::Failed { call_id, .. }
            | Self::TimedOut { call_id } => *call_id,
        }
    }

    /// 結果イベント（完了・失敗・タイムアウト）なら true
    pub fn is_resolution(&self) -> bool {
        !matches!(self, Self::Scheduled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_is_tagged_enum() {
        let d = Decision::Fail {
            reason: "boom".to_string(),
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["type"], "fail");
        assert_eq!(v["reason"], "boom");
        assert!(d.is_terminal());
    }

    #[test]
    fn schedule_decision_carries_call_id() {
        let d = Decision::ScheduleActivity {
            call_id: CallId::new(3),
            input: "[[], {}]".to_string(),
            config: ActivityConfig::new("a", "1"),
        };
        assert_eq!(d.call_id(), Some(CallId::new(3)));
        assert!(!d.is_terminal());
    }

    #[test]
    fn history_event_roundtrip() {
        let e = HistoryEvent::Completed {
            call_id: CallId::new(1),
            result: "true".to_string(),
        };
        let s = serde_json::to_string(&e).unwrap();
        let back: HistoryEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, e);
        assert!(back.is_resolution());
    }
}
