//! LocalTransport - activity の報告をメモリに記録する Transport
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で async context から安全に記録する
//! - Clock port で記録時刻を差し替え可能にする
//! - AtomicBool で「service に繋がらない」状態を注入する
//! - 完了・失敗を報告済みの token への報告は `TransportError::Rejected`

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::RemoteResult;
use crate::ports::{Clock, SystemClock, Transport, TransportError};

/// service に届いた報告 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    Completed {
        token: String,
        result: String,
        at: DateTime<Utc>,
    },
    Failed {
        token: String,
        reason: String,
        at: DateTime<Utc>,
    },
    Heartbeat {
        token: String,
        at: DateTime<Utc>,
    },
}

impl Report {
    pub fn token(&self) -> &str {
        match self {
            Self::Completed { token, .. }
            | Self::Failed { token, .. }
            | Self::Heartbeat { token, .. } => token,
        }
    }

    /// この報告で task が閉じるか（heartbeat 以外）
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Heartbeat { .. })
    }
}

/// # 使用例
/// ```ignore
/// let transport = Arc::new(LocalTransport::new(SystemClock));
/// let mut task = ActivityTask::new(Divider, invocation, transport.clone());
/// task.invoke().await?;
/// let outcome = transport.outcome("tok-1").await;
/// ```
pub struct LocalTransport<C = SystemClock> {
    clock: C,
    reports: Mutex<Vec<Report>>,
    unavailable: AtomicBool,
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> LocalTransport<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            reports: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// true の間はすべての呼び出しが `TransportError::Unavailable` で失敗する
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn reports(&self) -> Vec<Report> {
        self.reports.lock().await.clone()
    }

    /// token の最終結果（完了なら wire 形式の結果文字列）。まだ無ければ `Pending`
    pub async fn outcome(&self, token: &str) -> RemoteResult<String> {
        let reports = self.reports.lock().await;
        reports
            .iter()
            .rev()
            .find_map(|report| match report {
                Report::Completed { token: t, result, .. } if t == token => {
                    Some(RemoteResult::Value(result.clone()))
                }
                Report::Failed { token: t, reason, .. } if t == token => {
                    Some(RemoteResult::Failed(reason.clone()))
                }
                _ => None,
            })
            .unwrap_or(RemoteResult::Pending)
    }

    async fn push(
        &self,
        token: &str,
        report: impl FnOnce(DateTime<Utc>) -> Report,
    ) -> Result<(), TransportError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("local transport is offline".to_string()));
        }
        let mut reports = self.reports.lock().await;
        if reports.iter().any(|r| r.is_final() && r.token() == token) {
            return Err(TransportError::Rejected(format!("task {token} is already closed")));
        }
        reports.push(report(self.clock.now()));
        Ok(())
    }
}

#[async_trait]
impl<C: Clock> Transport for LocalTransport<C> {
    async fn respond_completed(&self, token: &str, result: &str) -> Result<(), TransportError> {
        self.push(token, |at| Report::Completed {
            token: token.to_string(),
            result: result.to_string(),
            at,
        })
        .await
    }

    async fn respond_failed(&self, token: &str, reason: &str) -> Result<(), TransportError> {
        self.push(token, |at| Report::Failed {
            token: token.to_string(),
            reason: reason.to_string(),
            at,
        })
        .await
    }

    async fn record_heartbeat(&self, token: &str) -> Result<(), TransportError> {
        self.push(token, |at| Report::Heartbeat {
            token: token.to_string(),
            at,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    fn fixed() -> (LocalTransport<FixedClock>, DateTime<Utc>) {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        (LocalTransport::new(FixedClock::new(at)), at)
    }

    #[tokio::test]
    async fn records_reports_with_clock_time() {
        let (transport, at) = fixed();

        transport.record_heartbeat("tok").await.unwrap();
        transport.respond_completed("tok", "true").await.unwrap();

        assert_eq!(
            transport.reports().await,
            vec![
                Report::Heartbeat {
                    token: "tok".to_string(),
                    at
                },
                Report::Completed {
                    token: "tok".to_string(),
                    result: "true".to_string(),
                    at
                },
            ]
        );
    }

    #[tokio::test]
    async fn outcome_follows_the_latest_report_for_the_token() {
        let (transport, _) = fixed();
        assert_eq!(transport.outcome("a").await, RemoteResult::Pending);

        transport.respond_failed("a", "boom").await.unwrap();
        transport.respond_completed("b", "2").await.unwrap();

        assert_eq!(transport.outcome("a").await, RemoteResult::Failed("boom".to_string()));
        assert_eq!(transport.outcome("b").await, RemoteResult::Value("2".to_string()));
    }

    #[tokio::test]
    async fn unavailable_transport_rejects_everything() {
        let (transport, _) = fixed();
        transport.set_unavailable(true);

        let err = transport.record_heartbeat("tok").await.unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
        assert!(transport.reports().await.is_empty());

        transport.set_unavailable(false);
        assert!(transport.record_heartbeat("tok").await.is_ok());
    }

    #[tokio::test]
    async fn closed_task_rejects_further_reports() {
        let (transport, _) = fixed();
        transport.respond_completed("tok", "true").await.unwrap();

        let err = transport.respond_failed("tok", "late").await.unwrap_err();
        assert_eq!(err, TransportError::Rejected("task tok is already closed".to_string()));
        assert!(matches!(
            transport.record_heartbeat("tok").await,
            Err(TransportError::Rejected(_))
        ));

        assert_eq!(transport.reports().await.len(), 1);
        assert_eq!(transport.outcome("tok").await, RemoteResult::Value("true".to_string()));
        assert!(transport.record_heartbeat("other").await.is_ok());
    }

    #[test]
    fn report_is_tagged_and_knows_its_token() {
        let (_, at) = fixed();
        let report = Report::Failed {
            token: "tok".to_string(),
            reason: "boom".to_string(),
            at,
        };
        assert_eq!(report.token(), "tok");
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["type"], "failed");
    }
}
