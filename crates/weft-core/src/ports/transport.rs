//! Transport port - activity の結果を service に報告する client
//!
//! 失敗は `TransportError` で返しますが、`ActivityTask` がログに残して
//! bool に変換するので、worker プロセスまで伝播することはありません。

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("service rejected the request: {0}")]
    Rejected(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn respond_completed(&self, token: &str, result: &str) -> Result<(), TransportError>;

    async fn respond_failed(&self, token: &str, reason: &str) -> Result<(), TransportError>;

    async fn record_heartbeat(&self, token: &str) -> Result<(), TransportError>;
}
