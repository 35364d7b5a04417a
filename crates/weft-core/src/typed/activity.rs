//! Activity - remote で実行される 1 つの仕事
//!
//! Activity は決定的である必要がありません。結果（または失敗）を Transport 経由で
//! service に報告するだけです。suspend はしません。
//!
//! Transport の失敗はログに残して `false` を返します。heartbeat を取りこぼしても
//! 致命的ではありません（タイムアウトや再試行の方針は backend が持っています）。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{Instrument, Span};

use super::codec;
use super::task::Task;
use crate::domain::{Args, Interrupt, Invocation};
use crate::ports::Transport;

/// service が受け付ける失敗理由の最大長（文字数）
pub const MAX_REASON_LEN: usize = 256;

/// User が実装する activity 本体
///
/// # 使用例
/// ```ignore
/// struct Divider;
///
/// #[async_trait]
/// impl Activity for Divider {
///     type Output = bool;
///
///     async fn run(&self, _ctx: &ActivityContext<'_>, args: Args) -> Result<bool, Interrupt> {
///         let (n, i): (u64, u64) = args.decode()?;
///         Ok(n % i == 0)
///     }
/// }
/// ```
#[async_trait]
pub trait Activity: Send + Sync {
    type Output: Serialize + Send;

    async fn run(&self, ctx: &ActivityContext<'_>, args: Args) -> Result<Self::Output, Interrupt>;
}

/// `run()` の中から使える能力（今は heartbeat だけ）
pub struct ActivityContext<'a> {
    token: &'a str,
    transport: &'a dyn Transport,
}

impl ActivityContext<'_> {
    pub fn token(&self) -> &str {
        self.token
    }

    pub async fn heartbeat(&self) -> bool {
        record_heartbeat(self.transport, self.token).await
    }
}

async fn record_heartbeat(transport: &dyn Transport, token: &str) -> bool {
    match transport.record_heartbeat(token).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "error while sending the heartbeat");
            false
        }
    }
}

/// 先頭から `MAX_REASON_LEN` 文字までに切り詰める
pub fn truncate_reason(reason: &str) -> &str {
    match reason.char_indices().nth(MAX_REASON_LEN) {
        Some((idx, _)) => &reason[..idx],
        None => reason,
    }
}

pub struct ActivityTask<A> {
    activity: A,
    invocation: Invocation,
    transport: Arc<dyn Transport>,
    span: Span,
}

impl<A: Activity> ActivityTask<A> {
    pub fn new(activity: A, invocation: Invocation, transport: Arc<dyn Transport>) -> Self {
        let span = tracing::info_span!("activity", token = %invocation.token());
        Self {
            activity,
            invocation,
            transport,
            span,
        }
    }

    /// ログの出力先 span を差し替える
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn token(&self) -> &str {
        self.invocation.token()
    }

    pub async fn heartbeat(&self) -> bool {
        record_heartbeat(self.transport.as_ref(), self.invocation.token())
            .instrument(self.span.clone())
            .await
    }
}

#[async_trait]
impl<A: Activity> Task for ActivityTask<A> {
    type Output = A::Output;
    type Signal = bool;

    fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    fn span(&self) -> &Span {
        &self.span
    }

    async fn run(&mut self, args: Args) -> Result<A::Output, Interrupt> {
        let ctx = ActivityContext {
            token: self.invocation.token(),
            transport: self.transport.as_ref(),
        };
        self.activity.run(&ctx, args).await
    }

    async fn suspend(&mut self) -> bool {
        // 報告するものが無い
        tracing::debug!("activities do not suspend; nothing reported");
        true
    }

    async fn fail(&mut self, reason: String) -> bool {
        let reason = truncate_reason(&reason);
        match self
            .transport
            .respond_failed(self.invocation.token(), reason)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "error while failing the activity");
                false
            }
        }
    }

    async fn finish(&mut self, result: A::Output) -> bool {
        let result = match codec::serialize_result(&result) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "could not serialize result");
                return false;
            }
        };
        match self
            .transport
            .respond_completed(self.invocation.token(), &result)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "error while completing the activity");
                false
            }
        }
    }
}
