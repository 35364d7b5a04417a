//! Task trait - 1 回の invocation のライフサイクル
//!
//! `invoke()` の流れ:
//! 1. `input` から `[args, kwargs]` をデコード
//! 2. `run(args)` を実行
//! 3. 結果に応じて `suspend` / `fail` / `finish` のどれか 1 つだけを呼ぶ
//!
//! `invoke()` は失敗を外に漏らしません。worker プロセスが落ちると task token が
//! 失われるからです。唯一の例外は `BindingError`（使い方の誤り）で、
//! このときはどのライフサイクルも呼ばずに呼び出し元へ返します。

use async_trait::async_trait;
use tracing::{Instrument, Span};

use super::codec;
use crate::domain::{Args, BindingError, Interrupt, Invocation};

#[async_trait]
pub trait Task: Send {
    /// `run()` が返す値
    type Output: Send;

    /// ライフサイクル hook が返す値（activity は報告できたかの bool）
    type Signal: Send;

    fn invocation(&self) -> &Invocation;

    /// ログを書き込む span（生成時に渡される）
    fn span(&self) -> &Span;

    async fn run(&mut self, args: Args) -> Result<Self::Output, Interrupt>;

    async fn suspend(&mut self) -> Self::Signal;

    async fn fail(&mut self, reason: String) -> Self::Signal;

    async fn finish(&mut self, result: Self::Output) -> Self::Signal;

    async fn invoke(&mut self) -> Result<Self::Signal, BindingError> {
        let span = self.span().clone();
        async move {
            let args = match codec::deserialize_args(self.invocation().input()) {
                Ok(args) => args,
                Err(e) => {
                    tracing::error!(error = %e, "could not decode the task input");
                    return Ok(self.fail(e.to_string()).await);
                }
            };

            match self.run(args).await {
                Ok(output) => Ok(self.finish(output).await),
                Err(Interrupt::Suspend) => {
                    tracing::debug!("task suspended on a pending result");
                    Ok(self.suspend().await)
                }
                Err(Interrupt::Binding(e)) => {
                    tracing::error!(error = %e, "proxy used without a bound scheduler");
                    Err(e)
                }
                Err(e) => {
                    tracing::error!(error = %e, "error while running the task");
                    Ok(self.fail(e.to_string()).await)
                }
            }
        }
        .instrument(span)
        .await
    }
}
