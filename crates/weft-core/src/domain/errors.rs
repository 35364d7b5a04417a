//! Errors - エラー型と分類
//!
//! # 分類
//! - `Interrupt::Suspend`: エラーではない。pending の結果があるのでこのパスは終わり
//! - `TaskError`: remote の activity / workflow が失敗 or タイムアウト
//! - `CodecError`: 引数・結果の encode / decode 失敗（ローカルで回収）
//! - `BindingError`: Proxy の使い方の誤り（回収しない）
//!
//! Transport の失敗は `ports::transport::TransportError` を参照。

use thiserror::Error;

/// Remote call の失敗
///
/// `Failed` の Display は理由の文字列そのもの。Workflow の fail にそのまま渡されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("task timed out")]
    TimedOut,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json encode: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("json decode: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("missing positional argument at index {0}")]
    MissingArgument(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("proxy '{0}' is already declared")]
    AlreadyDeclared(String),

    #[error("no scheduler bound to proxy '{0}'")]
    Unbound(String),
}

/// `run()` を途中で抜ける理由
///
/// `Suspend` は制御フロー用のシグナルで、失敗ではありません。
/// それ以外は Task 境界で `fail(reason)` に変換されます（`Binding` を除く）。
///
/// `?` で `TaskError` / `CodecError` / `BindingError` から変換できるので、
/// workflow のコードは同期的に見える形で書けます。
///
/// ```ignore
/// let divisible: bool = ctx.call("div", args![n, i])?.decode().result()?;
/// ```
#[derive(Debug, Error)]
pub enum Interrupt {
    #[error("suspended: waiting for pending results")]
    Suspend,

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("{0}")]
    Failed(String),
}

impl Interrupt {
    /// User code からの失敗
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    pub fn is_suspend(&self) -> bool {
        matches!(self, Self::Suspend)
    }

    /// Remote call 由来の失敗なら取り出す（補償ロジック用）
    pub fn task_error(&self) -> Option<&TaskError> {
        match self {
            Self::Task(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_displays_reason_verbatim() {
        let e = TaskError::Failed("boom".to_string());
        assert_eq!(e.to_string(), "boom");
        assert_eq!(Interrupt::from(e).to_string(), "boom");
    }

    #[test]
    fn suspend_is_not_a_task_error() {
        let i = Interrupt::Suspend;
        assert!(i.is_suspend());
        assert!(i.task_error().is_none());
    }

    #[test]
    fn question_mark_converts_task_errors() {
        fn body() -> Result<(), Interrupt> {
            Err(TaskError::TimedOut)?;
            Ok(())
        }
        let err = body().unwrap_err();
        assert_eq!(err.task_error(), Some(&TaskError::TimedOut));
    }
}
