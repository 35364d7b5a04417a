//! Outcome model: the result of a remote call, and what a workflow returns.
//!
//! `RemoteResult` は proxy 呼び出しが即座に返す値です。
//! `.result()` が非同期の結果を同期的な値（または失敗）に変える唯一の場所です。
//!
//! | variant        | `.result()`                          |
//! |----------------|--------------------------------------|
//! | `Value(v)`     | `Ok(v)`                              |
//! | `Pending`      | `Err(Interrupt::Suspend)`            |
//! | `Failed(r)`    | `Err(TaskError::Failed(r))`          |
//! | `TimedOut`     | `Err(TaskError::TimedOut)`           |

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CodecError, Interrupt, TaskError};

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResult<T = Value> {
    /// 解決済み
    Value(T),

    /// このパスではまだ結果が無い
    Pending,

    /// remote 側が失敗した
    Failed(String),

    /// 設定されたタイムアウトを超えた
    TimedOut,
}

impl<T> RemoteResult<T> {
    pub fn result(self) -> Result<T, Interrupt> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Pending => Err(Interrupt::Suspend),
            Self::Failed(reason) => Err(TaskError::Failed(reason).into()),
            Self::TimedOut => Err(TaskError::TimedOut.into()),
        }
    }

    /// 失敗・タイムアウトなら対応する `TaskError`
    pub fn error(&self) -> Option<TaskError> {
        match self {
            Self::Failed(reason) => Some(TaskError::Failed(reason.clone())),
            Self::TimedOut => Some(TaskError::TimedOut),
            Self::Value(_) | Self::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Pending 以外（値・失敗・タイムアウト）なら true
    pub fn is_resolved(&self) -> bool {
        !self.is_pending()
    }

    pub fn as_ref(&self) -> RemoteResult<&T> {
        match self {
            Self::Value(v) => RemoteResult::Value(v),
            Self::Pending => RemoteResult::Pending,
            Self::Failed(reason) => RemoteResult::Failed(reason.clone()),
            Self::TimedOut => RemoteResult::TimedOut,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> RemoteResult<U> {
        match self {
            Self::Value(v) => RemoteResult::Value(f(v)),
            Self::Pending => RemoteResult::Pending,
            Self::Failed(reason) => RemoteResult::Failed(reason),
            Self::TimedOut => RemoteResult::TimedOut,
        }
    }
}

impl RemoteResult<Value> {
    /// JSON の値を `U` に変換する。変換できなければ `Failed` になる。
    pub fn decode<U: DeserializeOwned>(self) -> RemoteResult<U> {
        match self {
            Self::Value(v) => match serde_json::from_value(v) {
                Ok(u) => RemoteResult::Value(u),
                Err(e) => RemoteResult::Failed(CodecError::Decode(e).to_string()),
            },
            Self::Pending => RemoteResult::Pending,
            Self::Failed(reason) => RemoteResult::Failed(reason),
            Self::TimedOut => RemoteResult::TimedOut,
        }
    }
}

/// history 上で解決した位置つきの `RemoteResult`
///
/// `position` は結果のイベントが history の何番目に記録されたか。
/// 未解決なら `None`。replay しても同じ値になるので、終わった順に並べるのに使えます。
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<T = Value> {
    result: RemoteResult<T>,
    position: Option<u64>,
}

impl<T> Ordered<T> {
    pub fn new(result: RemoteResult<T>, position: Option<u64>) -> Self {
        Self { result, position }
    }

    pub fn result(&self) -> &RemoteResult<T> {
        &self.result
    }

    pub fn into_inner(self) -> RemoteResult<T> {
        self.result
    }

    pub fn position(&self) -> Option<u64> {
        self.position
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Ordered<U> {
        Ordered {
            result: self.result.map(f),
            position: self.position,
        }
    }
}

impl Ordered<Value> {
    pub fn decode<U: DeserializeOwned>(self) -> Ordered<U> {
        Ordered {
            result: self.result.decode(),
            position: self.position,
        }
    }
}

/// 位置が分からない結果。終わった順では呼び出し順の扱いになる
impl<T> From<RemoteResult<T>> for Ordered<T> {
    fn from(result: RemoteResult<T>) -> Self {
        Self::new(result, None)
    }
}

/// Workflow の `run()` が返すもの
///
/// - `Plain(v)`: ふつうの値。そのまま finish
/// - `Remote(r)`: remote call の結果をそのまま返した。variant によって finish / fail / suspend
/// - `Restarted`: `WorkflowContext::restart` が作る continue-as-new の要求。finish の代わりに restart
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T = Value> {
    Plain(T),
    Remote(RemoteResult),
    Restarted(RestartRequest),
}

/// wire 形式にした次の run の引数。クレート内でしか作れない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    arguments: String,
}

impl RestartRequest {
    pub(crate) fn new(arguments: String) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    pub(crate) fn into_arguments(self) -> String {
        self.arguments
    }
}

impl<T> Completion<T> {
    pub fn plain(value: T) -> Self {
        Self::Plain(value)
    }
}

impl<T> From<RemoteResult> for Completion<T> {
    fn from(result: RemoteResult) -> Self {
        Self::Remote(result)
    }
}
