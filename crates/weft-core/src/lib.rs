//! weft-core
//!
//! Client-side building blocks for durable, replay-driven workflows.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, args, config, outcome, decision, errors, invocation）
//! - **ports**: 外部との境界（Scheduler, Transport, Clock, IdGenerator）
//! - **typed**: Task のライフサイクル（Task trait, Activity / Workflow, Proxy, codec）
//! - **operations**: RemoteResult の組み合わせ（wait, first, all, finish_order, parallel_reduce）
//! - **impls**: 開発・テスト用の実装（ReplayScheduler, LocalTransport）
//!
//! # 実行モデル
//! Workflow の `run()` は decision pass ごとに最初から再実行されます（replay）。
//! Proxy 呼び出しはブロックせず、すぐに `RemoteResult` を返します。
//! `Pending` の `.result()` は `Interrupt::Suspend` になり、
//! Task はこのパスを suspend として Scheduler に伝えます。

pub mod domain;
pub mod impls;
pub mod operations;
pub mod ports;
pub mod typed;

pub use domain::{
    ActivityConfig, Args, BindingError, CallOptions, Completion, Interrupt, Invocation, Ordered,
    RemoteResult, TaskError, TaskIdentity, WorkflowConfig,
};
pub use typed::{
    Activity, ActivityContext, ActivityProxy, ActivityTask, CodecError, ProxySet, Task, Workflow,
    WorkflowContext, WorkflowProxy, WorkflowTask,
};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::{Map, json};
}

/// `Args` を組み立てるマクロ
///
/// 位置引数は `,` 区切り、キーワード引数は `;` の後ろに `"name" => value` で書きます。
///
/// ```ignore
/// let a = args![7, 2];
/// let b = args![7; "verbose" => true];
/// ```
///
/// # Panics
/// 値は `serde_json::json!` で変換するので、JSON にできない値（文字列以外のキーを持つ
/// map、失敗する `Serialize` 実装など）を渡すと panic します。そういう値は
/// `Args::push` / `Args::with` で組み立てて `CodecError` を受け取ってください。
///
/// ```ignore
/// let c = Args::new().push(7)?.with("lookup", by_pair)?;
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        $crate::domain::Args::from_parts(
            vec![$($crate::__private::json!($arg)),*],
            $crate::__private::Map::new(),
        )
    };
    ($($arg:expr),* ; $($key:literal => $value:expr),* $(,)?) => {{
        let mut keyword = $crate::__private::Map::new();
        $( keyword.insert(::std::string::String::from($key), $crate::__private::json!($value)); )*
        $crate::domain::Args::from_parts(vec![$($crate::__private::json!($arg)),*], keyword)
    }};
}
