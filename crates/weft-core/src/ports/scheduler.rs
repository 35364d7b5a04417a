//! Scheduler port - decision pass の中で workflow が使う能力
//!
//! 本物の実装は backend の history を replay して状態を組み立てます。
//! このクレートには開発・テスト用の `impls::ReplayScheduler` があります。
//!
//! # 契約
//! - remote call は決してブロックせず、すぐに `RemoteResult` を返す
//! - 呼び出し順で history のイベントと対応付ける（だから workflow は決定的に）
//! - 1 つの Scheduler は 1 回の Task 呼び出しが占有する
//! - retry / delay / timeouts はそのまま backend に渡す設定値

use crate::domain::{ActivityConfig, Args, CallOptions, RemoteResult, WorkflowConfig};
use crate::typed::codec::{ArgsSerializer, ResultDeserializer};

/// `remote_activity` に渡されるもの一式
#[derive(Debug, Clone)]
pub struct ActivityCall {
    pub args: Args,
    pub args_serializer: ArgsSerializer,
    pub result_deserializer: ResultDeserializer,
    pub config: ActivityConfig,
}

/// `remote_subworkflow` に渡されるもの一式
#[derive(Debug, Clone)]
pub struct SubworkflowCall {
    pub args: Args,
    pub args_serializer: ArgsSerializer,
    pub result_deserializer: ResultDeserializer,
    pub config: WorkflowConfig,
}

pub trait Scheduler: Send {
    fn remote_activity(&mut self, call: ActivityCall) -> RemoteResult;

    fn remote_subworkflow(&mut self, call: SubworkflowCall) -> RemoteResult;

    /// このパスでは何も決めない（history が増えたら再実行）
    fn suspend(&mut self);

    fn fail(&mut self, reason: &str);

    fn finish(&mut self, result: String);

    /// continue-as-new。`arguments` は `[args, kwargs]` の wire 形式
    fn restart(&mut self, arguments: String);

    /// 次の remote call に適用する設定の上書き
    fn options(&mut self, overrides: CallOptions);

    /// 直前の remote call の結果が history の何番目で記録されたか
    ///
    /// 未解決、または位置を持たない実装なら `None`。
    fn resolution_position(&self) -> Option<u64> {
        None
    }
}
