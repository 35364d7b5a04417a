//! Typed - Task のライフサイクルと、ユーザーが実装する trait
//!
//! # 二層構造
//! - **表層（User）**: `Activity` / `Workflow` trait - ユーザーが実装する本体
//! - **内部（Task）**: `ActivityTask` / `WorkflowTask` - invocation を受けて
//!   ライフサイクル（suspend / fail / finish）を回す
//!
//! Proxy は `Workflow::proxies()` で宣言し、`WorkflowTask::new` で束縛します。

pub mod activity;
pub mod codec;
pub mod proxy;
pub mod task;
pub mod workflow;

pub use self::activity::{Activity, ActivityContext, ActivityTask};
pub use self::codec::CodecError;
pub use self::proxy::{ActivityProxy, Proxy, ProxySet, WorkflowProxy};
pub use self::task::Task;
pub use self::workflow::{Workflow, WorkflowContext, WorkflowTask};
