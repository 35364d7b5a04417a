//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **ReplayScheduler**: history を replay して decision を積む Scheduler
//! - **LocalTransport**: activity の報告をメモリに記録する Transport
//!
//! # 本番用実装
//! 本物の decision engine と service client は別クレートに置きます。
//! どちらも `ports` の trait を実装するだけで差し替えられます。

pub mod local_transport;
pub mod replay_scheduler;

pub use self::local_transport::{LocalTransport, Report};
pub use self::replay_scheduler::ReplayScheduler;
