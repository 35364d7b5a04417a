//! Domain model (arguments, configuration, results, decisions, ...).
//!
//! ここにある型は Scheduler や Transport を知りません。
//! 「何を呼ぶか」「結果がどういう形か」だけを表現します。

pub mod args;
pub mod config;
pub mod decision;
pub mod errors;
pub mod ids;
pub mod invocation;
pub mod outcome;

pub use args::Args;
pub use config::{ActivityConfig, CallOptions, TaskIdentity, WorkflowConfig};
pub use decision::{Decision, HistoryEvent};
pub use errors::{BindingError, CodecError, Interrupt, TaskError};
pub use ids::{CallId, RunId};
pub use invocation::Invocation;
pub use outcome::{Completion, Ordered, RemoteResult};
