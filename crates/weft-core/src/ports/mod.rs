//! Ports - 外部システムとの境界
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 本物の backend（decision の replay エンジンや service の transport client）は
//! このクレートの外にあり、ここでは trait の形だけを決めます。
//!
//! # 設計原則
//! - Scheduler は 1 回の Task 呼び出しが占有する（共有しない）
//! - Transport の失敗は Task 側で bool に変換される
//! - 時刻と ID 生成は差し替え可能にしてテストを決定的にする

pub mod clock;
pub mod id_generator;
pub mod scheduler;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::scheduler::{ActivityCall, Scheduler, SubworkflowCall};
pub use self::transport::{Transport, TransportError};
