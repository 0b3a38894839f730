//! # 会话状态模块
//!
//! 负责聊天会话的生命周期状态：配对、认证、加载、就绪、断开与重连策略。
//!
//! ## 设计原则
//!
//! 1. **单一写者**：只有 supervisor 把后端事件喂给状态机
//! 2. **线程安全**：状态放在 Arc<RwLock<T>> 里，HTTP handlers 只读
//! 3. **事件驱动**：后端事件是一个带标签的枚举，由一个转换函数处理
//! 4. **可观测**：每次实际发生的状态变更都会广播并记录日志

mod machine;
mod snapshot;
pub mod transitions;
mod types;

pub use machine::{Directive, SessionStateMachine, SessionView};
pub use snapshot::{HealthReporter, HealthSnapshot, PairingSnapshot};
pub use transitions::{LoadingEffect, PairingEffect, TransitionPlan};
pub use types::{
    BackendEvent, DisconnectReason, LoadingProgress, PairingArtifact, SessionStatus,
    StatusChange, LOGGED_OUT_CODE,
};
