//! chatbridge-core: 会话生命周期、幂等发送与健康快照

pub mod api;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod state;
