//! HTTP服务器模块 - 暴露WhatsApp会话的发送、查询与健康API

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use models::*;
pub use server::*;
pub use state::*;
