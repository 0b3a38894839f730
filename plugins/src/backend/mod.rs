mod gateway;
mod http;

pub use gateway::GatewayBackend;
pub use http::GatewayClient;
