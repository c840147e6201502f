//! Infrastructure - port traits and the adapters behind them.

pub mod clock;
pub mod credentials;
pub mod gemini;
pub mod model_handle;
pub mod ports;
pub mod request_guard;
pub mod telemetry;
