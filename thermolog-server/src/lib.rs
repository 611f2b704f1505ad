pub mod http;
pub mod query;
pub mod shutdown;
pub mod subsystems;
pub mod views;
