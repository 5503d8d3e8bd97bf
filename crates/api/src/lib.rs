pub mod error;
pub mod http;
pub mod repository;
pub mod server;
pub mod session;

pub use http::{AppState, RouterConfig, router};
