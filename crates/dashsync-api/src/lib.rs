// dashsync-api: Async Rust client for the device-management dashboard API

pub mod client;
pub mod error;
pub mod transport;

pub use client::{API_KEY_HEADER, DEFAULT_BASE_URL, DashboardClient, Endpoint, JsonObject};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
