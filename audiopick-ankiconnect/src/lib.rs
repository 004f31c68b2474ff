pub mod client;
pub mod error;
pub mod protocol;

pub use client::AnkiConnectClient;
pub use error::AnkiConnectError;
