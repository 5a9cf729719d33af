pub mod error_handler;
pub mod ws_client;

pub use error_handler::{ExponentialBackoff, MaxRetriesExceeded};
pub use ws_client::{run_stream_with_reconnect, StreamClientConfig};
