// Service modules
pub mod config;
pub mod database;
pub mod http_server;
pub mod process;
pub mod state;

// Re-exports for the binary and integration tests
pub use config::Config;
pub use database::Database;
pub use process::{init_logging, spawn_service, start_service, ShutdownHandle};
pub use state::State as ServiceState;
