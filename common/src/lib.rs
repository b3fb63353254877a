pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentConfig, AuthConfig, Config, SimulatorConfig, MAX_TOKEN_TTL_SECS};
pub use error::ValidationError;
pub use types::*;
