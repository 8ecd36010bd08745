//! Unified configuration layer.
//!
//! All environment reads go through this module. Business code receives an
//! [`EnvSnapshot`] once per run and derives structured config from it instead
//! of calling `std::env::var` ad hoc.
//!
//! - `env_keys`: key constants
//! - `snapshot`: immutable copy of the process environment
//! - `loader`: `env_or`, `env_optional`, `env_bool` over a snapshot
//! - `schema`: `HarnessConfig`, `ObservabilityConfig`

pub mod env_keys;
pub mod loader;
pub mod schema;
pub mod snapshot;

pub use loader::{env_bool, env_optional, env_or};
pub use schema::{HarnessConfig, ObservabilityConfig};
pub use snapshot::EnvSnapshot;
