//! tempdrop: an ephemeral file drop server.
//!
//! Clients upload a file with a time-to-live and get back a storage key;
//! anyone holding the key can download the file until a background reaper
//! deletes it after expiration.
//!
//! - [`store`] - storage key codec, admission checks, persistence, lookup
//! - [`reaper`] - periodic deletion of expired files
//! - [`http`] - axum API on top of the store
//! - [`config`] - layered configuration (defaults, TOML, environment, flags)

pub mod commands;
pub mod config;
pub mod constants;
pub mod http;
pub mod reaper;
pub mod store;
pub mod telemetry;
