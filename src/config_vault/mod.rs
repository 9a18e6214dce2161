//! Versioned, encrypted agent configuration.
//!
//! Each project carries an append-only log of agent configurations. Exactly
//! one version per project is active; creating a version deactivates the
//! previous one in the same atomic step, and rolling back copies an older
//! version forward as a new one. Credentials are encrypted at rest with a
//! fresh nonce per encryption and never leave the vault through the public
//! read path.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
