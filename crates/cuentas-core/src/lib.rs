//! # cuentas-core
//!
//! Core types, traits, configuration, and error handling for the Cuentas
//! finance assistant.

pub mod clock;
pub mod config;
pub mod error;
pub mod finance;
pub mod intent;
pub mod limits;
pub mod message;
pub mod traits;

pub use config::shellexpand;
