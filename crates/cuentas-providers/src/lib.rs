//! # cuentas-providers
//!
//! HTTP implementations of the collaborators the Cuentas pipeline consumes:
//! the financial REST backend, the intent classifier, and the reply humanizer.

pub mod backend;
pub mod classifier;
pub mod humanizer;
mod openai;

pub use backend::HttpBackend;
pub use classifier::LlmClassifier;
pub use humanizer::LlmHumanizer;
