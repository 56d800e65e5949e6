//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits
//! from the mediator for convenient glob imports.
//!
//! # Example
//!
//! ```rust
//! use mediator::prelude::*;
//! ```

// Configuration
pub use crate::config::RegistryConfig;

// Core traits
pub use crate::handler::{
    handler_fn, CommandHandler, ConfigurationChecker, NoResult, Request, Validator,
};

// Registry and dispatch
pub use crate::context::{CancelHandle, Context};
pub use crate::mediator::Mediator;
pub use crate::registry::{Registry, Unregister};
pub use crate::token::TypeToken;

// Errors
pub use crate::error::{
    BoxError, ConfigurationError, MediatorError, MediatorResult, ValidationError,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
