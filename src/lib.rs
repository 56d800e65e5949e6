//! # Mediator
//!
//! A typed command mediator: callers send a request and get a typed result
//! back without holding a reference to the handler that produces it.
//!
//! ## Overview
//!
//! - **Registry**: one handler per request type. Registering a second
//!   handler for the same type fails until the first one is removed.
//! - **Mediator**: dispatches a request to its handler and enforces the
//!   result type the caller expects.
//! - **Capabilities**: a handler may offer a configuration check and a
//!   request validator. Both run before the handler executes.
//!
//! ## Dispatch Order
//!
//! ```text
//! lookup handler        -> NoHandler
//! check result type     -> ResultTypeMismatch
//! configuration check   -> Configuration
//! validate request      -> Validation
//! execute               -> handler's own error
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use mediator::prelude::*;
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl CommandHandler<String, String> for Greet {
//!     async fn execute(&self, _ctx: &Context, name: String) -> Result<String, BoxError> {
//!         Ok(format!("hello, {name}"))
//!     }
//! }
//!
//! # async fn example() -> MediatorResult<()> {
//! let registry = Registry::new();
//! let ctx = Context::background();
//! let _unregister = registry.register(&ctx, Greet).await?;
//!
//! let mediator = Mediator::new(registry);
//! let greeting: String = mediator.execute(&ctx, "world".to_string()).await?;
//! assert_eq!(greeting, "hello, world");
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Registration is meant to happen while the application starts up or a
//! test sets up. Once registration has settled, `execute` may be called
//! concurrently from any number of tasks.

mod config;
mod context;
mod error;
mod handler;
mod mediator;
mod registry;
mod token;

pub mod mock;
pub mod prelude;

// Re-export core types
pub use config::RegistryConfig;
pub use context::{CancelHandle, Context};
pub use error::{BoxError, ConfigurationError, MediatorError, MediatorResult, ValidationError};
pub use handler::{
    handler_fn, CommandHandler, ConfigurationChecker, FnHandler, NoResult, Request, Validator,
};
pub use mediator::Mediator;
pub use registry::{RegisteredHandler, Registry, Unregister};
pub use token::TypeToken;

// Re-export async-trait for convenience
pub use async_trait::async_trait;
