//! Registry of command handlers.
//!
//! The `Registry` maps request types to handlers. Each request type has at
//! most one handler at a time; registering a second one fails until the
//! first is removed.
//!
//! A `Registry` is a handle: clones share the same underlying map, so the
//! same registry can be given to a [`Mediator`](crate::Mediator), to
//! application wiring code and to test doubles.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::context::Context;
use crate::error::{ConfigurationError, MediatorError, MediatorResult};
use crate::handler::{CommandHandler, Request};
use crate::token::TypeToken;

/// Stored registration; `handler` holds an `Arc<dyn CommandHandler<Req, Res>>`.
#[derive(Debug)]
struct Entry {
    handler: Arc<dyn Any + Send + Sync>,
    handler_name: &'static str,
    result_type: TypeToken,
    generation: u64,
}

#[derive(Debug, Default)]
struct Handlers {
    entries: HashMap<TypeToken, Entry>,
    next_generation: u64,
}

/// A registry of command handlers keyed by request type.
///
/// # Example
///
/// ```rust
/// use mediator::{handler_fn, BoxError, Context, Registry};
///
/// # async fn example() -> Result<(), mediator::MediatorError> {
/// let registry = Registry::new();
/// let ctx = Context::background();
///
/// let unregister = registry
///     .register(&ctx, handler_fn(|_ctx: Context, n: u32| async move {
///         Ok::<_, BoxError>(n + 1)
///     }))
///     .await?;
/// assert!(registry.contains::<u32>());
///
/// unregister.remove();
/// assert!(!registry.contains::<u32>());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    handlers: Arc<RwLock<Handlers>>,
    config: Arc<RegistryConfig>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            handlers: Arc::default(),
            config: Arc::new(config),
        })
    }

    /// The registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a handler for requests of type `Req` returning `Res`.
    ///
    /// Fails with [`MediatorError::AlreadyRegistered`] if a handler is
    /// already registered for `Req`. If the handler offers a configuration
    /// check it is run first; a failing check leaves the registry untouched
    /// and returns [`MediatorError::Configuration`].
    pub async fn register<Req, Res, H>(&self, ctx: &Context, handler: H) -> MediatorResult<Unregister>
    where
        Req: Request,
        Res: Send + 'static,
        H: CommandHandler<Req, Res>,
    {
        self.register_shared(ctx, Arc::new(handler)).await
    }

    /// Register a handler that is shared with the caller.
    pub async fn register_shared<Req, Res>(
        &self,
        ctx: &Context,
        handler: Arc<dyn CommandHandler<Req, Res>>,
    ) -> MediatorResult<Unregister>
    where
        Req: Request,
        Res: Send + 'static,
    {
        let request = TypeToken::of::<Req>();
        self.ensure_vacant(request)?;

        if let Some(checker) = handler.configuration_checker() {
            if let Err(err) = checker.check_configuration(ctx).await {
                let err = ConfigurationError::classify(handler.handler_name(), err);
                warn!(
                    registry = self.config.name(),
                    request = %request,
                    handler = handler.handler_name(),
                    error = %err,
                    "handler rejected by configuration check"
                );
                return Err(err.into());
            }
        }

        self.insert(handler)
    }

    /// Store a handler without consulting its configuration check.
    pub(crate) fn insert<Req, Res>(
        &self,
        handler: Arc<dyn CommandHandler<Req, Res>>,
    ) -> MediatorResult<Unregister>
    where
        Req: Request,
        Res: Send + 'static,
    {
        let request = TypeToken::of::<Req>();
        let handler_name = handler.handler_name();

        let generation = {
            let mut handlers = self.handlers.write();
            if let Some(existing) = handlers.entries.get(&request) {
                return Err(MediatorError::AlreadyRegistered {
                    handler: existing.handler_name,
                    request,
                });
            }
            handlers.next_generation += 1;
            let generation = handlers.next_generation;
            let handler: Arc<dyn Any + Send + Sync> = Arc::new(handler);
            handlers.entries.insert(
                request,
                Entry {
                    handler,
                    handler_name,
                    result_type: TypeToken::of::<Res>(),
                    generation,
                },
            );
            generation
        };

        if self.config.is_verbose() {
            info!(registry = self.config.name(), request = %request, handler = handler_name, "handler registered");
        } else {
            debug!(registry = self.config.name(), request = %request, handler = handler_name, "handler registered");
        }

        Ok(Unregister {
            handlers: Arc::downgrade(&self.handlers),
            request,
            generation,
        })
    }

    fn ensure_vacant(&self, request: TypeToken) -> MediatorResult<()> {
        match self.handlers.read().entries.get(&request) {
            Some(existing) => Err(MediatorError::AlreadyRegistered {
                handler: existing.handler_name,
                request,
            }),
            None => Ok(()),
        }
    }

    /// Remove the handler for requests of type `Req`.
    ///
    /// Returns true if a handler was removed.
    pub fn unregister<Req: Request>(&self) -> bool {
        self.unregister_type(&TypeToken::of::<Req>())
    }

    /// Remove the handler registered for the given request type.
    pub fn unregister_type(&self, request: &TypeToken) -> bool {
        let removed = self.handlers.write().entries.remove(request);
        match removed {
            Some(entry) => {
                debug!(registry = self.config.name(), request = %request, handler = entry.handler_name, "handler unregistered");
                true
            }
            None => false,
        }
    }

    /// Look up the handler registered for the given request type.
    pub fn lookup(&self, request: &TypeToken) -> Option<RegisteredHandler> {
        self.handlers
            .read()
            .entries
            .get(request)
            .map(|entry| RegisteredHandler {
                handler: Arc::clone(&entry.handler),
                handler_name: entry.handler_name,
                request_type: *request,
                result_type: entry.result_type,
            })
    }

    /// Check if a handler is registered for requests of type `Req`.
    pub fn contains<Req: Request>(&self) -> bool {
        self.handlers
            .read()
            .entries
            .contains_key(&TypeToken::of::<Req>())
    }

    /// Get the request types that have a registered handler.
    pub fn request_types(&self) -> Vec<TypeToken> {
        self.handlers.read().entries.keys().copied().collect()
    }

    /// Get the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().entries.is_empty()
    }

    /// Remove all handlers from the registry.
    pub fn clear(&self) {
        self.handlers.write().entries.clear();
    }
}

/// A handler found by [`Registry::lookup`].
#[derive(Debug, Clone)]
pub struct RegisteredHandler {
    handler: Arc<dyn Any + Send + Sync>,
    handler_name: &'static str,
    request_type: TypeToken,
    result_type: TypeToken,
}

impl RegisteredHandler {
    /// Type name of the handler.
    pub fn handler_name(&self) -> &'static str {
        self.handler_name
    }

    /// Request type the handler is registered for.
    pub fn request_type(&self) -> TypeToken {
        self.request_type
    }

    /// Result type the handler was registered with.
    pub fn result_type(&self) -> TypeToken {
        self.result_type
    }

    /// The handler as a `CommandHandler<Req, Res>`.
    ///
    /// Returns `None` when the handler was registered for another request
    /// or result type.
    pub fn downcast<Req, Res>(&self) -> Option<Arc<dyn CommandHandler<Req, Res>>>
    where
        Req: Request,
        Res: Send + 'static,
    {
        self.handler
            .downcast_ref::<Arc<dyn CommandHandler<Req, Res>>>()
            .cloned()
    }
}

/// Removes a registration made by [`Registry::register`].
///
/// Removing is idempotent, and a handle only ever removes the registration
/// it was created for: once the request type has been re-registered, an old
/// handle no longer has any effect.
#[derive(Debug)]
#[must_use = "the handler stays registered until `remove` is called"]
pub struct Unregister {
    handlers: Weak<RwLock<Handlers>>,
    request: TypeToken,
    generation: u64,
}

impl Unregister {
    /// Request type of the registration.
    pub fn request_type(&self) -> TypeToken {
        self.request
    }

    /// Remove the registration.
    ///
    /// Returns true if the handler was removed by this call.
    pub fn remove(&self) -> bool {
        let Some(handlers) = self.handlers.upgrade() else {
            return false;
        };
        let mut handlers = handlers.write();
        let current = handlers
            .entries
            .get(&self.request)
            .is_some_and(|entry| entry.generation == self.generation);
        if !current {
            return false;
        }
        if let Some(entry) = handlers.entries.remove(&self.request) {
            debug!(request = %self.request, handler = entry.handler_name, "handler unregistered");
        }
        true
    }
}
