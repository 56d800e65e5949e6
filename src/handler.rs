//! Command handler trait and its optional capabilities.
//!
//! A [`CommandHandler`] executes requests of one type and produces results
//! of one type. It may additionally offer two capabilities that the mediator
//! runs before `execute`:
//!
//! - [`ConfigurationChecker`]: reports whether the handler can run at all.
//! - [`Validator`]: rejects individual requests.
//!
//! Capabilities are discovered by querying the handler through
//! [`CommandHandler::configuration_checker`] and [`CommandHandler::validator`].
//! Both default to `None`, so a handler that does not override them simply
//! does not offer the capability.

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;

/// Bound satisfied by every type usable as a request.
pub trait Request: Any + Send + Sync {}

impl<T: Any + Send + Sync> Request for T {}

/// Result type for commands that produce no result.
///
/// ```rust,ignore
/// registry.register::<Shutdown, NoResult, _>(&ctx, ShutdownHandler).await?;
/// let _ = mediator.execute::<_, NoResult>(&ctx, Shutdown).await?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoResult;

/// Handler for requests of type `Req` producing results of type `Res`.
///
/// # Example
///
/// ```rust
/// use mediator::{async_trait, BoxError, CommandHandler, Context, Validator};
///
/// struct Double;
///
/// #[async_trait]
/// impl CommandHandler<i64, i64> for Double {
///     async fn execute(&self, _ctx: &Context, request: i64) -> Result<i64, BoxError> {
///         Ok(request * 2)
///     }
///
///     fn validator(&self) -> Option<&dyn Validator<i64>> {
///         Some(self)
///     }
/// }
///
/// #[async_trait]
/// impl Validator<i64> for Double {
///     async fn validate(&self, _ctx: &Context, request: &i64) -> Result<(), BoxError> {
///         if request.checked_mul(2).is_none() {
///             return Err("request overflows".into());
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler<Req: Request, Res: Send + 'static>: Send + Sync + 'static {
    /// Execute the request.
    async fn execute(&self, ctx: &Context, request: Req) -> Result<Res, BoxError>;

    /// The configuration check offered by this handler, if any.
    fn configuration_checker(&self) -> Option<&dyn ConfigurationChecker> {
        None
    }

    /// The request validator offered by this handler, if any.
    fn validator(&self) -> Option<&dyn Validator<Req>> {
        None
    }

    /// Name used for this handler in errors and logs.
    fn handler_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Capability: check that a handler is able to run.
///
/// Consulted when the handler is registered and again before every
/// dispatch. Returning a [`ConfigurationError`](crate::ConfigurationError)
/// is allowed; it is not wrapped a second time.
#[async_trait]
pub trait ConfigurationChecker: Send + Sync {
    /// Check the handler's configuration.
    async fn check_configuration(&self, ctx: &Context) -> Result<(), BoxError>;
}

/// Capability: validate a request before the handler executes it.
///
/// Any error is surfaced as a [`ValidationError`](crate::ValidationError);
/// returning one directly is allowed and it is not wrapped a second time.
#[async_trait]
pub trait Validator<Req: Request>: Send + Sync {
    /// Validate the request.
    async fn validate(&self, ctx: &Context, request: &Req) -> Result<(), BoxError>;
}

/// Handler built from an async function. See [`handler_fn`].
pub struct FnHandler<F, Req, Res> {
    f: F,
    _phantom: PhantomData<fn(Req) -> Res>,
}

impl<F, Req, Res> fmt::Debug for FnHandler<F, Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("request", &type_name::<Req>())
            .field("result", &type_name::<Res>())
            .finish()
    }
}

/// Build a handler from an async function taking the context and the request.
///
/// # Example
///
/// ```rust
/// use mediator::{handler_fn, BoxError, Context};
///
/// let greet = handler_fn(|_ctx: Context, name: String| async move {
///     Ok::<_, BoxError>(format!("hello, {name}"))
/// });
/// ```
pub fn handler_fn<F, Fut, Req, Res>(f: F) -> FnHandler<F, Req, Res>
where
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, BoxError>> + Send + 'static,
    Req: Request,
    Res: Send + 'static,
{
    FnHandler {
        f,
        _phantom: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, Req, Res> CommandHandler<Req, Res> for FnHandler<F, Req, Res>
where
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, BoxError>> + Send + 'static,
    Req: Request,
    Res: Send + 'static,
{
    async fn execute(&self, ctx: &Context, request: Req) -> Result<Res, BoxError> {
        (self.f)(ctx.clone(), request).await
    }

    fn handler_name(&self) -> &'static str {
        type_name::<F>()
    }
}
