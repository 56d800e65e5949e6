//! Dispatch of requests to registered handlers.

use crate::context::Context;
use crate::error::{ConfigurationError, MediatorError, MediatorResult, ValidationError};
use crate::handler::Request;
use crate::registry::Registry;
use crate::token::TypeToken;

/// Sends requests to the handlers held by a [`Registry`].
///
/// Dispatch runs in a fixed order: look up the handler for the request
/// type, check that it produces the expected result type, run its
/// configuration check, run its validator, then execute it. A failing step
/// ends the dispatch; later steps are not run.
///
/// # Example
///
/// ```rust
/// use mediator::{handler_fn, BoxError, Context, Mediator, Registry};
///
/// # async fn example() -> Result<(), mediator::MediatorError> {
/// let registry = Registry::new();
/// let ctx = Context::background();
/// let _unregister = registry
///     .register(&ctx, handler_fn(|_ctx: Context, name: String| async move {
///         Ok::<_, BoxError>(name.len())
///     }))
///     .await?;
///
/// let mediator = Mediator::new(registry);
/// let len: usize = mediator.execute(&ctx, "mediator".to_string()).await?;
/// assert_eq!(len, 8);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mediator {
    registry: Registry,
}

impl Mediator {
    /// Create a mediator dispatching to the given registry.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry this mediator dispatches to.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute a request, expecting a result of type `Res`.
    ///
    /// Errors:
    /// - [`MediatorError::NoHandler`] if no handler is registered for `Req`
    /// - [`MediatorError::ResultTypeMismatch`] if the handler does not return `Res`
    /// - [`MediatorError::Configuration`] if the handler's configuration check fails
    /// - [`MediatorError::Validation`] if the handler's validator rejects the request
    /// - whatever the handler itself returns
    pub async fn execute<Req, Res>(&self, ctx: &Context, request: Req) -> MediatorResult<Res>
    where
        Req: Request,
        Res: Send + 'static,
    {
        let request_type = TypeToken::of::<Req>();

        let Some(registered) = self.registry.lookup(&request_type) else {
            return Err(MediatorError::NoHandler {
                request_type,
                request: Box::new(request),
            });
        };

        let Some(handler) = registered.downcast::<Req, Res>() else {
            return Err(MediatorError::ResultTypeMismatch {
                handler: registered.handler_name(),
                request: request_type,
                expected: TypeToken::of::<Res>(),
                actual: registered.result_type(),
            });
        };

        if let Some(checker) = handler.configuration_checker() {
            checker
                .check_configuration(ctx)
                .await
                .map_err(|err| ConfigurationError::classify(handler.handler_name(), err))?;
        }

        if let Some(validator) = handler.validator() {
            validator
                .validate(ctx, &request)
                .await
                .map_err(|err| ValidationError::classify(handler.handler_name(), err))?;
        }

        handler
            .execute(ctx, request)
            .await
            .map_err(MediatorError::from_handler)
    }

    /// Execute a request, always yielding a result value.
    ///
    /// On any error the result is `Res::default()` and the error is returned
    /// alongside it.
    pub async fn execute_or_default<Req, Res>(
        &self,
        ctx: &Context,
        request: Req,
    ) -> (Res, Option<MediatorError>)
    where
        Req: Request,
        Res: Default + Send + 'static,
    {
        match self.execute(ctx, request).await {
            Ok(result) => (result, None),
            Err(err) => (Res::default(), Some(err)),
        }
    }
}

impl From<Registry> for Mediator {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handler::{CommandHandler, ConfigurationChecker, NoResult, Validator};
    use async_trait::async_trait;
    use std::error::Error as _;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    #[error("request is empty")]
    struct EmptyRequest;

    #[derive(Error, Debug, Clone, PartialEq)]
    #[error("store offline")]
    struct StoreOffline;

    /// Handler with both capabilities and switchable behaviour.
    #[derive(Default)]
    struct Probe {
        broken: AtomicBool,
        checks: AtomicUsize,
        validations: AtomicUsize,
        executions: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler<String, usize> for Probe {
        async fn execute(&self, _ctx: &Context, request: String) -> Result<usize, BoxError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(request.len())
        }

        fn configuration_checker(&self) -> Option<&dyn ConfigurationChecker> {
            Some(self)
        }

        fn validator(&self) -> Option<&dyn Validator<String>> {
            Some(self)
        }
    }

    #[async_trait]
    impl ConfigurationChecker for Probe {
        async fn check_configuration(&self, _ctx: &Context) -> Result<(), BoxError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            if self.broken.load(Ordering::SeqCst) {
                return Err(Box::new(StoreOffline));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Validator<String> for Probe {
        async fn validate(&self, _ctx: &Context, request: &String) -> Result<(), BoxError> {
            self.validations.fetch_add(1, Ordering::SeqCst);
            if request.is_empty() {
                return Err(Box::new(EmptyRequest));
            }
            Ok(())
        }
    }

    struct Answer;

    #[async_trait]
    impl CommandHandler<String, i32> for Answer {
        async fn execute(&self, _ctx: &Context, _request: String) -> Result<i32, BoxError> {
            Ok(42)
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler<u8, NoResult> for Failing {
        async fn execute(&self, _ctx: &Context, _request: u8) -> Result<NoResult, BoxError> {
            Err(Box::new(StoreOffline))
        }
    }

    async fn setup(probe: Arc<Probe>) -> Mediator {
        let registry = Registry::new();
        let _ = registry
            .register_shared::<String, usize>(&Context::background(), probe)
            .await
            .unwrap();
        Mediator::new(registry)
    }

    #[tokio::test]
    async fn test_execute_happy_path() {
        let probe = Arc::new(Probe::default());
        let mediator = setup(probe.clone()).await;

        let len: usize = mediator
            .execute(&Context::background(), "test".to_string())
            .await
            .unwrap();

        assert_eq!(len, 4);
        // once at registration, once at dispatch
        assert_eq!(probe.checks.load(Ordering::SeqCst), 2);
        assert_eq!(probe.validations.load(Ordering::SeqCst), 1);
        assert_eq!(probe.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_without_handler() {
        let mediator = Mediator::default();

        let err = mediator
            .execute::<String, i32>(&Context::background(), "test".to_string())
            .await
            .unwrap_err();

        assert!(err.is_no_handler::<String>());
        assert_eq!(err.request::<String>().map(String::as_str), Some("test"));
    }

    #[tokio::test]
    async fn test_execute_result_type_mismatch() {
        let probe = Arc::new(Probe::default());
        let mediator = setup(probe.clone()).await;

        let (result, err) = mediator
            .execute_or_default::<String, i32>(&Context::background(), "test".to_string())
            .await;

        assert_eq!(result, 0);
        let err = err.unwrap();
        assert!(err.is_result_type_mismatch::<i32>());
        match err {
            MediatorError::ResultTypeMismatch { actual, .. } => assert!(actual.is::<usize>()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(probe.checks.load(Ordering::SeqCst), 1);
        assert_eq!(probe.validations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_error_short_circuits_execute() {
        let probe = Arc::new(Probe::default());
        let mediator = setup(probe.clone()).await;

        let err = mediator
            .execute::<String, usize>(&Context::background(), String::new())
            .await
            .unwrap_err();

        assert!(err.is_validation_error());
        let cause = err.source().unwrap();
        assert_eq!(cause.downcast_ref::<EmptyRequest>(), Some(&EmptyRequest));
        assert_eq!(probe.validations.load(Ordering::SeqCst), 1);
        assert_eq!(probe.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_configuration_error_short_circuits_validation() {
        let probe = Arc::new(Probe::default());
        let mediator = setup(probe.clone()).await;
        probe.broken.store(true, Ordering::SeqCst);

        let err = mediator
            .execute::<String, usize>(&Context::background(), "test".to_string())
            .await
            .unwrap_err();

        match &err {
            MediatorError::Configuration(inner) => {
                assert!(inner.handler().unwrap().ends_with("Probe"));
                assert!(inner.cause().downcast_ref::<StoreOffline>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(probe.validations.load(Ordering::SeqCst), 0);
        assert_eq!(probe.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let registry = Registry::new();
        let ctx = Context::background();
        let _unregister = registry.register(&ctx, Failing).await.unwrap();
        let mediator = Mediator::from(registry);

        let err = mediator.execute::<u8, NoResult>(&ctx, 7).await.unwrap_err();

        match err {
            MediatorError::Handler(inner) => {
                assert_eq!(inner.downcast_ref::<StoreOffline>(), Some(&StoreOffline));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_execute_unregister_execute() {
        let registry = Registry::new();
        let ctx = Context::background();
        let unregister = registry.register(&ctx, Answer).await.unwrap();
        let mediator = Mediator::new(registry);

        let result: i32 = mediator.execute(&ctx, "test".to_string()).await.unwrap();
        assert_eq!(result, 42);

        assert!(unregister.remove());

        let (result, err) = mediator
            .execute_or_default::<String, i32>(&ctx, "test".to_string())
            .await;
        assert_eq!(result, 0);
        let err = err.unwrap();
        assert!(err.is_no_handler::<String>());
        assert_eq!(err.request::<String>().map(String::as_str), Some("test"));
    }
}
