//! Mock command handlers for tests.
//!
//! A [`MockCommand`] is registered into a [`Registry`] in place of a real
//! handler. It can be told to fail its configuration check, to reject
//! requests, or to return a given result or error, and it records every
//! request it is asked to validate so that tests can assert on them.
//!
//! Mocks always offer both capabilities. Requests are recorded by the
//! validator, before any injected validation behaviour runs, so a rejected
//! request is still recorded.
//!
//! Registering a mock does not run its configuration check. A mock built
//! with a failing check is therefore registered normally and reports the
//! failure when a request is dispatched to it.
//!
//! # Example
//!
//! ```rust
//! use mediator::mock::MockCommand;
//! use mediator::{Context, Mediator, Registry};
//!
//! # async fn example() {
//! let registry = Registry::new();
//! let mock = MockCommand::<String, u64>::register_result(&registry, 42).unwrap();
//!
//! let mediator = Mediator::new(registry);
//! let result: u64 = mediator
//!     .execute(&Context::background(), "test".to_string())
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result, 42);
//! assert_eq!(mock.requests(), vec!["test".to_string()]);
//! mock.unregister();
//! # }
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::context::Context;
use crate::error::{BoxError, MediatorResult};
use crate::handler::{CommandHandler, ConfigurationChecker, Request, Validator};
use crate::registry::{Registry, Unregister};
use crate::token::TypeToken;

type CheckFn = Arc<dyn Fn(&Context) -> Result<(), BoxError> + Send + Sync>;
type ValidateFn<Req> = Arc<dyn Fn(&Context, &Req) -> Result<(), BoxError> + Send + Sync>;
type ExecuteFn<Req, Res> = Arc<dyn Fn(&Context, Req) -> Result<Res, BoxError> + Send + Sync>;

/// Returned by a mock that was dispatched to without execute behaviour.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mock handler for {request} has no execute behaviour")]
pub struct MockNotConfigured {
    /// Request type of the mock
    pub request: TypeToken,
}

struct MockHandler<Req, Res> {
    requests: Mutex<Vec<Req>>,
    check_configuration: Option<CheckFn>,
    validate: Option<ValidateFn<Req>>,
    execute: Option<ExecuteFn<Req, Res>>,
}

#[async_trait]
impl<Req, Res> CommandHandler<Req, Res> for MockHandler<Req, Res>
where
    Req: Request + Clone,
    Res: Send + 'static,
{
    async fn execute(&self, ctx: &Context, request: Req) -> Result<Res, BoxError> {
        match &self.execute {
            Some(execute) => execute(ctx, request),
            None => Err(Box::new(MockNotConfigured {
                request: TypeToken::of::<Req>(),
            }) as BoxError),
        }
    }

    fn configuration_checker(&self) -> Option<&dyn ConfigurationChecker> {
        Some(self)
    }

    fn validator(&self) -> Option<&dyn Validator<Req>> {
        Some(self)
    }
}

#[async_trait]
impl<Req, Res> ConfigurationChecker for MockHandler<Req, Res>
where
    Req: Request + Clone,
    Res: Send + 'static,
{
    async fn check_configuration(&self, ctx: &Context) -> Result<(), BoxError> {
        match &self.check_configuration {
            Some(check) => check(ctx),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<Req, Res> Validator<Req> for MockHandler<Req, Res>
where
    Req: Request + Clone,
    Res: Send + 'static,
{
    async fn validate(&self, ctx: &Context, request: &Req) -> Result<(), BoxError> {
        self.requests.lock().push(request.clone());
        match &self.validate {
            Some(validate) => validate(ctx, request),
            None => Ok(()),
        }
    }
}

/// A registered mock handler for requests of type `Req` returning `Res`.
pub struct MockCommand<Req, Res> {
    handler: Arc<MockHandler<Req, Res>>,
    unregister: Unregister,
}

impl<Req, Res> fmt::Debug for MockCommand<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCommand")
            .field("request", &std::any::type_name::<Req>())
            .field("result", &std::any::type_name::<Res>())
            .field("num_requests", &self.handler.requests.lock().len())
            .finish()
    }
}

impl<Req, Res> MockCommand<Req, Res>
where
    Req: Request + Clone,
    Res: Send + 'static,
{
    /// Start building a mock with custom behaviour.
    pub fn builder() -> MockCommandBuilder<Req, Res> {
        MockCommandBuilder::new()
    }

    /// Register a mock that succeeds with the default result.
    pub fn register(registry: &Registry) -> MediatorResult<Self>
    where
        Res: Default,
    {
        Self::builder()
            .execute(|_ctx, _request| Ok(Res::default()))
            .register(registry)
    }

    /// Register a mock that succeeds with the given result.
    pub fn register_result(registry: &Registry, result: Res) -> MediatorResult<Self>
    where
        Res: Clone + Sync,
    {
        Self::builder()
            .execute(move |_ctx, _request| Ok(result.clone()))
            .register(registry)
    }

    /// Register a mock whose execution fails with the given error.
    pub fn register_error<E>(registry: &Registry, err: E) -> MediatorResult<Self>
    where
        E: StdError + Clone + Send + Sync + 'static,
    {
        Self::builder()
            .execute(move |_ctx, _request| Err(Box::new(err.clone()) as BoxError))
            .register(registry)
    }

    /// Register a mock whose configuration check fails with the given error.
    pub fn register_configuration_error<E>(registry: &Registry, err: E) -> MediatorResult<Self>
    where
        E: StdError + Clone + Send + Sync + 'static,
    {
        Self::builder()
            .check_configuration(move |_ctx| Err(Box::new(err.clone()) as BoxError))
            .register(registry)
    }

    /// Register a mock whose validator rejects every request with the given error.
    pub fn register_validation_error<E>(registry: &Registry, err: E) -> MediatorResult<Self>
    where
        E: StdError + Clone + Send + Sync + 'static,
    {
        Self::builder()
            .validate(move |_ctx, _request| Err(Box::new(err.clone()) as BoxError))
            .register(registry)
    }

    /// Number of requests received.
    pub fn num_requests(&self) -> usize {
        self.handler.requests.lock().len()
    }

    /// Copy of the requests received, in order.
    pub fn requests(&self) -> Vec<Req> {
        self.handler.requests.lock().clone()
    }

    /// Returns true if at least one request was received.
    pub fn was_called(&self) -> bool {
        self.num_requests() > 0
    }

    /// Returns true if no request was received.
    pub fn was_not_called(&self) -> bool {
        self.num_requests() == 0
    }

    /// Remove the mock from the registry.
    pub fn unregister(&self) -> bool {
        self.unregister.remove()
    }
}

/// Builder for [`MockCommand`].
pub struct MockCommandBuilder<Req, Res> {
    check_configuration: Option<CheckFn>,
    validate: Option<ValidateFn<Req>>,
    execute: Option<ExecuteFn<Req, Res>>,
}

impl<Req, Res> MockCommandBuilder<Req, Res>
where
    Req: Request + Clone,
    Res: Send + 'static,
{
    /// Create a builder with no behaviour.
    pub fn new() -> Self {
        Self {
            check_configuration: None,
            validate: None,
            execute: None,
        }
    }

    /// Set the configuration check behaviour.
    pub fn check_configuration<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.check_configuration = Some(Arc::new(f));
        self
    }

    /// Set the validation behaviour.
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &Req) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    /// Set the execute behaviour.
    pub fn execute<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, Req) -> Result<Res, BoxError> + Send + Sync + 'static,
    {
        self.execute = Some(Arc::new(f));
        self
    }

    /// Register the mock.
    ///
    /// Fails only if a handler is already registered for `Req`.
    pub fn register(self, registry: &Registry) -> MediatorResult<MockCommand<Req, Res>> {
        let handler = Arc::new(MockHandler {
            requests: Mutex::new(Vec::new()),
            check_configuration: self.check_configuration,
            validate: self.validate,
            execute: self.execute,
        });
        let unregister = registry.insert::<Req, Res>(handler.clone())?;
        Ok(MockCommand {
            handler,
            unregister,
        })
    }
}

impl<Req, Res> Default for MockCommandBuilder<Req, Res>
where
    Req: Request + Clone,
    Res: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediatorError;
    use crate::handler::NoResult;
    use crate::mediator::Mediator;

    #[derive(Error, Debug, Clone, PartialEq)]
    #[error("{0}")]
    struct MockError(&'static str);

    #[tokio::test]
    async fn test_mock_command_records_requests() {
        let registry = Registry::new();
        let mock = MockCommand::<String, NoResult>::register(&registry).unwrap();
        assert_eq!(registry.len(), 1);
        let mediator = Mediator::new(registry.clone());

        let result: NoResult = mediator
            .execute(&Context::background(), "test".to_string())
            .await
            .unwrap();

        assert_eq!(result, NoResult);
        assert_eq!(mock.num_requests(), 1);
        assert_eq!(mock.requests(), vec!["test".to_string()]);
        assert!(mock.was_called());
        assert!(!mock.was_not_called());

        assert!(mock.unregister());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mock_command_not_called() {
        let registry = Registry::new();
        let mock = MockCommand::<i32, i32>::register(&registry).unwrap();

        assert!(!mock.was_called());
        assert!(mock.was_not_called());
    }

    #[tokio::test]
    async fn test_mock_command_error() {
        let registry = Registry::new();
        let _mock =
            MockCommand::<String, NoResult>::register_error(&registry, MockError("command error"))
                .unwrap();
        let mediator = Mediator::new(registry);

        let err = mediator
            .execute::<String, NoResult>(&Context::background(), "test".to_string())
            .await
            .unwrap_err();

        match err {
            MediatorError::Handler(inner) => {
                assert_eq!(
                    inner.downcast_ref::<MockError>(),
                    Some(&MockError("command error"))
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_validation_error_still_records_request() {
        let registry = Registry::new();
        let mock =
            MockCommand::<String, NoResult>::register_validation_error(&registry, MockError("invalid"))
                .unwrap();
        let mediator = Mediator::new(registry);

        let err = mediator
            .execute::<String, NoResult>(&Context::background(), "test".to_string())
            .await
            .unwrap_err();

        assert!(err.is_validation_error());
        assert_eq!(mock.requests(), vec!["test".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_configuration_error_reported_at_dispatch() {
        let registry = Registry::new();
        let mock = MockCommand::<String, NoResult>::register_configuration_error(
            &registry,
            MockError("not configured"),
        )
        .unwrap();
        let mediator = Mediator::new(registry);

        let err = mediator
            .execute::<String, NoResult>(&Context::background(), "test".to_string())
            .await
            .unwrap_err();

        assert!(err.is_configuration_error());
        assert!(mock.was_not_called());
    }

    #[tokio::test]
    async fn test_mock_without_execute_behaviour() {
        let registry = Registry::new();
        let _mock = MockCommand::<u8, u8>::builder().register(&registry).unwrap();
        let mediator = Mediator::new(registry);

        let err = mediator
            .execute::<u8, u8>(&Context::background(), 1)
            .await
            .unwrap_err();

        match err {
            MediatorError::Handler(inner) => {
                assert!(inner.downcast_ref::<MockNotConfigured>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mock_registration_is_unique() {
        let registry = Registry::new();
        let _first = MockCommand::<u8, u8>::register(&registry).unwrap();

        let err = MockCommand::<u8, u8>::register(&registry).unwrap_err();
        assert!(err.is_already_registered::<u8>());
    }
}
