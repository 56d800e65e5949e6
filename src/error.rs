//! Error types for the mediator.
//!
//! Registration and dispatch share one error type, [`MediatorError`]. The two
//! hook failures have their own types so that a handler can return an
//! already-classified error from its hooks (or from `execute`) without it
//! being wrapped a second time.

use std::any::Any;
use std::error::Error as StdError;

use thiserror::Error;

use crate::token::TypeToken;

/// Boxed error returned by handlers and their capabilities.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Root error type for mediator operations.
#[derive(Error, Debug)]
pub enum MediatorError {
    /// A handler is already registered for the request type
    #[error("{handler} already registered for requests of type: {request}")]
    AlreadyRegistered {
        /// Type name of the handler currently registered
        handler: &'static str,
        /// Request type the registration was attempted for
        request: TypeToken,
    },

    /// No handler is registered for the request type
    #[error("no handler registered for requests of type: {request_type}")]
    NoHandler {
        /// Request type that was dispatched
        request_type: TypeToken,
        /// The request value that could not be dispatched
        request: Box<dyn Any + Send + Sync>,
    },

    /// The registered handler produces a different result type
    #[error("{handler} does not return {expected}")]
    ResultTypeMismatch {
        /// Type name of the registered handler
        handler: &'static str,
        /// Request type that was dispatched
        request: TypeToken,
        /// Result type the caller asked for
        expected: TypeToken,
        /// Result type the handler was registered with
        actual: TypeToken,
    },

    /// The handler reported that it is misconfigured
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The handler rejected the request
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Error returned by the handler's `execute`, passed through as is
    #[error(transparent)]
    Handler(BoxError),
}

impl MediatorError {
    /// Surface an error returned by a handler's `execute`.
    ///
    /// Errors that already carry a mediator kind keep it; anything else is
    /// held in [`MediatorError::Handler`] untouched.
    pub(crate) fn from_handler(err: BoxError) -> Self {
        let err = match err.downcast::<MediatorError>() {
            Ok(err) => return *err,
            Err(err) => err,
        };
        let err = match err.downcast::<ConfigurationError>() {
            Ok(err) => return MediatorError::Configuration(*err),
            Err(err) => err,
        };
        match err.downcast::<ValidationError>() {
            Ok(err) => MediatorError::Validation(*err),
            Err(err) => MediatorError::Handler(err),
        }
    }

    /// Returns true for an `AlreadyRegistered` error for requests of type `Req`.
    pub fn is_already_registered<Req: ?Sized + 'static>(&self) -> bool {
        matches!(self, MediatorError::AlreadyRegistered { request, .. } if *request == TypeToken::of::<Req>())
    }

    /// Returns true for a `NoHandler` error for requests of type `Req`.
    pub fn is_no_handler<Req: ?Sized + 'static>(&self) -> bool {
        matches!(self, MediatorError::NoHandler { request_type, .. } if *request_type == TypeToken::of::<Req>())
    }

    /// Returns true for a `ResultTypeMismatch` where the caller expected `Res`.
    pub fn is_result_type_mismatch<Res: ?Sized + 'static>(&self) -> bool {
        matches!(self, MediatorError::ResultTypeMismatch { expected, .. } if *expected == TypeToken::of::<Res>())
    }

    /// Returns true for a configuration error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, MediatorError::Configuration(_))
    }

    /// Returns true for a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, MediatorError::Validation(_))
    }

    /// Returns true for an error produced by the handler's `execute`.
    pub fn is_handler_error(&self) -> bool {
        matches!(self, MediatorError::Handler(_))
    }

    /// The undispatched request carried by a `NoHandler` error.
    pub fn request<T: Any>(&self) -> Option<&T> {
        match self {
            MediatorError::NoHandler { request, .. } => request.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The request type involved in the error, where there is one.
    pub fn request_type(&self) -> Option<TypeToken> {
        match self {
            MediatorError::AlreadyRegistered { request, .. }
            | MediatorError::ResultTypeMismatch { request, .. } => Some(*request),
            MediatorError::NoHandler { request_type, .. } => Some(*request_type),
            _ => None,
        }
    }
}

/// A handler reported that it cannot run because it is misconfigured.
///
/// Raised at registration (the handler is not stored) or at dispatch (the
/// handler is not executed).
#[derive(Error, Debug)]
#[error("configuration error: {cause}")]
pub struct ConfigurationError {
    handler: Option<&'static str>,
    #[source]
    cause: BoxError,
}

impl ConfigurationError {
    /// Create a configuration error with the given cause.
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self {
            handler: None,
            cause: cause.into(),
        }
    }

    /// Type name of the handler that reported the error, once classified.
    pub fn handler(&self) -> Option<&'static str> {
        self.handler
    }

    /// The underlying error.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Classify an error returned by a configuration check.
    ///
    /// Errors that already are configuration errors are re-tagged with
    /// `handler`; anything else becomes the cause of a new one.
    pub fn classify(handler: &'static str, err: BoxError) -> Self {
        match already_kinded(err, |err| match err {
            MediatorError::Configuration(err) => Ok(err),
            other => Err(other),
        }) {
            Ok(err) => err.with_handler(handler),
            Err(cause) => Self {
                handler: Some(handler),
                cause,
            },
        }
    }

    fn with_handler(mut self, handler: &'static str) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// A handler rejected a request as invalid.
///
/// Returned instead of executing the handler. A handler validating in-line
/// in `execute` can return this type directly to the same effect.
#[derive(Error, Debug)]
#[error("request validation error: {cause}")]
pub struct ValidationError {
    handler: Option<&'static str>,
    #[source]
    cause: BoxError,
}

impl ValidationError {
    /// Create a validation error with the given cause.
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self {
            handler: None,
            cause: cause.into(),
        }
    }

    /// Type name of the handler that reported the error, once classified.
    pub fn handler(&self) -> Option<&'static str> {
        self.handler
    }

    /// The underlying error.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Classify an error returned by a validator.
    ///
    /// Errors that already are validation errors are re-tagged with
    /// `handler`; anything else becomes the cause of a new one.
    pub fn classify(handler: &'static str, err: BoxError) -> Self {
        match already_kinded(err, |err| match err {
            MediatorError::Validation(err) => Ok(err),
            other => Err(other),
        }) {
            Ok(err) => err.with_handler(handler),
            Err(cause) => Self {
                handler: Some(handler),
                cause,
            },
        }
    }

    fn with_handler(mut self, handler: &'static str) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// Extract `K` from `err`, either directly or from the matching
/// `MediatorError` variant. Returns the error unchanged otherwise.
fn already_kinded<K>(
    err: BoxError,
    from_mediator: fn(MediatorError) -> Result<K, MediatorError>,
) -> Result<K, BoxError>
where
    K: StdError + Send + Sync + 'static,
{
    let err = match err.downcast::<K>() {
        Ok(err) => return Ok(*err),
        Err(err) => err,
    };
    match err.downcast::<MediatorError>() {
        Ok(err) => from_mediator(*err).map_err(|other| Box::new(other) as BoxError),
        Err(err) => Err(err),
    }
}

/// Result type alias for mediator operations.
pub type MediatorResult<T> = Result<T, MediatorError>;
