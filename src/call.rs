//! Calling conventions for external API requests.
//!
//! Every GitHub request goes through [`safe_call`]: the rate limiter gates it,
//! the call runs once, and a failure is classified, logged and turned into
//! `None`.

use std::fmt::Debug;
use std::io;

use thiserror::Error;
use tracing::{debug, error};

use crate::github::rate_limiter::{Clock, RateLimitProvider, RateLimiter};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of an external API call.
#[derive(Debug, Error)]
pub enum ApiCallError {
    /// The remote host could not be reached.
    #[error("{0}")]
    Network(#[source] BoxError),
    /// The API answered with an error status and payload.
    #[error("{status} {data}")]
    Api {
        status: u16,
        data: serde_json::Value,
    },
    /// Request or transport failure other than connectivity.
    #[error("{0}")]
    Http(#[source] BoxError),
    #[error("{source}")]
    Unexpected {
        type_name: String,
        #[source]
        source: BoxError,
    },
}

impl ApiCallError {
    /// Wraps an error of any other kind, remembering its type for the log.
    pub fn unexpected<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unexpected {
            type_name: short_type_name::<E>().to_string(),
            source: Box::new(err),
        }
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

impl From<io::Error> for ApiCallError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut => Self::Network(Box::new(err)),
            _ => Self::unexpected(err),
        }
    }
}

impl From<hyper::Error> for ApiCallError {
    fn from(err: hyper::Error) -> Self {
        if err.is_connect() {
            Self::Network(Box::new(err))
        } else {
            Self::Http(Box::new(err))
        }
    }
}

impl From<hyper::http::Error> for ApiCallError {
    fn from(err: hyper::http::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

impl From<serde_json::Error> for ApiCallError {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected(err)
    }
}

impl From<anyhow::Error> for ApiCallError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ApiCallError>() {
            Ok(err) => return err,
            Err(err) => err,
        };
        let err = match err.downcast::<io::Error>() {
            Ok(err) => return err.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<hyper::Error>() {
            Ok(err) => return err.into(),
            Err(err) => err,
        };
        Self::Unexpected {
            type_name: "anyhow::Error".to_string(),
            source: err.into(),
        }
    }
}

/// Runs `f` through `limiter` and swallows its failure.
///
/// Returns `None` when `f` fails; the error is logged with `name` so the
/// failing request can be identified.
pub fn safe_call<P, C, T, E, F>(limiter: &RateLimiter<P, C>, name: &str, f: F) -> Option<T>
where
    P: RateLimitProvider,
    C: Clock,
    F: FnOnce() -> Result<T, E>,
    E: Into<ApiCallError>,
{
    match limiter.call(f) {
        Ok(value) => Some(value),
        Err(err) => {
            log_failure(name, &err.into());
            None
        }
    }
}

fn log_failure(name: &str, err: &ApiCallError) {
    match err {
        ApiCallError::Network(_) => {
            error!(function = name, error = ?err, "Network error calling {}: {}.", name, err)
        }
        ApiCallError::Api { status, .. } => error!(
            function = name,
            status,
            error = ?err,
            "GitHub API error calling {}: {}.",
            name,
            err
        ),
        ApiCallError::Http(_) => {
            error!(function = name, error = ?err, "HTTP error calling {}: {}.", name, err)
        }
        ApiCallError::Unexpected { type_name, .. } => error!(
            function = name,
            error = ?err,
            "Unexpected error of type {} occurred in {}: {}.",
            type_name,
            name,
            err
        ),
    }
}

/// Logs the call of `name` with its arguments and the value it returned.
pub fn debug_call<A, T, F>(name: &str, args: A, f: F) -> T
where
    A: Debug,
    T: Debug,
    F: FnOnce(A) -> T,
{
    debug!("Calling method {} with args: {:?}.", name, args);
    let result = f(args);
    debug!("Method {} returned {:?}.", name, result);
    result
}
