//! Shared building blocks for GitHub Actions that generate living
//! documentation from issues.
//!
//! * [`github::rate_limiter`] gates calls against the GitHub quota.
//! * [`call`] runs API calls through the limiter and turns failures into
//!   logged `None`s.
//! * [`github::action`] reads action inputs and writes action outputs.
//! * [`model`] holds the issue records exchanged between actions.

pub mod call;
pub mod constants;
pub mod github;
pub mod inputs;
pub mod logging;
pub mod model;

#[cfg(test)]
mod test_support;

pub use call::{debug_call, safe_call, ApiCallError};
pub use github::action::{get_action_input, set_action_output};
pub use github::rate_limiter::{Clock, RateLimit, RateLimitProvider, RateLimiter, SystemClock};
pub use inputs::ActionInputs;
pub use model::{Issue, IssueKind, Issues, ModelError, ProjectStatus};
