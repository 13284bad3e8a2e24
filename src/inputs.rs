//! Shared behavior of an action's input set.

use tracing::{error, info};

use crate::constants::GITHUB_TOKEN;
use crate::github::action::get_action_input;

/// Input set of one action.
///
/// Implementors provide the validation and the configuration summary for
/// their own inputs; the token handling and the reporting around them are
/// shared.
pub trait ActionInputs {
    /// Checks the action's own inputs, logging every problem, and returns
    /// how many were found.
    fn validate(&self) -> usize;

    /// Logs the action's own effective inputs.
    fn print_effective_configuration_details(&self);

    fn github_token(&self) -> String {
        get_action_input(GITHUB_TOKEN)
    }

    fn validate_user_configuration(&self) -> bool {
        info!("User configuration validation started.");
        let problems = self.validate();
        if problems != 0 {
            error!(problems, "User configuration validation failed.");
            return false;
        }
        info!("User configuration validation successfully completed.");
        true
    }

    fn print_effective_configuration(&self) {
        info!("Effective configuration:");
        info!("GitHub token: {}", mask(&self.github_token()));
        self.print_effective_configuration_details();
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "<not set>".to_string()
    } else {
        "*".repeat(secret.chars().count().min(8))
    }
}
