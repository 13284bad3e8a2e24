use std::time::Duration;

/// Placeholder for project fields without a value.
pub const NO_PROJECT_DATA: &str = "---";

/// Action input holding the GitHub token.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Environment variable naming the action output file.
pub const OUTPUT_PATH_ENV: &str = "GITHUB_OUTPUT";
/// Output file used when neither the environment nor the caller names one.
pub const DEFAULT_OUTPUT_PATH: &str = "default_output.txt";

pub const GITHUB_API_ENDPOINT: &str = "https://api.github.com";

/// Quota at or below which calls wait for the reset.
pub const RATE_LIMIT_LOW_WATER_MARK: u64 = 1;
/// Added to every wait so the reset has surely happened when we wake up.
pub const RATE_LIMIT_BUFFER: Duration = Duration::from_secs(5);
pub const RATE_LIMIT_MAX_ITERATIONS: u32 = 10;
/// Wait applied once after giving up on the reset.
pub const RATE_LIMIT_FALLBACK_WAIT: Duration = Duration::from_secs(60);
