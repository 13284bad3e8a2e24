use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use tracing::{error, info, warn};

use living_doc_utilities::constants::{DEFAULT_OUTPUT_PATH, GITHUB_API_ENDPOINT};
use living_doc_utilities::github::GithubClient;
use living_doc_utilities::logging::{self, LoggingConfig};
use living_doc_utilities::{
    get_action_input, safe_call, set_action_output, ActionInputs, IssueKind, Issues,
    RateLimitProvider, RateLimiter,
};

/// Helpers for living-documentation GitHub Actions.
///
/// Inputs are read from INPUT_<NAME> variables, outputs are appended to the
/// file named by GITHUB_OUTPUT. A .env file in the working directory is
/// loaded first.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Input(InputArgs),
    Output(OutputArgs),
    Issues(IssuesArgs),
    RateLimit(RateLimitArgs),
}

/// Print the value of an action input.
#[derive(FromArgs)]
#[argh(subcommand, name = "input")]
struct InputArgs {
    /// input name, e.g. github-token
    #[argh(positional)]
    name: String,
}

/// Append name=value to the action output file.
#[derive(FromArgs)]
#[argh(subcommand, name = "output")]
struct OutputArgs {
    /// output name
    #[argh(positional)]
    name: String,
    /// output value
    #[argh(positional)]
    value: String,
    /// file used when GITHUB_OUTPUT is not set
    #[argh(option, default = "DEFAULT_OUTPUT_PATH.to_string()")]
    default_path: String,
}

/// Summarize an issues file written by a living-doc action.
#[derive(FromArgs)]
#[argh(subcommand, name = "issues")]
struct IssuesArgs {
    /// path of the issues JSON file
    #[argh(positional)]
    path: PathBuf,
    /// fail when the file holds invalid issues
    #[argh(switch)]
    strict: bool,
}

/// Show the remaining GitHub API quota.
#[derive(FromArgs)]
#[argh(subcommand, name = "rate-limit")]
struct RateLimitArgs {}

/// Inputs of the rate-limit command.
struct RateLimitInputs;

impl ActionInputs for RateLimitInputs {
    fn validate(&self) -> usize {
        if self.github_token().is_empty() {
            error!("GitHub token must be provided as the github-token input.");
            return 1;
        }
        0
    }

    fn print_effective_configuration_details(&self) {
        info!("GitHub API: {}", GITHUB_API_ENDPOINT);
    }
}

fn summarize_issues(args: &IssuesArgs) -> Result<()> {
    let issues = Issues::load_from_json(&args.path);

    let mut per_kind: BTreeMap<&str, usize> = BTreeMap::new();
    let mut invalid = 0;
    for (key, issue) in &issues {
        *per_kind.entry(issue.kind.tag()).or_default() += 1;
        if !issue.is_valid_issue() {
            warn!(key = %key, "Invalid issue: repository, title and number are required.");
            invalid += 1;
        }
        if issue.kind == IssueKind::Functionality {
            let features = issue.related_feature_ids();
            if !features.is_empty() {
                info!(key = %key, ?features, "Functionality linked to features.");
            }
        }
    }

    println!("{} issues in {}", issues.count(), args.path.display());
    for (kind, count) in &per_kind {
        println!("  {}: {}", kind, count);
    }
    if invalid > 0 {
        println!("  invalid: {}", invalid);
        if args.strict {
            bail!("{} invalid issues in {}", invalid, args.path.display());
        }
    }
    Ok(())
}

fn show_rate_limit() -> Result<()> {
    let inputs = RateLimitInputs;
    inputs.print_effective_configuration();
    if !inputs.validate_user_configuration() {
        bail!("Invalid configuration");
    }

    let client =
        GithubClient::new(&inputs.github_token()).context("Failed to create GitHub client")?;
    let limiter = RateLimiter::new(client);
    let limit = safe_call(&limiter, "rate_limit", || limiter.provider().rate_limit())
        .context("Unable to read the GitHub rate limit")?;

    println!("remaining: {}", limit.remaining);
    println!("reset: {}", limit.reset);
    set_action_output("rate-limit-remaining", &limit.remaining.to_string(), DEFAULT_OUTPUT_PATH);
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Input(input) => println!("{}", get_action_input(&input.name)),
        Command::Output(output) => {
            set_action_output(&output.name, &output.value, &output.default_path)
        }
        Command::Issues(issues) => summarize_issues(&issues)?,
        Command::RateLimit(_) => show_rate_limit()?,
    }
    Ok(())
}

fn main() {
    dotenv::dotenv().ok();
    let args: Args = argh::from_env();

    if let Err(err) = logging::init(LoggingConfig::from_env()) {
        eprintln!("Failed to initialize logging: {}", err);
    }

    if let Err(err) = run(args) {
        eprintln!("Error: {}", err);
        for cause in err.chain().skip(1) {
            eprintln!("Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
