//! GitHub Action input and output plumbing.

use std::fs::OpenOptions;
use std::io::Write;

use tracing::error;

use crate::constants::OUTPUT_PATH_ENV;

fn input_key(name: &str) -> String {
    format!("INPUT_{}", name.to_uppercase().replace('-', "_"))
}

/// Reads the action input `name` (`my-input` is looked up as
/// `INPUT_MY_INPUT`). Unset inputs read as an empty string.
pub fn get_action_input(name: &str) -> String {
    std::env::var(input_key(name)).unwrap_or_default()
}

/// Appends `name=value` to the action output file.
///
/// The file is taken from `GITHUB_OUTPUT`, falling back to
/// `default_output_path`. Outputs are best effort: a failed write is logged
/// and otherwise ignored.
pub fn set_action_output(name: &str, value: &str, default_output_path: &str) {
    let output_path =
        std::env::var(OUTPUT_PATH_ENV).unwrap_or_else(|_| default_output_path.to_string());

    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&output_path)
        .and_then(|mut file| writeln!(file, "{}={}", name, value));

    if let Err(err) = result {
        error!(
            path = %output_path,
            key = name,
            value,
            error = ?err,
            "Failed to write output to {}: {}",
            output_path,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_OUTPUT_PATH;
    use crate::test_support::LogCapture;

    #[test]
    fn input_with_hyphen() {
        let actual = temp_env::with_var("INPUT_TEST_INPUT", Some("test_value"), || {
            get_action_input("test-input")
        });
        assert_eq!(actual, "test_value");
    }

    #[test]
    fn input_without_hyphen() {
        let actual = temp_env::with_var("INPUT_ANOTHERINPUT", Some("another_test_value"), || {
            get_action_input("anotherinput")
        });
        assert_eq!(actual, "another_test_value");
    }

    #[test]
    fn missing_input_is_empty() {
        let actual = temp_env::with_var_unset("INPUT_NOT_SET", || get_action_input("not-set"));
        assert_eq!(actual, "");
    }

    #[test]
    fn output_appends_to_github_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let default = dir.path().join("default.txt");

        temp_env::with_var(OUTPUT_PATH_ENV, Some(&path), || {
            set_action_output("first", "1", default.to_str().unwrap());
            set_action_output("custom-output", "custom_value", default.to_str().unwrap());
        });

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "first=1\ncustom-output=custom_value\n");
        assert!(!default.exists());
    }

    #[test]
    fn output_falls_back_to_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join(DEFAULT_OUTPUT_PATH);

        temp_env::with_var_unset(OUTPUT_PATH_ENV, || {
            set_action_output("test-output", "test_value", default.to_str().unwrap());
        });

        let written = std::fs::read_to_string(&default).unwrap();
        assert_eq!(written, "test-output=test_value\n");
    }

    #[test]
    fn output_write_failure_is_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let path = dir.path().to_str().unwrap().to_string();

        let ((), logs) = LogCapture::run(|| {
            temp_env::with_var(OUTPUT_PATH_ENV, Some(&path), || {
                set_action_output("fail-output", "fail-value", "fail.txt");
            })
        });

        let errors = logs.lines("ERROR");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains(&format!("Failed to write output to {}: Is a directory", path)));
        assert!(errors[0].contains("key=\"fail-output\""));
        assert!(errors[0].contains("value=\"fail-value\""));
    }
}
