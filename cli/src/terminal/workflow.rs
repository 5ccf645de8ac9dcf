//! Workflow commands understood by the CI runner.

/// Environment variable set to `true` by the GitHub Actions runner.
const ACTIONS_ENV: &str = "GITHUB_ACTIONS";

pub fn running_in_actions() -> bool {
    std::env::var(ACTIONS_ENV).is_ok_and(|v| v == "true")
}

/// Marks the step as failed with `message` when running under the runner.
pub fn set_failed(message: &str) {
    if running_in_actions() {
        println!("{}", error_command(message));
    }
}

fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_percent_before_newlines() {
        assert_eq!(escape_data("100%\r\ndone"), "100%25%0D%0Adone");
    }

    #[test]
    fn error_command_is_single_line() {
        let line: String = error_command("timed out\ncaused by: connection refused");
        assert_eq!(line, "::error::timed out%0Acaused by: connection refused");
        assert!(!line.contains('\n'));
    }
}
