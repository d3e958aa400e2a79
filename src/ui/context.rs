//! UI context for detecting interactive vs CI environments

use std::io::IsTerminal;

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether stderr is an interactive terminal
    interactive: bool,
    /// Whether marks and headers are styled
    color: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect(color: bool) -> Self {
        Self {
            interactive: Self::detect_interactive(),
            color,
        }
    }

    /// Create a non-interactive, uncolored context (for testing or explicit CI mode)
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            color: false,
        }
    }

    /// Check if output should be colored
    pub fn use_color(&self) -> bool {
        self.color
    }

    /// Check if we should draw a progress bar
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }

    /// Progress and preamble go to stderr, so that is the stream that matters
    fn detect_interactive() -> bool {
        if !std::io::stderr().is_terminal() {
            return false;
        }

        if std::env::var("CI").is_ok() {
            return false;
        }

        let ci_vars = [
            "GITHUB_ACTIONS",
            "GITLAB_CI",
            "CIRCLECI",
            "TRAVIS",
            "JENKINS_URL",
            "BUILDKITE",
            "TEAMCITY_VERSION",
            "TF_BUILD",
        ];

        !ci_vars.iter().any(|var| std::env::var(var).is_ok())
    }
}
