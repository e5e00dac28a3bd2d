//! Runtime settings for the orchestration loop.

use std::env;
use std::time::Duration;

/// Default deadline around each tool dispatch, in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 10;

/// Default deadline around each model or summarizer call, in seconds.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;

/// Default number of tool rounds per user turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Default bound on the persisted digest, in words.
pub const DEFAULT_SUMMARY_MAX_WORDS: usize = 200;

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Deadline around each tool dispatch. `None` disables it.
    pub tool_timeout: Option<Duration>,
    /// Deadline around each model and summarizer call. `None` disables it.
    pub model_timeout: Option<Duration>,
    /// Tool-call rounds allowed per user turn before giving up.
    pub max_tool_rounds: usize,
    /// Word bound on the persisted digest.
    pub summary_max_words: usize,
    /// Use one process-wide ledger instead of one per session.
    pub shared_ledger: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            tool_timeout: Some(Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS)),
            model_timeout: Some(Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS)),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            summary_max_words: DEFAULT_SUMMARY_MAX_WORDS,
            shared_ledger: false,
        }
    }
}

impl OrchestratorSettings {
    /// Create from environment variables.
    ///
    /// Environment variables:
    /// - `SCHEDULER_TOOL_TIMEOUT_SECS` - Tool dispatch deadline (0 disables)
    /// - `SCHEDULER_MODEL_TIMEOUT_SECS` - Model/summarizer deadline (0 disables)
    /// - `SCHEDULER_MAX_TOOL_ROUNDS` - Tool rounds per user turn
    /// - `SCHEDULER_SUMMARY_MAX_WORDS` - Digest word bound
    /// - `SCHEDULER_SHARED_LEDGER` - `true` for a process-wide ledger
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            tool_timeout: env_secs("SCHEDULER_TOOL_TIMEOUT_SECS").unwrap_or(defaults.tool_timeout),
            model_timeout: env_secs("SCHEDULER_MODEL_TIMEOUT_SECS")
                .unwrap_or(defaults.model_timeout),
            max_tool_rounds: env_parse("SCHEDULER_MAX_TOOL_ROUNDS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_tool_rounds),
            summary_max_words: env_parse("SCHEDULER_SUMMARY_MAX_WORDS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.summary_max_words),
            shared_ledger: env::var("SCHEDULER_SHARED_LEDGER")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.shared_ledger),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_secs(key: &str) -> Option<Option<Duration>> {
    env_parse::<u64>(key).map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.tool_timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.model_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.max_tool_rounds, 5);
        assert_eq!(settings.summary_max_words, 200);
        assert!(!settings.shared_ledger);
    }

    #[test]
    fn test_from_env() {
        env::set_var("SCHEDULER_TOOL_TIMEOUT_SECS", "0");
        env::set_var("SCHEDULER_MAX_TOOL_ROUNDS", "3");
        env::set_var("SCHEDULER_SHARED_LEDGER", "true");
        env::set_var("SCHEDULER_SUMMARY_MAX_WORDS", "not a number");

        let settings = OrchestratorSettings::from_env();
        assert_eq!(settings.tool_timeout, None);
        assert_eq!(settings.max_tool_rounds, 3);
        assert!(settings.shared_ledger);
        assert_eq!(settings.summary_max_words, DEFAULT_SUMMARY_MAX_WORDS);

        env::remove_var("SCHEDULER_TOOL_TIMEOUT_SECS");
        env::remove_var("SCHEDULER_MAX_TOOL_ROUNDS");
        env::remove_var("SCHEDULER_SHARED_LEDGER");
        env::remove_var("SCHEDULER_SUMMARY_MAX_WORDS");
    }
}
