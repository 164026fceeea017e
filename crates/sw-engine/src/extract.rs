//! Score extraction from solver stdout.

use std::sync::LazyLock;

use regex::Regex;
use sw_types::{SweepError, SweepResult};

use crate::invoker::RawOutput;

/// Marker the reference solver prints in front of its final objective.
pub const DEFAULT_SCORE_MARKER: &str = "Best Score = ";

/// Optionally signed decimal with an optional fraction and exponent.
const NUMBER_PATTERN: &str = r"([-+]?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)";

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    build_pattern(DEFAULT_SCORE_MARKER).expect("default score pattern is a valid regex")
});

fn build_pattern(marker: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}{}", regex::escape(marker), NUMBER_PATTERN))
}

/// Recovers a single score from a solver's output.
///
/// `None` means the output carried no recognizable score; it is an expected
/// result, not an error.
pub trait ScoreExtractor: Send + Sync {
    fn extract(&self, output: &RawOutput) -> Option<f64>;
}

/// Finds the first `<marker><number>` in stdout.
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    pattern: Regex,
}

impl MarkerExtractor {
    /// Build an extractor for a custom marker. The marker is matched
    /// literally.
    pub fn new(marker: &str) -> SweepResult<Self> {
        if marker.is_empty() {
            return Err(SweepError::Config("score marker must not be empty".to_string()));
        }
        let pattern = build_pattern(marker)
            .map_err(|e| SweepError::Config(format!("invalid score marker {marker:?}: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn extract_score(&self, text: &str) -> Option<f64> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl ScoreExtractor for MarkerExtractor {
    fn extract(&self, output: &RawOutput) -> Option<f64> {
        self.extract_score(&output.stdout)
    }
}
