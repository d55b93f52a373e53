//! Shared pipeline types: stages, artifacts and the results each stage yields.
//!
//! Artifacts mirror the review service's JSON records. Every field the service
//! may omit is defaulted during deserialization so a sparse response never
//! becomes an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One of the four review stages, in pipeline order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Analyze,
    Fix,
    Test,
    Verify,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 4] = [Stage::Analyze, Stage::Fix, Stage::Test, Stage::Verify];

    /// Position of the stage in the pipeline (0-based).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Fix => "fix",
            Stage::Test => "test",
            Stage::Verify => "verify",
        }
    }

    /// Human-facing name used in the stage strip.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Analyze => "Analyze",
            Stage::Fix => "Fix",
            Stage::Test => "Generate Tests",
            Stage::Verify => "Verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analyze" => Ok(Stage::Analyze),
            "fix" => Ok(Stage::Fix),
            "test" | "tests" | "generate-tests" => Ok(Stage::Test),
            "verify" => Ok(Stage::Verify),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// Bug severity as reported by the service.
///
/// Unknown tags are kept verbatim: they are rendered but never counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Other(tag) => tag,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Other(String::new())
    }
}

impl From<String> for Severity {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Other(tag),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// A single finding produced by the Analyze stage.
///
/// Fields the client does not model (for example the service's `id`) are kept
/// in `extra` so the bug set can be echoed back to Fix. The echo is the
/// normalized bug, not the received bytes: a missing severity is sent as `""`,
/// a string line becomes a number and a non-positive line is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bug {
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "positive_line",
        skip_serializing_if = "Option::is_none"
    )]
    pub line: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fixed_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept numeric or numeric-string line numbers; anything else (or zero) is absent.
fn positive_line<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let line = value.and_then(|value| match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    Ok(line
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok()))
}

/// Per-severity tally of a bug set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    /// Count bugs into the four known buckets. Unknown severities are skipped.
    pub fn tally(bugs: &[Bug]) -> Self {
        let mut counts = SeverityCounts::default();
        for bug in bugs {
            match bug.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Other(_) => {}
            }
        }
        counts
    }
}

/// Category of a generated test case. The set is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestCategory {
    HappyPath,
    EdgeCase,
    ErrorCase,
    Security,
    Other(String),
}

impl TestCategory {
    pub fn as_str(&self) -> &str {
        match self {
            TestCategory::HappyPath => "happy_path",
            TestCategory::EdgeCase => "edge_case",
            TestCategory::ErrorCase => "error_case",
            TestCategory::Security => "security",
            TestCategory::Other(tag) => tag,
        }
    }

    /// Display label; unknown categories fall back to their raw tag.
    pub fn label(&self) -> &str {
        match self {
            TestCategory::HappyPath => "Happy Path",
            TestCategory::EdgeCase => "Edge Case",
            TestCategory::ErrorCase => "Error Case",
            TestCategory::Security => "Security",
            TestCategory::Other(tag) => tag,
        }
    }
}

impl Default for TestCategory {
    fn default() -> Self {
        TestCategory::Other(String::new())
    }
}

impl From<String> for TestCategory {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "happy_path" => TestCategory::HappyPath,
            "edge_case" => TestCategory::EdgeCase,
            "error_case" => TestCategory::ErrorCase,
            "security" => TestCategory::Security,
            _ => TestCategory::Other(tag),
        }
    }
}

impl From<TestCategory> for String {
    fn from(category: TestCategory) -> Self {
        match category {
            TestCategory::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// A generated test case description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: TestCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// Output of the Generate-Tests stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestSuite {
    pub cases: Vec<TestCase>,
    pub code: String,
}

/// An issue still present after verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingIssue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Output of the Verify stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_clean: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remaining_issues: Vec<RemainingIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl VerificationResult {
    /// Quality score rounded and clamped to 0–100.
    pub fn score(&self) -> Option<u8> {
        self.quality_score
            .filter(|score| score.is_finite())
            .map(|score| score.round().clamp(0.0, 100.0) as u8)
    }
}

/// Coarse quality rating derived from the verification score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityBand {
    Good,
    Fair,
    Poor,
}

impl QualityBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => QualityBand::Good,
            50.. => QualityBand::Fair,
            _ => QualityBand::Poor,
        }
    }
}

/// Parsed, successful result of one stage call.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    Analyzed(Vec<Bug>),
    Fixed(String),
    TestsGenerated(TestSuite),
    Verified(VerificationResult),
}

impl StageResult {
    /// The stage that produces this kind of result.
    pub fn stage(&self) -> Stage {
        match self {
            StageResult::Analyzed(_) => Stage::Analyze,
            StageResult::Fixed(_) => Stage::Fix,
            StageResult::TestsGenerated(_) => Stage::Test,
            StageResult::Verified(_) => Stage::Verify,
        }
    }
}
