//! Canned responses served by the stub, loaded from TOML.
//!
//! ```toml
//! delay_ms = 250
//!
//! [analyze]
//! body = '{"bugs": [{"severity": "low", "title": "spacing", "line": 1}], "total": 1}'
//!
//! [verify]
//! status = 503
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StubFixtures {
    /// Artificial latency added before every stage response.
    pub delay_ms: u64,
    pub analyze: EndpointFixture,
    pub fix: EndpointFixture,
    pub generate_tests: EndpointFixture,
    pub verify: EndpointFixture,
}

/// Response for one endpoint. Without a `body`, a built-in default is used.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointFixture {
    pub status: u16,
    /// Raw response body, sent verbatim (it does not have to be valid JSON).
    pub body: Option<String>,
}

impl Default for EndpointFixture {
    fn default() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }
}

/// Which stage endpoint a request hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Analyze,
    Fix,
    GenerateTests,
    Verify,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Analyze => "/api/analyze",
            Endpoint::Fix => "/api/fix",
            Endpoint::GenerateTests => "/api/generate-tests",
            Endpoint::Verify => "/api/verify",
        }
    }
}

impl StubFixtures {
    pub fn for_endpoint(&self, endpoint: Endpoint) -> &EndpointFixture {
        match endpoint {
            Endpoint::Analyze => &self.analyze,
            Endpoint::Fix => &self.fix,
            Endpoint::GenerateTests => &self.generate_tests,
            Endpoint::Verify => &self.verify,
        }
    }

    /// Builder-style override used by tests.
    pub fn with(mut self, endpoint: Endpoint, status: u16, body: impl Into<String>) -> Self {
        let fixture = EndpointFixture {
            status,
            body: Some(body.into()),
        };
        match endpoint {
            Endpoint::Analyze => self.analyze = fixture,
            Endpoint::Fix => self.fix = fixture,
            Endpoint::GenerateTests => self.generate_tests = fixture,
            Endpoint::Verify => self.verify = fixture,
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for endpoint in [
            Endpoint::Analyze,
            Endpoint::Fix,
            Endpoint::GenerateTests,
            Endpoint::Verify,
        ] {
            let status = self.for_endpoint(endpoint).status;
            if !(100..=999).contains(&status) {
                bail!("{}: invalid status {status}", endpoint.path());
            }
        }
        Ok(())
    }
}

/// Body served when a fixture does not set one. Fix echoes the submitted code.
pub fn default_body(endpoint: Endpoint, request: &Value) -> String {
    let code = request.get("code").and_then(Value::as_str).unwrap_or("");
    let body = match endpoint {
        Endpoint::Analyze => json!({"bugs": [], "total": 0}),
        Endpoint::Fix => json!({"fixed_code": code}),
        Endpoint::GenerateTests => json!({"test_cases": [], "test_code": ""}),
        Endpoint::Verify => json!({
            "is_clean": true,
            "summary": "No issues found.",
            "remaining_issues": [],
            "quality_score": 100,
        }),
    };
    body.to_string()
}

/// Load fixtures from a TOML file.
pub fn load_fixtures(path: &Path) -> Result<StubFixtures> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let fixtures: StubFixtures =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    fixtures
        .validate()
        .with_context(|| format!("invalid fixtures {}", path.display()))?;
    Ok(fixtures)
}
