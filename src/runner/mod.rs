//! Runs scenarios from `.feature` files one at a time against one session.

mod feature;
mod tags;

use serde::Serialize;

pub use feature::{load_features, FeaturePlan, ScenarioPlan, StepLine};
pub use tags::TagExpr;

use crate::context::ScenarioContext;
use crate::error::{HarnessError, Result};
use crate::steps::{StepLibrary, StepWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub feature: String,
    pub name: String,
    pub status: Status,
    pub steps: Vec<StepReport>,
    /// The first failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, report: ScenarioReport) {
        match report.status {
            Status::Failed => self.failed += 1,
            _ => self.passed += 1,
        }
        self.scenarios.push(report);
    }
}

/// Selects scenarios by tag expression. No expression, an empty one or `All`
/// selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    expr: Option<TagExpr>,
}

impl TagFilter {
    pub fn new(expression: Option<&str>) -> Result<Self> {
        let expression = expression
            .map(str::trim)
            .filter(|e| !e.is_empty() && !matches!(*e, "All" | "@All"));
        let expr = match expression {
            Some(e) => Some(TagExpr::parse(e).map_err(|reason| {
                HarnessError::InvalidTagExpression {
                    expression: e.to_string(),
                    reason,
                }
            })?),
            None => None,
        };
        Ok(Self { expr })
    }

    pub fn matches(&self, tags: &[String]) -> bool {
        self.expr.as_ref().map_or(true, |expr| expr.matches(tags))
    }

    /// Number of scenarios across `features` the filter selects.
    pub fn count(&self, features: &[FeaturePlan]) -> usize {
        features
            .iter()
            .flat_map(|f| &f.scenarios)
            .filter(|s| self.matches(&s.tags))
            .count()
    }
}

impl std::fmt::Display for TagFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.expr {
            Some(expr) => write!(f, "{}", expr),
            None => f.write_str("All"),
        }
    }
}

pub struct FeatureRunner {
    world: StepWorld,
    library: StepLibrary,
    filter: TagFilter,
}

impl FeatureRunner {
    pub fn new(world: StepWorld, library: StepLibrary, filter: TagFilter) -> Self {
        Self {
            world,
            library,
            filter,
        }
    }

    pub fn world(&self) -> &StepWorld {
        &self.world
    }

    /// Run every selected scenario in order.
    ///
    /// Each scenario after the first starts from a reloaded session with an
    /// empty page context. A failing step fails its scenario and the rest of
    /// its steps are skipped; other scenarios still run.
    pub async fn run(&self, features: &[FeaturePlan]) -> RunSummary {
        let mut summary = RunSummary::default();
        if self.filter.count(features) == 0 {
            tracing::warn!("No scenarios match tags {}", self.filter);
        }
        let selected = features.iter().flat_map(|feature| {
            feature
                .scenarios
                .iter()
                .filter(|scenario| self.filter.matches(&scenario.tags))
                .map(move |scenario| (feature, scenario))
        });

        for (index, (feature, scenario)) in selected.enumerate() {
            let reset = if index > 0 { self.reset().await } else { Ok(()) };
            let report = self.run_scenario(feature, scenario, reset).await;
            match report.status {
                Status::Failed => tracing::warn!(
                    "Scenario failed: {} ({})",
                    report.name,
                    report.error.as_deref().unwrap_or_default()
                ),
                _ => tracing::info!("Scenario passed: {}", report.name),
            }
            summary.record(report);
        }

        tracing::info!(
            "{} scenario(s): {} passed, {} failed",
            summary.scenarios.len(),
            summary.passed,
            summary.failed
        );
        summary
    }

    async fn reset(&self) -> Result<()> {
        let driver = self.world.driver();
        driver
            .session()
            .pause(driver.timing().scenario_reset_pause)
            .await;
        driver.reload().await
    }

    async fn run_scenario(
        &self,
        feature: &FeaturePlan,
        scenario: &ScenarioPlan,
        reset: Result<()>,
    ) -> ScenarioReport {
        tracing::info!("Scenario: {}", scenario.name);
        let mut ctx = ScenarioContext::new();
        let mut error = match reset {
            Ok(()) => None,
            Err(e) => Some(format!("session reset failed: {}", e)),
        };

        let mut steps = Vec::with_capacity(scenario.steps.len());
        for line in &scenario.steps {
            if error.is_some() {
                steps.push(StepReport {
                    step: line.to_string(),
                    status: Status::Skipped,
                    error: None,
                });
                continue;
            }

            let outcome = match self.library.parse(&line.text) {
                Ok(step) => self.world.execute(&step, &mut ctx).await,
                Err(e) => Err(e),
            };
            let (status, step_error) = match outcome {
                Ok(()) => (Status::Passed, None),
                Err(e) => {
                    let message = e.to_string();
                    error = Some(format!("{}: {}", line, message));
                    (Status::Failed, Some(message))
                }
            };
            steps.push(StepReport {
                step: line.to_string(),
                status,
                error: step_error,
            });
        }

        ScenarioReport {
            feature: feature.name.clone(),
            name: scenario.name.clone(),
            status: if error.is_some() {
                Status::Failed
            } else {
                Status::Passed
            },
            steps,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tag_filter_all_selects_everything() {
        for tag in [None, Some(""), Some("All"), Some("@All")] {
            let filter = TagFilter::new(tag).unwrap();
            assert!(filter.matches(&[]));
            assert!(filter.matches(&tags(&["smoke"])));
        }
    }

    #[test]
    fn test_tag_filter_requires_tag() {
        let filter = TagFilter::new(Some("@smoke")).unwrap();
        assert!(filter.matches(&tags(&["login", "smoke"])));
        assert!(!filter.matches(&tags(&["login"])));
        assert!(!filter.matches(&[]));
    }

    #[test]
    fn test_tag_filter_expression() {
        let filter = TagFilter::new(Some("@smoke or @regression")).unwrap();
        assert!(filter.matches(&tags(&["smoke"])));
        assert!(filter.matches(&tags(&["regression"])));
        assert!(!filter.matches(&tags(&["nightly"])));
    }

    #[test]
    fn test_tag_filter_rejects_malformed_expression() {
        let err = TagFilter::new(Some("@smoke or")).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidTagExpression { ref expression, .. } if expression == "@smoke or"));
    }

    #[test]
    fn test_tag_filter_counts_selected_scenarios() {
        let scenario = |name: &str, list: &[&str]| ScenarioPlan {
            name: name.into(),
            tags: tags(list),
            steps: vec![],
        };
        let features = vec![FeaturePlan {
            name: "F".into(),
            path: "f.feature".into(),
            scenarios: vec![scenario("a", &["smoke"]), scenario("b", &["regression"]), scenario("c", &[])],
        }];
        assert_eq!(TagFilter::new(Some("@smoke or @regression")).unwrap().count(&features), 2);
        assert_eq!(TagFilter::new(Some("not @smoke")).unwrap().count(&features), 2);
        assert_eq!(TagFilter::new(Some("@nightly")).unwrap().count(&features), 0);
        assert_eq!(TagFilter::new(None).unwrap().count(&features), 3);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        assert!(summary.success());
        summary.record(ScenarioReport {
            feature: "F".into(),
            name: "bad".into(),
            status: Status::Failed,
            steps: vec![],
            error: Some("boom".into()),
        });
        assert_eq!(summary.failed, 1);
        assert!(!summary.success());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["scenarios"][0]["status"], "failed");
        assert_eq!(json["scenarios"][0]["error"], "boom");
    }
}
