use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gherkin::GherkinEnv;

/// One step line as written, keyword included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    pub keyword: String,
    pub text: String,
}

impl StepLine {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for StepLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.keyword.trim(), self.text)
    }
}

/// A scenario ready to run: background steps first, tags merged with the
/// feature's (and rule's) tags, `@` stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPlan {
    pub name: String,
    pub tags: Vec<String>,
    pub steps: Vec<StepLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePlan {
    pub name: String,
    pub path: PathBuf,
    pub scenarios: Vec<ScenarioPlan>,
}

/// Load a `.feature` file, or every `.feature` file directly inside a
/// directory in name order.
pub fn load_features(path: &Path) -> Result<Vec<FeaturePlan>> {
    if !path.is_dir() {
        return Ok(vec![load_feature(path)?]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)
        .with_context(|| format!("Failed to read feature directory {}", path.display()))?
    {
        let file = entry?.path();
        if file.extension().is_some_and(|ext| ext == "feature") {
            files.push(file);
        }
    }
    files.sort();

    files.iter().map(|file| load_feature(file)).collect()
}

fn load_feature(path: &Path) -> Result<FeaturePlan> {
    let feature = gherkin::Feature::parse_path(path, GherkinEnv::default())
        .with_context(|| format!("Failed to parse feature file {}", path.display()))?;

    let background: Vec<StepLine> = feature
        .background
        .as_ref()
        .map(|bg| bg.steps.iter().map(step_line).collect())
        .unwrap_or_default();
    let feature_tags = normalize_tags(&feature.tags);

    let mut scenarios: Vec<ScenarioPlan> = feature
        .scenarios
        .iter()
        .flat_map(|scenario| plan(scenario, &feature_tags, &background))
        .collect();

    for rule in &feature.rules {
        let mut rule_tags = feature_tags.clone();
        rule_tags.extend(normalize_tags(&rule.tags));
        let mut rule_background = background.clone();
        if let Some(bg) = &rule.background {
            rule_background.extend(bg.steps.iter().map(step_line));
        }
        scenarios.extend(
            rule.scenarios
                .iter()
                .flat_map(|scenario| plan(scenario, &rule_tags, &rule_background)),
        );
    }

    tracing::debug!(
        "Loaded {} scenario(s) from {}",
        scenarios.len(),
        path.display()
    );
    Ok(FeaturePlan {
        name: feature.name.clone(),
        path: path.to_path_buf(),
        scenarios,
    })
}

/// Plan one scenario, or one scenario per example row for an outline.
fn plan(scenario: &gherkin::Scenario, inherited: &[String], background: &[StepLine]) -> Vec<ScenarioPlan> {
    let mut tags = inherited.to_vec();
    tags.extend(normalize_tags(&scenario.tags));

    if scenario.examples.is_empty() {
        let mut steps = background.to_vec();
        steps.extend(scenario.steps.iter().map(step_line));
        return vec![ScenarioPlan {
            name: scenario.name.clone(),
            tags,
            steps,
        }];
    }

    let mut plans = Vec::new();
    for examples in &scenario.examples {
        let Some((header, rows)) = examples
            .table
            .as_ref()
            .and_then(|table| table.rows.split_first())
        else {
            continue;
        };
        let mut example_tags = tags.clone();
        example_tags.extend(normalize_tags(&examples.tags));

        for row in rows {
            let fill = |text: &str| substitute(text, header, row);
            let mut steps = background.to_vec();
            steps.extend(
                scenario
                    .steps
                    .iter()
                    .map(|step| StepLine::new(step.keyword.trim(), fill(step.value.trim()))),
            );
            plans.push(ScenarioPlan {
                name: fill(&scenario.name),
                tags: example_tags.clone(),
                steps,
            });
        }
    }
    plans
}

/// Replace every `<column>` placeholder with the row's value for that column.
fn substitute(text: &str, header: &[String], row: &[String]) -> String {
    header
        .iter()
        .zip(row)
        .fold(text.to_string(), |acc, (column, value)| {
            acc.replace(&format!("<{}>", column.trim()), value.trim())
        })
}

fn step_line(step: &gherkin::Step) -> StepLine {
    StepLine::new(step.keyword.trim(), step.value.trim())
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim_start_matches('@').to_string())
        .collect()
}
