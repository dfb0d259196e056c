use std::fmt;

use regex::{Captures, Regex};

use crate::error::{HarnessError, Result};

/// A step phrase with its arguments pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    GoToPage(String),
    OnPage(String),
    SwitchWindow(String),
    ClickButton(String),
    ClickLink(String),
    ClickButtonIfPresent(String),
    SeeButton(String),
    SeeText { name: String, text: String },
    SeeFieldValue { name: String, value: String },
    SeeTitle(String),
    Enter { value: String, name: String },
    DeleteText(String),
    PressEnter(String),
    Wait(u64),
    DeleteAllEmail,
    ReadEmailFor(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoToPage(page) => write!(f, "I go to the \"{page}\" page"),
            Self::OnPage(page) => write!(f, "I am on the \"{page}\" page"),
            Self::SwitchWindow(window) => write!(f, "I switch to the \"{window}\" window"),
            Self::ClickButton(name) => write!(f, "I click the \"{name}\" button on the page"),
            Self::ClickLink(name) => write!(f, "I click the \"{name}\" link on the page"),
            Self::ClickButtonIfPresent(name) => write!(f, "I click the \"{name}\" button if present"),
            Self::SeeButton(name) => write!(f, "I should see the \"{name}\" button on the page"),
            Self::SeeText { name, text } => write!(f, "I should see \"{name}\" with text \"{text}\""),
            Self::SeeFieldValue { name, value } => {
                write!(f, "I should see the \"{name}\" field with value \"{value}\"")
            }
            Self::SeeTitle(title) => write!(f, "I should see the page title \"{title}\""),
            Self::Enter { value, name } => write!(f, "I enter \"{value}\" into the \"{name}\""),
            Self::DeleteText(name) => write!(f, "I delete text from the \"{name}\""),
            Self::PressEnter(name) => write!(f, "I press enter in the \"{name}\""),
            Self::Wait(1) => f.write_str("I wait 1 second"),
            Self::Wait(n) => write!(f, "I wait {n} seconds"),
            Self::DeleteAllEmail => f.write_str("I delete all email"),
            Self::ReadEmailFor(text) => write!(f, "I read email for \"{text}\""),
        }
    }
}

type Build = fn(&Captures<'_>) -> Option<Step>;

const PHRASES: &[(&str, Build)] = &[
    (r#"^I go to the "(.*?)" page$"#, |c| Some(Step::GoToPage(arg(c, 1)))),
    (r#"^I am on the "(.*?)" page$"#, |c| Some(Step::OnPage(arg(c, 1)))),
    (r#"^I switch to the "(.*?)" window$"#, |c| Some(Step::SwitchWindow(arg(c, 1)))),
    (r#"^I click the "(.*?)" button on the page$"#, |c| Some(Step::ClickButton(arg(c, 1)))),
    (r#"^I click the "(.*?)" link on the page$"#, |c| Some(Step::ClickLink(arg(c, 1)))),
    (r#"^I click the "(.*?)" button if present$"#, |c| {
        Some(Step::ClickButtonIfPresent(arg(c, 1)))
    }),
    (r#"^I should see the "(.*?)" button on the page$"#, |c| Some(Step::SeeButton(arg(c, 1)))),
    (r#"^I should see the "(.*?)" field with value "(.*?)"$"#, |c| {
        Some(Step::SeeFieldValue {
            name: arg(c, 1),
            value: arg(c, 2),
        })
    }),
    (r#"^I should see the page title "(.*?)"$"#, |c| Some(Step::SeeTitle(arg(c, 1)))),
    (r#"^I should see "(.*?)" with text "(.*?)"$"#, |c| {
        Some(Step::SeeText {
            name: arg(c, 1),
            text: arg(c, 2),
        })
    }),
    (r#"^I enter "(.*?)" into the "(.*?)"$"#, |c| {
        Some(Step::Enter {
            value: arg(c, 1),
            name: arg(c, 2),
        })
    }),
    (r#"^I delete text from the "(.*?)"$"#, |c| Some(Step::DeleteText(arg(c, 1)))),
    (r#"^I press enter in the "(.*?)"$"#, |c| Some(Step::PressEnter(arg(c, 1)))),
    (r#"^I wait (\d+) seconds?$"#, |c| arg(c, 1).parse().ok().map(Step::Wait)),
    (r#"^I delete all email$"#, |_| Some(Step::DeleteAllEmail)),
    (r#"^I read email for "(.*?)"$"#, |c| Some(Step::ReadEmailFor(arg(c, 1)))),
];

fn arg(captures: &Captures<'_>, index: usize) -> String {
    captures
        .get(index)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// The ordered phrase table. The first pattern that matches wins.
pub struct StepLibrary {
    phrases: Vec<(Regex, Build)>,
}

impl StepLibrary {
    pub fn new() -> std::result::Result<Self, regex::Error> {
        let mut phrases = Vec::with_capacity(PHRASES.len());
        for (pattern, build) in PHRASES {
            phrases.push((Regex::new(pattern)?, *build));
        }
        Ok(Self { phrases })
    }

    /// Match step text, without its Given/When/Then keyword.
    pub fn parse(&self, text: &str) -> Result<Step> {
        let text = text.trim();
        self.phrases
            .iter()
            .find_map(|(regex, build)| regex.captures(text).and_then(|c| build(&c)))
            .ok_or_else(|| HarnessError::UndefinedStep(text.to_string()))
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
