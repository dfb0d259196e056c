use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::selectors::Selector;

/// The named sub-maps of a locator document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Url,
    Buttons,
    Inputs,
    Hrefs,
    Special,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Url,
        Category::Buttons,
        Category::Inputs,
        Category::Hrefs,
        Category::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Buttons => "buttons",
            Self::Inputs => "inputs",
            Self::Hrefs => "hrefs",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown locator category '{}'", s))
    }
}

/// Logical element names of one page, by category. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorDocument {
    #[serde(skip)]
    page: String,
    #[serde(default)]
    url: BTreeMap<String, String>,
    #[serde(default)]
    buttons: BTreeMap<String, String>,
    #[serde(default)]
    inputs: BTreeMap<String, String>,
    #[serde(default)]
    hrefs: BTreeMap<String, String>,
    #[serde(default)]
    special: BTreeMap<String, String>,
}

/// Key of the page address inside the `url` category.
pub const URL_KEY: &str = "URL";

impl LocatorDocument {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            ..Self::default()
        }
    }

    pub fn from_json(page: impl Into<String>, json: &str) -> serde_json::Result<Self> {
        let mut doc: Self = serde_json::from_str(json)?;
        doc.page = page.into();
        Ok(doc)
    }

    pub(crate) fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = page.into();
        self
    }

    /// Builder-style insert, mostly for tests and in-memory repositories.
    pub fn with(mut self, category: Category, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries_mut(category).insert(name.into(), value.into());
        self
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn entries(&self, category: Category) -> &BTreeMap<String, String> {
        match category {
            Category::Url => &self.url,
            Category::Buttons => &self.buttons,
            Category::Inputs => &self.inputs,
            Category::Hrefs => &self.hrefs,
            Category::Special => &self.special,
        }
    }

    fn entries_mut(&mut self, category: Category) -> &mut BTreeMap<String, String> {
        match category {
            Category::Url => &mut self.url,
            Category::Buttons => &mut self.buttons,
            Category::Inputs => &mut self.inputs,
            Category::Hrefs => &mut self.hrefs,
            Category::Special => &mut self.special,
        }
    }

    /// The raw configured string for `name`, exactly as written.
    pub fn get(&self, category: Category, name: &str) -> Result<&str> {
        self.entries(category)
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| HarnessError::MissingElement {
                page: self.page.clone(),
                category,
                name: name.to_string(),
            })
    }

    pub fn selector(&self, category: Category, name: &str) -> Result<Selector> {
        self.get(category, name).map(Selector::parse)
    }

    /// The page's own address (`url.URL`).
    pub fn url(&self) -> Result<&str> {
        self.get(Category::Url, URL_KEY)
    }
}
