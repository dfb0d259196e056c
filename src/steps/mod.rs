//! Step phrases and what they do.
//!
//! Each phrase names logical elements of the current page; the page's locator
//! document turns those names into selectors and the [`Driver`] acts on them.

mod library;

use std::sync::Arc;

pub use library::{Step, StepLibrary};

use crate::config::HarnessConfig;
use crate::context::ScenarioContext;
use crate::driver::Driver;
use crate::error::{HarnessError, Result};
use crate::locators::{Category, LocatorRepository};
use crate::mail::MailRetriever;
use crate::selectors::Selector;

/// Everything a step needs that outlives a single scenario.
pub struct StepWorld {
    driver: Driver,
    locators: Arc<LocatorRepository>,
    config: HarnessConfig,
    mail: Option<MailRetriever>,
}

impl StepWorld {
    pub fn new(driver: Driver, locators: Arc<LocatorRepository>, config: HarnessConfig) -> Self {
        Self {
            driver,
            locators,
            config,
            mail: None,
        }
    }

    pub fn with_mail(mut self, mail: MailRetriever) -> Self {
        self.mail = Some(mail);
        self
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn selector(&self, ctx: &ScenarioContext, category: Category, name: &str) -> Result<Selector> {
        self.locators.resolve(ctx.page()?)?.selector(category, name)
    }

    fn mail(&self) -> Result<&MailRetriever> {
        self.mail.as_ref().ok_or(HarnessError::MailUnavailable)
    }

    pub async fn execute(&self, step: &Step, ctx: &mut ScenarioContext) -> Result<()> {
        tracing::info!("Step: {}", step);
        let driver = &self.driver;

        match step {
            Step::GoToPage(page) => {
                let doc = self.locators.resolve(page)?;
                ctx.set_page(page.as_str());
                driver.navigate(&self.config.page_url(doc.url()?)).await?;
            }
            Step::OnPage(page) => {
                self.locators.resolve(page)?;
                ctx.set_page(page.as_str());
            }
            Step::SwitchWindow(window) => {
                let index = if window == "new" { 1 } else { 0 };
                driver.switch_tab(index).await?;
            }
            Step::ClickButton(name) => {
                let button = self.selector(ctx, Category::Buttons, name)?;
                driver.should_see(&button).await?;
                if driver.capability().is_android() {
                    driver.trigger_event(&button, "click").await?;
                } else {
                    driver.click_all_matching(&button).await?;
                }
                driver.settle().await;
            }
            Step::ClickLink(name) => {
                let link = self.selector(ctx, Category::Hrefs, name)?;
                driver.should_see(&link).await?;
                driver.click_all_matching(&link).await?;
            }
            Step::ClickButtonIfPresent(name) => {
                let button = self.selector(ctx, Category::Buttons, name)?;
                driver.click_if_exists(&button).await?;
            }
            Step::SeeButton(name) => {
                let button = self.selector(ctx, Category::Buttons, name)?;
                driver.should_see(&button).await?;
            }
            Step::SeeText { name, text } => {
                let element = self.selector(ctx, Category::Special, name)?;
                driver.should_see_text(&element, text).await?;
            }
            Step::SeeFieldValue { name, value } => {
                let input = self.selector(ctx, Category::Inputs, name)?;
                driver.should_see_value(&input, value).await?;
            }
            Step::SeeTitle(title) => driver.should_have_title(title).await?,
            Step::Enter { value, name } => {
                let input = self.selector(ctx, Category::Inputs, name)?;
                driver.fill_text(&input, value).await?;
            }
            Step::DeleteText(name) => {
                let input = self.selector(ctx, Category::Inputs, name)?;
                driver.clear_text(&input).await?;
            }
            Step::PressEnter(name) => {
                let input = self.selector(ctx, Category::Inputs, name)?;
                driver.send_enter(&input).await?;
            }
            Step::Wait(seconds) => driver.wait_seconds(*seconds).await,
            Step::DeleteAllEmail => {
                self.mail()?.delete_all_mail().await?;
            }
            Step::ReadEmailFor(text) => {
                let body = self.mail()?.wait_and_read_first_email().await?;
                if !body.contains(text.as_str()) {
                    return Err(HarnessError::assertion("first email", text.as_str(), body));
                }
            }
        }
        Ok(())
    }
}
