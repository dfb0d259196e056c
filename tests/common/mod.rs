// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use stepdriver::config::{Capability, Timing};
use stepdriver::driver::Driver;
use stepdriver::mail::{MailError, MailResult, Mailbox};
use stepdriver::selectors::Selector;
use stepdriver::session::{ElementRef, RemoteSession, SessionError, SessionResult};

/// One scripted element. Times are offsets from the session's creation.
#[derive(Debug, Clone)]
pub struct MockElement {
    pub text: String,
    pub value: Option<String>,
    pub appears_at: Duration,
    /// `None` means never visible.
    pub visible_at: Option<Duration>,
    pub removed_at: Option<Duration>,
    pub enabled: bool,
    pub click_failures: VecDeque<SessionError>,
    /// Reading the text fails with this error.
    pub text_error: Option<SessionError>,
}

impl MockElement {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            value: None,
            appears_at: Duration::ZERO,
            visible_at: Some(Duration::ZERO),
            removed_at: None,
            enabled: true,
            click_failures: VecDeque::new(),
            text_error: None,
        }
    }

    pub fn appearing_at(mut self, ms: u64) -> Self {
        self.appears_at = Duration::from_millis(ms);
        self
    }

    pub fn visible_at(mut self, ms: u64) -> Self {
        self.visible_at = Some(Duration::from_millis(ms));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible_at = None;
        self
    }

    pub fn removed_at(mut self, ms: u64) -> Self {
        self.removed_at = Some(Duration::from_millis(ms));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn unreadable(mut self, error: SessionError) -> Self {
        self.text_error = Some(error);
        self
    }

    pub fn failing_clicks(mut self, failures: impl IntoIterator<Item = SessionError>) -> Self {
        self.click_failures = failures.into_iter().collect();
        self
    }

    fn present(&self, t: Duration) -> bool {
        t >= self.appears_at && self.removed_at.map_or(true, |removed| t < removed)
    }

    fn visible(&self, t: Duration) -> bool {
        self.visible_at.is_some_and(|at| t >= at)
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub elements: HashMap<String, Vec<MockElement>>,
    pub title: String,
    pub tabs: Vec<String>,
    pub active_tab: String,
    pub navigations: Vec<String>,
    pub maximized: usize,
    pub reloads: usize,
    /// Every click attempt, successful or not, as `selector[index]`.
    pub click_attempts: Vec<String>,
    pub clicks: Vec<String>,
    pub keys: Vec<String>,
    pub scripts: Vec<String>,
    pub script_result: serde_json::Value,
    pub existence_checks: usize,
    pub pauses: Vec<Duration>,
    pub dialog_open: bool,
    /// `true` for each accepted dialog, `false` for each dismissed one.
    pub dialogs: Vec<bool>,
    pub opened_urls: Vec<String>,
    pub pointer_moves: Vec<(String, f64, f64)>,
}

/// A scripted in-memory page.
pub struct MockSession {
    start: Instant,
    state: Mutex<MockState>,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            state: Mutex::new(MockState {
                tabs: vec!["tab-0".to_string()],
                active_tab: "tab-0".to_string(),
                ..MockState::default()
            }),
        })
    }

    /// Add elements matched by `selector`, in document order.
    pub fn add(&self, selector: &str, elements: impl IntoIterator<Item = MockElement>) {
        let key = Selector::parse(selector).to_string();
        self.state()
            .elements
            .entry(key)
            .or_default()
            .extend(elements);
    }

    pub fn set_title(&self, title: &str) {
        self.state().title = title.to_string();
    }

    pub fn add_tab(&self, id: &str) {
        self.state().tabs.push(id.to_string());
    }

    pub fn raise_dialog(&self) {
        self.state().dialog_open = true;
    }

    pub fn set_script_result(&self, value: serde_json::Value) {
        self.state().script_result = value;
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        let key = Selector::parse(selector).to_string();
        self.state()
            .elements
            .get(&key)
            .and_then(|els| els.first())
            .and_then(|el| el.value.clone())
    }

    fn now(&self) -> Duration {
        Instant::now() - self.start
    }

    /// Indices into the scripted list of the elements present right now.
    fn present(&self, state: &MockState, selector: &Selector) -> Vec<usize> {
        let t = self.now();
        state
            .elements
            .get(&selector.to_string())
            .map(|els| {
                els.iter()
                    .enumerate()
                    .filter(|(_, el)| el.present(t))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn with_element<T>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(&mut MockElement, Duration) -> SessionResult<T>,
    ) -> SessionResult<T> {
        let t = self.now();
        let mut state = self.state();
        let present = self.present(&state, &element.selector);
        let Some(&slot) = present.get(element.index) else {
            return Err(if present.is_empty() {
                SessionError::NoSuchElement(element.selector.to_string())
            } else {
                SessionError::Stale(element.to_string())
            });
        };
        let els = state
            .elements
            .get_mut(&element.selector.to_string())
            .unwrap();
        f(&mut els[slot], t)
    }
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn navigate(&self, url: &str) -> SessionResult<()> {
        self.state().navigations.push(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> SessionResult<()> {
        self.state().reloads += 1;
        Ok(())
    }

    async fn maximize(&self) -> SessionResult<()> {
        self.state().maximized += 1;
        Ok(())
    }

    async fn title(&self) -> SessionResult<String> {
        Ok(self.state().title.clone())
    }

    async fn find_all(&self, selector: &Selector) -> SessionResult<Vec<ElementRef>> {
        let state = self.state();
        let count = self.present(&state, selector).len();
        Ok((0..count)
            .map(|i| ElementRef::new(selector.clone(), i))
            .collect())
    }

    async fn exists(&self, selector: &Selector) -> SessionResult<bool> {
        let mut state = self.state();
        state.existence_checks += 1;
        Ok(!self.present(&state, selector).is_empty())
    }

    async fn is_visible(&self, selector: &Selector) -> SessionResult<bool> {
        match self.with_element(&ElementRef::first(selector), |el, t| Ok(el.visible(t))) {
            Err(SessionError::NoSuchElement(_)) => Ok(false),
            other => other,
        }
    }

    async fn is_enabled(&self, selector: &Selector) -> SessionResult<bool> {
        match self.with_element(&ElementRef::first(selector), |el, _| Ok(el.enabled)) {
            Err(SessionError::NoSuchElement(_)) => Ok(false),
            other => other,
        }
    }

    async fn element_visible(&self, element: &ElementRef) -> SessionResult<bool> {
        self.with_element(element, |el, t| Ok(el.visible(t)))
    }

    async fn element_text(&self, element: &ElementRef) -> SessionResult<String> {
        self.with_element(element, |el, _| match &el.text_error {
            Some(err) => Err(err.clone()),
            None => Ok(el.text.clone()),
        })
    }

    async fn click(&self, element: &ElementRef) -> SessionResult<()> {
        self.state().click_attempts.push(element.to_string());
        self.with_element(element, |el, t| {
            if let Some(err) = el.click_failures.pop_front() {
                return Err(err);
            }
            if !el.visible(t) {
                return Err(SessionError::NotInteractable(element.to_string()));
            }
            Ok(())
        })?;
        self.state().clicks.push(element.to_string());
        Ok(())
    }

    async fn set_value(&self, selector: &Selector, text: &str) -> SessionResult<()> {
        self.with_element(&ElementRef::first(selector), |el, _| {
            if !el.enabled {
                return Err(SessionError::NotInteractable(selector.to_string()));
            }
            el.value = Some(text.to_string());
            Ok(())
        })
    }

    async fn clear(&self, selector: &Selector) -> SessionResult<()> {
        self.set_value(selector, "").await
    }

    async fn get_text(&self, selector: &Selector) -> SessionResult<String> {
        self.with_element(&ElementRef::first(selector), |el, _| Ok(el.text.clone()))
    }

    async fn get_attribute(
        &self,
        selector: &Selector,
        name: &str,
    ) -> SessionResult<Option<String>> {
        self.with_element(&ElementRef::first(selector), |el, _| {
            Ok(if name == "value" { el.value.clone() } else { None })
        })
    }

    async fn send_keys(&self, key: &str) -> SessionResult<()> {
        self.state().keys.push(key.to_string());
        Ok(())
    }

    async fn tab_ids(&self) -> SessionResult<Vec<String>> {
        Ok(self.state().tabs.clone())
    }

    async fn switch_tab(&self, id: &str) -> SessionResult<()> {
        let mut state = self.state();
        if !state.tabs.iter().any(|t| t == id) {
            return Err(SessionError::NoSuchTab(id.to_string()));
        }
        state.active_tab = id.to_string();
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> SessionResult<serde_json::Value> {
        let mut state = self.state();
        state.scripts.push(script.to_string());
        Ok(state.script_result.clone())
    }

    async fn handle_dialog(&self, accept: bool) -> SessionResult<()> {
        let mut state = self.state();
        if !state.dialog_open {
            return Err(SessionError::protocol("No dialog is showing"));
        }
        state.dialog_open = false;
        state.dialogs.push(accept);
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> SessionResult<String> {
        let mut state = self.state();
        let id = format!("tab-{}", state.tabs.len());
        state.tabs.push(id.clone());
        state.active_tab = id.clone();
        state.opened_urls.push(url.to_string());
        Ok(id)
    }

    async fn move_to(&self, element: &ElementRef, x_offset: f64, y_offset: f64) -> SessionResult<()> {
        self.with_element(element, |_, _| Ok(()))?;
        self.state()
            .pointer_moves
            .push((element.to_string(), x_offset, y_offset));
        Ok(())
    }

    async fn pause(&self, duration: Duration) {
        self.state().pauses.push(duration);
        tokio::time::sleep(duration).await;
    }
}

pub fn driver(session: &Arc<MockSession>) -> Driver {
    driver_with(session, Capability::default())
}

pub fn driver_with(session: &Arc<MockSession>, capability: Capability) -> Driver {
    Driver::new(
        Arc::clone(session) as Arc<dyn RemoteSession>,
        capability,
        Timing::default(),
    )
}

/// Messages delivered at scripted times.
pub struct MockMailbox {
    start: Instant,
    state: Mutex<MailState>,
}

#[derive(Default)]
pub struct MailState {
    pub messages: Vec<(Duration, String, String)>,
    pub deleted: Vec<String>,
    pub list_calls: usize,
    pub fail_delete: Option<String>,
}

impl MockMailbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            state: Mutex::new(MailState::default()),
        })
    }

    pub fn deliver(&self, id: &str, body: &str) {
        self.deliver_at(0, id, body);
    }

    pub fn deliver_at(&self, ms: u64, id: &str, body: &str) {
        self.state().messages.push((
            Duration::from_millis(ms),
            id.to_string(),
            body.to_string(),
        ));
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.state().fail_delete = Some(id.to_string());
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MailState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Mailbox for MockMailbox {
    async fn list_ids(&self) -> MailResult<Vec<String>> {
        let t = Instant::now() - self.start;
        let mut state = self.state();
        state.list_calls += 1;
        Ok(state
            .messages
            .iter()
            .filter(|(at, _, _)| *at <= t)
            .map(|(_, id, _)| id.clone())
            .collect())
    }

    async fn read_body(&self, id: &str) -> MailResult<String> {
        self.state()
            .messages
            .iter()
            .find(|(_, mid, _)| mid == id)
            .map(|(_, _, body)| body.clone())
            .ok_or_else(|| MailError::UnsupportedMessage(id.to_string()))
    }

    async fn delete(&self, id: &str) -> MailResult<()> {
        let mut state = self.state();
        if state.fail_delete.as_deref() == Some(id) {
            return Err(MailError::Auth(format!("cannot delete {}", id)));
        }
        state.messages.retain(|(_, mid, _)| mid != id);
        state.deleted.push(id.to_string());
        Ok(())
    }
}
