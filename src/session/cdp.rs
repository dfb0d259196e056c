use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
};
use chromiumoxide::cdp::browser_protocol::input::{DispatchMouseEventParams, DispatchMouseEventType};
use chromiumoxide::cdp::browser_protocol::page::HandleJavaScriptDialogParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::sync::Mutex;

use super::keys::key_press_js;
use super::launcher::{chrome_args, find_chrome_binary, LaunchOptions};
use super::pool::TabPool;
use super::{ElementRef, RemoteSession, SessionError, SessionResult};
use crate::selectors::Selector;

/// Visibility as a user would judge it: rendered, not transparent, non-empty box.
const VISIBLE_FN: &str = r#"const visible = (el) => {
    const style = getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && parseFloat(style.opacity) > 0
        && rect.width > 0
        && rect.height > 0;
};"#;

/// A Chrome DevTools Protocol session driving the active tab of one browser.
pub struct CdpSession {
    browser: Browser,
    _handler_task: tokio::task::JoinHandle<()>,
    pool: Mutex<TabPool>,
    _profile: Option<TempDir>,
}

/// Outcome of a script run against one element.
#[derive(Debug, Deserialize)]
struct ElementReply {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    count: usize,
    #[serde(default)]
    value: serde_json::Value,
}

impl CdpSession {
    /// Launch a local Chrome with a throwaway profile.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let chrome = find_chrome_binary(options.chrome_path.as_deref())?;
        let profile = tempfile::tempdir().context("Failed to create browser profile dir")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile.path())
            .window_size(options.window_size.0, options.window_size.1);
        if !options.headless {
            builder = builder.with_head();
        }
        for arg in chrome_args(options) {
            builder = builder.arg(arg);
        }
        let config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome")?;
        tracing::info!("Browser session started (headless: {})", options.headless);

        Self::attach(browser, handler, Some(profile)).await
    }

    /// Attach to an already running browser through its DevTools websocket.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let (browser, handler) = Browser::connect(endpoint)
            .await
            .with_context(|| format!("Failed to connect to browser at {}", endpoint))?;
        tracing::info!("Connected to browser at {}", endpoint);

        Self::attach(browser, handler, None).await
    }

    async fn attach(
        browser: Browser,
        mut handler: chromiumoxide::handler::Handler,
        profile: Option<TempDir>,
    ) -> Result<Self> {
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let mut pages = browser.pages().await.context("Failed to list tabs")?;
        let page = if pages.is_empty() {
            browser
                .new_page("about:blank")
                .await
                .context("Failed to create initial page")?
        } else {
            pages.remove(0)
        };

        Ok(Self {
            browser,
            _handler_task: handler_task,
            pool: Mutex::new(TabPool::new(page)),
            _profile: profile,
        })
    }

    /// Close the browser.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.context("Failed to close browser")?;
        Ok(())
    }

    async fn page(&self) -> Page {
        self.pool.lock().await.active_page().clone()
    }

    async fn eval<T: DeserializeOwned>(&self, js: &str) -> SessionResult<T> {
        let page = self.page().await;
        page.evaluate(js)
            .await
            .map_err(SessionError::protocol)?
            .into_value()
            .map_err(SessionError::protocol)
    }

    /// Run `body` with `el` bound to the referenced element. `body` must
    /// return an object `{ value }` or `{ error }`.
    async fn on_element(&self, element: &ElementRef, body: &str) -> SessionResult<serde_json::Value> {
        let list = element.selector.elements_js().map_err(SessionError::protocol)?;
        let js = format!(
            r#"(() => {{
                {VISIBLE_FN}
                const els = {list};
                const el = els[{index}];
                if (!el) return {{ error: 'missing', count: els.length }};
                {body}
            }})()"#,
            index = element.index,
        );
        let reply: ElementReply = self.eval(&js).await?;
        match reply.error.as_deref() {
            None => Ok(reply.value),
            Some("missing") if reply.count == 0 => {
                Err(SessionError::NoSuchElement(element.selector.to_string()))
            }
            Some("missing") => Err(SessionError::Stale(element.to_string())),
            Some("intercepted") => Err(SessionError::Intercepted(element.to_string())),
            Some("not_interactable") => Err(SessionError::NotInteractable(element.to_string())),
            Some(other) => Err(SessionError::Protocol(format!("{}: {}", element, other))),
        }
    }

    async fn on_first(&self, selector: &Selector, body: &str) -> SessionResult<serde_json::Value> {
        self.on_element(&ElementRef::first(selector), body).await
    }

    async fn query_bool(&self, selector: &Selector, check: &str) -> SessionResult<bool> {
        let list = selector.elements_js().map_err(SessionError::protocol)?;
        let js = format!(
            r#"(() => {{
                {VISIBLE_FN}
                const el = ({list})[0];
                if (!el) return false;
                return {check};
            }})()"#
        );
        self.eval(&js).await
    }
}

/// Viewport position of an element's top-left corner.
#[derive(Debug, Deserialize)]
struct Corner {
    left: f64,
    top: f64,
}

#[async_trait]
impl RemoteSession for CdpSession {
    async fn navigate(&self, url: &str) -> SessionResult<()> {
        tracing::info!("Navigating to: {}", url);
        let page = self.page().await;
        page.goto(url).await.map_err(SessionError::protocol)?;
        // goto() waits for the load event; leave a moment for post-load scripts
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }

    async fn reload(&self) -> SessionResult<()> {
        let page = self.page().await;
        page.reload().await.map_err(SessionError::protocol)?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    async fn maximize(&self) -> SessionResult<()> {
        let page = self.page().await;
        let window = page
            .execute(GetWindowForTargetParams::default())
            .await
            .map_err(SessionError::protocol)?;
        let bounds = Bounds::builder().window_state(WindowState::Maximized).build();
        page.execute(SetWindowBoundsParams::new(window.result.window_id.clone(), bounds))
            .await
            .map_err(SessionError::protocol)?;
        Ok(())
    }

    async fn title(&self) -> SessionResult<String> {
        let page = self.page().await;
        Ok(page
            .get_title()
            .await
            .map_err(SessionError::protocol)?
            .unwrap_or_default())
    }

    async fn find_all(&self, selector: &Selector) -> SessionResult<Vec<ElementRef>> {
        let list = selector.elements_js().map_err(SessionError::protocol)?;
        let count: usize = self.eval(&format!("({list}).length")).await?;
        Ok((0..count)
            .map(|index| ElementRef::new(selector.clone(), index))
            .collect())
    }

    async fn exists(&self, selector: &Selector) -> SessionResult<bool> {
        self.query_bool(selector, "true").await
    }

    async fn is_visible(&self, selector: &Selector) -> SessionResult<bool> {
        self.query_bool(selector, "visible(el)").await
    }

    async fn is_enabled(&self, selector: &Selector) -> SessionResult<bool> {
        self.query_bool(selector, "!el.disabled && el.getAttribute('aria-disabled') !== 'true'")
            .await
    }

    async fn element_visible(&self, element: &ElementRef) -> SessionResult<bool> {
        let value = self
            .on_element(element, "return { value: visible(el) };")
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn element_text(&self, element: &ElementRef) -> SessionResult<String> {
        let value = self
            .on_element(
                element,
                "return { value: (el.innerText || el.textContent || '').trim() };",
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click(&self, element: &ElementRef) -> SessionResult<()> {
        // Scroll, then check the element is rendered and not covered at its centre
        self.on_element(
            element,
            r#"el.scrollIntoView({ block: 'center', inline: 'center', behavior: 'instant' });
            if (!visible(el)) return { error: 'not_interactable' };
            const rect = el.getBoundingClientRect();
            const top = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
            if (top && !(el === top || el.contains(top) || top.contains(el))) {
                return { error: 'intercepted' };
            }
            return { value: true };"#,
        )
        .await?;

        // Let scroll/layout settle before dispatching
        tokio::time::sleep(Duration::from_millis(50)).await;

        self.on_element(
            element,
            r#"const rect = el.getBoundingClientRect();
            const opts = { bubbles: true, cancelable: true, view: window,
                clientX: rect.left + rect.width / 2, clientY: rect.top + rect.height / 2, button: 0 };
            el.dispatchEvent(new MouseEvent('mousemove', opts));
            el.dispatchEvent(new MouseEvent('mousedown', opts));
            el.dispatchEvent(new MouseEvent('mouseup', opts));
            el.dispatchEvent(new MouseEvent('click', opts));
            return { value: true };"#,
        )
        .await?;
        Ok(())
    }

    async fn set_value(&self, selector: &Selector, text: &str) -> SessionResult<()> {
        let body = format!(
            r#"if (el.disabled || el.readOnly) return {{ error: 'not_interactable' }};
            el.focus();
            const text = {text};
            if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {{
                const proto = el.tagName === 'INPUT'
                    ? window.HTMLInputElement.prototype
                    : window.HTMLTextAreaElement.prototype;
                const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set;
                if (setter) {{
                    setter.call(el, text);
                }} else {{
                    el.value = text;
                }}
            }} else {{
                el.textContent = text;
            }}
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return {{ value: true }};"#,
            text = serde_json::to_string(text).map_err(SessionError::protocol)?
        );
        self.on_first(selector, &body).await?;
        Ok(())
    }

    async fn clear(&self, selector: &Selector) -> SessionResult<()> {
        self.set_value(selector, "").await
    }

    async fn get_text(&self, selector: &Selector) -> SessionResult<String> {
        self.element_text(&ElementRef::first(selector)).await
    }

    async fn get_attribute(
        &self,
        selector: &Selector,
        name: &str,
    ) -> SessionResult<Option<String>> {
        let body = format!(
            r#"const name = {name};
            const value = (name === 'value' && 'value' in el) ? el.value : el.getAttribute(name);
            return {{ value: value }};"#,
            name = serde_json::to_string(name).map_err(SessionError::protocol)?
        );
        let value = self.on_first(selector, &body).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn send_keys(&self, key: &str) -> SessionResult<()> {
        let js = key_press_js(key).map_err(SessionError::protocol)?;
        let _: serde_json::Value = self.eval(&js).await?;
        Ok(())
    }

    async fn tab_ids(&self) -> SessionResult<Vec<String>> {
        let pages = self.browser.pages().await.map_err(SessionError::protocol)?;
        let mut pool = self.pool.lock().await;
        pool.sync(pages);
        Ok(pool.target_ids())
    }

    async fn switch_tab(&self, id: &str) -> SessionResult<()> {
        let page = {
            let mut pool = self.pool.lock().await;
            pool.select_by_target_id(id)
                .cloned()
                .ok_or_else(|| SessionError::NoSuchTab(id.to_string()))?
        };
        page.bring_to_front().await.map_err(SessionError::protocol)?;
        tracing::debug!("Switched to tab {}", id);
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> SessionResult<serde_json::Value> {
        let page = self.page().await;
        let result = page
            .evaluate(script)
            .await
            .map_err(SessionError::protocol)?;
        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    async fn handle_dialog(&self, accept: bool) -> SessionResult<()> {
        let page = self.page().await;
        page.execute(HandleJavaScriptDialogParams::new(accept))
            .await
            .map_err(SessionError::protocol)?;
        tracing::debug!("Dialog {}", if accept { "accepted" } else { "dismissed" });
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> SessionResult<String> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(SessionError::protocol)?;
        page.bring_to_front().await.map_err(SessionError::protocol)?;
        let id = page.target_id().as_ref().to_string();
        self.pool.lock().await.push_active(page);
        tracing::info!("Opened tab {} at {}", id, url);
        Ok(id)
    }

    async fn move_to(&self, element: &ElementRef, x_offset: f64, y_offset: f64) -> SessionResult<()> {
        let value = self
            .on_element(
                element,
                r#"el.scrollIntoView({ block: 'center', inline: 'center', behavior: 'instant' });
                const rect = el.getBoundingClientRect();
                return { value: { left: rect.left, top: rect.top } };"#,
            )
            .await?;
        let corner: Corner = serde_json::from_value(value).map_err(SessionError::protocol)?;
        let page = self.page().await;
        page.execute(DispatchMouseEventParams::new(
            DispatchMouseEventType::MouseMoved,
            corner.left + x_offset,
            corner.top + y_offset,
        ))
        .await
        .map_err(SessionError::protocol)?;
        Ok(())
    }
}
