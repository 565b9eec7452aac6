//! Chromiumoxide-based browser driver.
//!
//! Provides the default implementation of
//! [`WhatsappDriver`](crate::browser::WhatsappDriver) backed by the
//! `chromiumoxide` crate. The driver launches a local Chromium with a
//! persistent profile, keeps a single page handle for the session, and
//! performs marker probes and element actions through JavaScript evaluated in
//! the page, so CSS and XPath locators are handled uniformly. File uploads go
//! through `DOM.setFileInputFiles` against the hidden input the attachment
//! menu reveals.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use serde_json::{Value as JsonValue, json};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::{fs, time};

use crate::browser::{DriverError, LaunchPlan, WaitCondition, WhatsappDriver};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Driver owning a local Chromium process and its CDP handler task.
pub struct ChromiumoxideDriver {
    state: Arc<Mutex<Option<DriverState>>>,
}

struct DriverState {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
}

impl ChromiumoxideDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
        }
    }

    async fn page(&self) -> Result<Page, DriverError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or(DriverError::NotStarted)?;
        state.page.clone().ok_or(DriverError::NotStarted)
    }

    async fn evaluate_bool(&self, script: &str) -> Result<bool, DriverError> {
        let page = self.page().await?;
        let result = page.evaluate(script).await.map_err(map_cdp_error)?;
        Ok(result
            .value()
            .and_then(JsonValue::as_bool)
            .unwrap_or(false))
    }

    async fn run_element_script(&self, selector: &str, body: &str) -> Result<(), DriverError> {
        let script = element_script(selector, body)?;
        let page = self.page().await?;
        page.evaluate(script).await.map_err(map_cdp_error)?;
        Ok(())
    }
}

impl Default for ChromiumoxideDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhatsappDriver for ChromiumoxideDriver {
    async fn launch(&self, plan: &LaunchPlan) -> Result<(), DriverError> {
        if self.state.lock().await.is_some() {
            return Ok(());
        }

        fs::create_dir_all(&plan.downloads_dir)
            .await
            .map_err(|err| DriverError::Launch(err.to_string()))?;

        let config = build_config(plan)?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|err| DriverError::Launch(err.to_string()))?;

        let handler = spawn_handler(handler);

        let mut guard = self.state.lock().await;
        *guard = Some(DriverState {
            browser,
            handler,
            page: None,
        });
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut guard = self.state.lock().await;
        let state = guard.as_mut().ok_or(DriverError::NotStarted)?;

        match &state.page {
            Some(page) => {
                page.goto(url).await.map_err(map_cdp_error)?;
            }
            None => {
                let page = state.browser.new_page(url).await.map_err(map_cdp_error)?;
                state.page = Some(page);
            }
        }
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout_ms: u64,
    ) -> Result<(), DriverError> {
        let script = probe_script(selector)?;
        let started = Instant::now();

        loop {
            let present = self.evaluate_bool(&script).await?;
            let satisfied = match condition {
                WaitCondition::Visible => present,
                WaitCondition::Detached => !present,
            };
            if satisfied {
                return Ok(());
            }
            if started.elapsed().as_millis() >= u128::from(timeout_ms) {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms,
                });
            }
            time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.run_element_script(selector, "el.click(); return true;")
            .await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let text_json =
            serde_json::to_string(text).map_err(|err| DriverError::Message(err.to_string()))?;
        let body = format!(
            "const value = {text_json};
            el.focus();
            if (el.isContentEditable) {{
                const range = document.createRange();
                range.selectNodeContents(el);
                const selection = window.getSelection();
                selection.removeAllRanges();
                selection.addRange(range);
                document.execCommand('insertText', false, value);
            }} else {{
                if (el.select) {{
                    el.select();
                }}
                el.value = value;
            }}
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;"
        );
        self.run_element_script(selector, &body).await
    }

    async fn press(&self, selector: &str, key: &str) -> Result<(), DriverError> {
        let key_json =
            serde_json::to_string(key).map_err(|err| DriverError::Message(err.to_string()))?;
        let body = format!(
            "const keyValue = {key_json};
            el.focus();
            const eventInit = {{ key: keyValue, bubbles: true, cancelable: true }};
            el.dispatchEvent(new KeyboardEvent('keydown', eventInit));
            el.dispatchEvent(new KeyboardEvent('keyup', eventInit));
            return true;"
        );
        self.run_element_script(selector, &body).await
    }

    async fn set_files(&self, selector: &str, file: &Path) -> Result<(), DriverError> {
        let page = self.page().await?;
        let element = page.find_element(selector).await.map_err(map_cdp_error)?;

        let params: SetFileInputFilesParams = serde_json::from_value(json!({
            "files": [file.to_string_lossy()],
            "backendNodeId": element.backend_node_id,
        }))
        .map_err(|err| DriverError::Message(err.to_string()))?;

        page.execute(params).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), DriverError> {
        let state = {
            let mut guard = self.state.lock().await;
            guard.take()
        };

        if let Some(mut state) = state {
            state.page = None;
            // Ask the browser to exit while the handler still drives the
            // connection, then stop the handler task.
            let close_result = state.browser.close().await;
            let _ = state.browser.wait().await;
            state.handler.abort();
            close_result.map_err(map_cdp_error)?;
        }
        Ok(())
    }
}

fn build_config(plan: &LaunchPlan) -> Result<BrowserConfig, DriverError> {
    let mut builder = BrowserConfig::builder();

    if let Some(path) = &plan.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    let builder = builder
        .user_data_dir(&plan.user_data_dir)
        .launch_timeout(Duration::from_millis(plan.launch_timeout_ms));

    let builder = if plan.headless {
        builder
    } else {
        builder.with_head()
    };

    let builder = if !plan.locale.is_empty() {
        builder.arg(format!("--lang={}", plan.locale))
    } else {
        builder
    };

    builder.build().map_err(DriverError::Launch)
}

fn map_cdp_error<E: std::fmt::Display>(err: E) -> DriverError {
    DriverError::Message(err.to_string())
}

fn spawn_handler(mut handler: chromiumoxide::handler::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = handler.next().await {
            if let Err(err) = result {
                eprintln!("chromiumoxide handler error: {err}");
            }
        }
    })
}

/// Wrap `body` in an IIFE that resolves `selector` into `el`.
///
/// Expressions starting with `//` or `(` are evaluated as XPath, everything
/// else goes through `querySelector`.
fn element_script(selector: &str, body: &str) -> Result<String, DriverError> {
    let selector_json =
        serde_json::to_string(selector).map_err(|err| DriverError::Message(err.to_string()))?;
    Ok(format!(
        "(function() {{
            const selector = {selector_json};
            let el = null;
            if (selector.startsWith('//') || selector.startsWith('(')) {{
                el = document.evaluate(selector, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null)
                    .singleNodeValue;
            }} else {{
                el = document.querySelector(selector);
            }}
            if (!el) {{
                throw new Error('Element not found for selector');
            }}
            {body}
        }})()"
    ))
}

/// Existence probe for `selector`, returning a boolean from the page.
fn probe_script(selector: &str) -> Result<String, DriverError> {
    let selector_json =
        serde_json::to_string(selector).map_err(|err| DriverError::Message(err.to_string()))?;
    Ok(format!(
        "(function() {{
            const selector = {selector_json};
            let el = null;
            if (selector.startsWith('//') || selector.startsWith('(')) {{
                el = document.evaluate(selector, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null)
                    .singleNodeValue;
            }} else {{
                el = document.querySelector(selector);
            }}
            return el !== null;
        }})()"
    ))
}
