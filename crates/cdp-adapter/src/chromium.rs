//! [`BrowserDriver`] backed by a locally launched Chromium through chromiumoxide.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::driver::{BrowserDriver, NewTab};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::recorder::ScreencastRecorder;
use crate::scripts;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Missing,
    Hidden,
    Visible,
}

pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    main_target: String,
    recorder: Mutex<Option<ScreencastRecorder>>,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launches Chromium, opens the main tab and starts recording when a video dir is set.
    pub async fn launch(config: DriverConfig) -> Result<Self, AdapterError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .launch_timeout(Duration::from_millis(config.launch_timeout_ms));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = config.resolved_executable() {
            debug!(path = %path.display(), "using chromium executable");
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder
            .build()
            .map_err(|err| AdapterError::unavailable(format!("invalid browser config: {err}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| AdapterError::unavailable(format!("failed to launch chromium: {err}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(?err, "cdp handler reported an error");
                }
            }
            debug!("cdp handler loop ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| AdapterError::unavailable(format!("failed to open main tab: {err}")))?;
        let main_target = page.target_id().inner().clone();

        let recorder = match config.video_dir.as_deref() {
            Some(dir) => match ScreencastRecorder::start(&page, dir, config.video_quality).await {
                Ok(recorder) => Some(recorder),
                Err(err) => {
                    warn!(%err, "screencast unavailable; continuing without video");
                    None
                }
            },
            None => None,
        };

        info!(
            headless = config.headless,
            recording = recorder.is_some(),
            "chromium driver ready"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            main_target,
            recorder: Mutex::new(recorder),
            handler,
        })
    }

    async fn pages(&self) -> Result<Vec<Page>, AdapterError> {
        self.browser.lock().await.pages().await.map_err(map_cdp)
    }

    async fn probe(&self, selector: &str) -> Result<Probe, AdapterError> {
        let value = self.evaluate(&scripts::probe_element(selector)).await?;
        Ok(match value.as_str() {
            Some("visible") => Probe::Visible,
            Some("hidden") => Probe::Hidden,
            _ => Probe::Missing,
        })
    }

    /// Polls until the selector matches something, then reports its visibility.
    async fn wait_attached(&self, selector: &str, wait: Duration) -> Result<Probe, AdapterError> {
        let deadline = Instant::now() + wait;
        loop {
            let state = self.probe(selector).await?;
            if state != Probe::Missing {
                return Ok(state);
            }
            if Instant::now() >= deadline {
                return Err(AdapterError::target_not_found(selector, wait));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, wait: Duration) -> Result<(), AdapterError> {
        debug!(url, "navigating main tab");
        match timeout(wait, self.page.goto(url)).await {
            Err(_) => Err(AdapterError::nav_timeout(url, wait)),
            Ok(Err(err)) => Err(match map_cdp(err) {
                err if err.is_session_loss() => err,
                err => AdapterError::new(AdapterErrorKind::NavFailed)
                    .with_hint(err.hint.unwrap_or_else(|| err.kind.to_string())),
            }),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        Ok(self.page.url().await.map_err(map_cdp)?.unwrap_or_default())
    }

    async fn title(&self) -> Result<String, AdapterError> {
        let value = self.evaluate("document.title").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(map_cdp)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn wait_visible(&self, selector: &str, wait: Duration) -> Result<(), AdapterError> {
        let deadline = Instant::now() + wait;
        loop {
            let state = self.probe(selector).await?;
            if state == Probe::Visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(match state {
                    Probe::Missing => AdapterError::target_not_found(selector, wait),
                    _ => AdapterError::not_visible(selector, wait),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &str, wait: Duration) -> Result<(), AdapterError> {
        self.wait_attached(selector, wait).await?;
        let clicked = self.evaluate(&scripts::force_click(selector)).await?;
        if clicked.as_bool() != Some(true) {
            return Err(AdapterError::target_not_found(selector, wait));
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str, wait: Duration) -> Result<(), AdapterError> {
        self.wait_attached(selector, wait).await?;
        let filled = self.evaluate(&scripts::fill_value(selector, text)).await?;
        if filled.as_bool() != Some(true) {
            return Err(AdapterError::target_not_found(selector, wait));
        }
        Ok(())
    }

    async fn click_expecting_new_tab(
        &self,
        selector: &str,
        click_timeout: Duration,
        tab_timeout: Duration,
    ) -> Result<NewTab, AdapterError> {
        let known: HashSet<String> = self
            .pages()
            .await?
            .iter()
            .map(|page| page.target_id().inner().clone())
            .collect();

        self.click(selector, click_timeout).await?;

        let deadline = Instant::now() + tab_timeout;
        let opened = loop {
            let fresh = self
                .pages()
                .await?
                .into_iter()
                .find(|page| !known.contains(page.target_id().inner()));
            if let Some(page) = fresh {
                break page;
            }
            if Instant::now() >= deadline {
                return Err(AdapterError::new(AdapterErrorKind::NewTabTimeout).with_hint(
                    format!(
                        "nothing opened within {}ms after clicking `{selector}`",
                        tab_timeout.as_millis()
                    ),
                ));
            }
            sleep(POLL_INTERVAL).await;
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let url = opened.url().await.ok().flatten().unwrap_or_default();
        if timeout(remaining, opened.wait_for_navigation()).await.is_err() {
            return Err(AdapterError::nav_timeout(&url, tab_timeout));
        }
        let url = opened.url().await.ok().flatten().unwrap_or(url);

        Ok(NewTab {
            id: opened.target_id().inner().clone(),
            url,
        })
    }

    async fn close_tab(&self, tab_id: &str) -> Result<(), AdapterError> {
        if tab_id == self.main_target {
            return Ok(());
        }
        for page in self.pages().await? {
            if page.target_id().inner() == tab_id {
                page.close().await.map_err(map_cdp)?;
            }
        }
        Ok(())
    }

    async fn close_secondary_tabs(&self) -> Result<usize, AdapterError> {
        let mut closed = 0;
        for page in self.pages().await? {
            if page.target_id().inner() != &self.main_target {
                match page.close().await {
                    Ok(()) => closed += 1,
                    Err(err) => debug!(?err, "failed to close secondary tab"),
                }
            }
        }
        Ok(closed)
    }

    async fn tab_urls(&self) -> Result<Vec<String>, AdapterError> {
        let mut urls = vec![self.current_url().await?];
        for page in self.pages().await? {
            if page.target_id().inner() != &self.main_target {
                if let Ok(Some(url)) = page.url().await {
                    urls.push(url);
                }
            }
        }
        Ok(urls)
    }

    async fn clear_browsing_state(&self) -> Result<(), AdapterError> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(map_cdp)?;
        self.evaluate(scripts::CLEAR_STORAGE).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(map_cdp)
    }

    async fn shutdown(&self) -> Result<(), AdapterError> {
        if let Some(recorder) = self.recorder.lock().await.take() {
            if let Err(err) = recorder.stop().await {
                warn!(%err, "failed to finalize screencast");
            }
        }
        let mut browser = self.browser.lock().await;
        if let Err(err) = browser.close().await {
            warn!(?err, "error closing browser");
        }
        if let Err(err) = browser.wait().await {
            debug!(?err, "error waiting for browser process");
        }
        self.handler.abort();
        info!("chromium driver shut down");
        Ok(())
    }
}

fn map_cdp(err: CdpError) -> AdapterError {
    match err {
        CdpError::Ws(_) | CdpError::NoResponse | CdpError::ChannelSendError(_) => {
            AdapterError::unavailable(err.to_string())
        }
        CdpError::JavascriptException(_) => {
            AdapterError::new(AdapterErrorKind::Script).with_hint(err.to_string())
        }
        CdpError::Timeout => AdapterError::new(AdapterErrorKind::CdpIo)
            .with_hint("timed out waiting for the browser to respond"),
        other => AdapterError::new(AdapterErrorKind::CdpIo).with_hint(other.to_string()),
    }
}
