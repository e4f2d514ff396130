use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tokio::{
    task::JoinHandle,
    time::{sleep, Instant},
};
use tracing::info;

use crate::error::ScrapeError;

/// Interval between readiness probes inside a bounded wait.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One headless Chrome instance plus the single page the run drives.
/// The session owns the browser for the lifetime of the run; the CDP event
/// handler runs on a background task.
pub struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl Session {
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-dev-shm-usage");
        if !headless {
            config = config.with_head();
        }
        let config = config
            .build()
            .map_err(|e| anyhow!("building browser config: {e}"))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .context("launching chrome")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("opening page")?;
        info!(headless, "browser session started");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?
            .wait_for_navigation()
            .await
            .context("waiting for initial navigation")?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        let Session {
            mut browser,
            handler,
            page,
        } = self;
        drop(page);
        browser.close().await.context("closing browser")?;
        let _ = handler.await;
        Ok(())
    }
}

/// Trimmed visible text of an element; missing text reads as empty.
pub async fn text_of(element: &Element) -> Result<String, ScrapeError> {
    Ok(element
        .inner_text()
        .await?
        .unwrap_or_default()
        .trim()
        .to_string())
}

/// Block until `selector` matches, or fail with a `NavigationTimeout`.
pub async fn wait_for(
    page: &Page,
    selector: &str,
    what: &str,
    timeout: Duration,
) -> Result<Element, ScrapeError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::timeout(what, timeout));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Block until `selector` matches at least one element.
pub async fn wait_for_all(
    page: &Page,
    selector: &str,
    what: &str,
    timeout: Duration,
) -> Result<Vec<Element>, ScrapeError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(elements) = page.find_elements(selector).await {
            if !elements.is_empty() {
                return Ok(elements);
            }
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::timeout(what, timeout));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Block until some element matching `selector` has exactly `text` as its
/// trimmed visible text. Option labels in the grid's menus are matched this
/// way because they carry no stable ids.
pub async fn wait_for_text(
    page: &Page,
    selector: &str,
    text: &str,
    what: &str,
    timeout: Duration,
) -> Result<Element, ScrapeError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(elements) = page.find_elements(selector).await {
            for element in elements {
                if let Ok(Some(t)) = element.inner_text().await {
                    if t.trim() == text {
                        return Ok(element);
                    }
                }
            }
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::timeout(what, timeout));
        }
        sleep(POLL_INTERVAL).await;
    }
}
