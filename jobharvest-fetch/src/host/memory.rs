//! In-memory page driver.
//!
//! Serves documents from a URL map and can be scripted to fail a given
//! number of navigations per URL. It records every navigation so callers
//! can assert on what was visited.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::driver::PageDriver;
use crate::error::FetchError;
use crate::extract::document_matches;

#[derive(Debug, Default)]
struct Script {
    pages: HashMap<String, String>,
    failures: HashMap<String, u32>,
    visits: Vec<String>,
    current: Option<String>,
}

/// Page driver that serves fixed HTML.
#[derive(Debug, Default)]
pub struct StaticPageDriver {
    script: Mutex<Script>,
    closed: AtomicBool,
}

impl StaticPageDriver {
    /// Creates an empty driver. Every URL answers 404 until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the document served at `url`.
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.lock().pages.insert(url.into(), html.into());
        self
    }

    /// Makes the next `times` navigations to `url` fail.
    #[must_use]
    pub fn with_failures(self, url: impl Into<String>, times: u32) -> Self {
        self.lock().failures.insert(url.into(), times);
        self
    }

    /// Every URL passed to [`PageDriver::goto`], in call order.
    pub fn visits(&self) -> Vec<String> {
        self.lock().visits.clone()
    }

    /// Number of navigations to `url`.
    pub fn visit_count(&self, url: &str) -> usize {
        self.lock().visits.iter().filter(|v| *v == url).count()
    }

    /// Whether [`PageDriver::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), FetchError> {
        if self.is_closed() {
            Err(FetchError::Closed)
        } else {
            Ok(())
        }
    }

    fn current_html(&self) -> Result<String, FetchError> {
        let script = self.lock();
        let url = script.current.as_ref().ok_or(FetchError::NoPage)?;
        script.pages.get(url).cloned().ok_or(FetchError::NoPage)
    }
}

#[async_trait]
impl PageDriver for StaticPageDriver {
    fn id(&self) -> &str {
        "memory"
    }

    async fn goto(&self, url: &str) -> Result<(), FetchError> {
        self.ensure_open()?;
        let mut script = self.lock();
        script.visits.push(url.to_string());

        if let Some(remaining) = script.failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                debug!(url, remaining = *remaining, "Scripted navigation failure");
                return Err(FetchError::Navigation {
                    url: url.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
        }

        if !script.pages.contains_key(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        }

        script.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        self.ensure_open()?;
        let html = self.current_html()?;

        if document_matches(&html, selector)? {
            Ok(())
        } else {
            Err(FetchError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.ensure_open()?;
        self.current_html()
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.closed.store(true, Ordering::SeqCst);
        self.lock().current = None;
        Ok(())
    }
}
