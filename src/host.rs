//! Embedding host: renders an accepted target and reports the outcome.
//!
//! The controller only ever sees a binary loaded/failed signal tagged with
//! the generation it asked for. Why a load failed is traced here and not
//! passed on.

use std::io::Read;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::embed::{Generation, LoadRequest};

/// Lines of body text kept for the preview panel.
const PREVIEW_LINES: usize = 200;

/// What a tab expands to in preview text.
const TAB: &str = "    ";

/// Something that can render a target inline.
pub trait EmbedHost {
    /// Start loading `request`. The outcome arrives later as a [`HostEvent`].
    fn load(&mut self, request: LoadRequest);
}

/// An asynchronous load outcome for one generation.
#[derive(Debug, Clone)]
pub struct HostEvent {
    pub generation: Generation,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Loaded(Preview),
    Failed(String),
}

/// What the preview panel shows once a target has loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub lines: Vec<String>,
}

/// Fetches targets over HTTP, one background thread per request.
///
/// Superseded fetches run to completion; their events are dropped by the
/// controller's generation check.
#[derive(Clone)]
pub struct HttpHost {
    events: Sender<HostEvent>,
    user_agent: String,
    preview_bytes: u64,
    fetch_timeout: Duration,
}

impl HttpHost {
    pub fn new(config: &Config, events: Sender<HostEvent>) -> Self {
        Self {
            events,
            user_agent: config.user_agent.clone(),
            preview_bytes: config.preview_bytes,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }

    fn fetch(&self, request: &LoadRequest) -> Result<Preview, String> {
        let builder = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.fetch_timeout);
        // Loopback test servers must not be routed through an ambient proxy.
        #[cfg(test)]
        let builder = builder.no_proxy();

        let client = builder
            .build()
            .map_err(|e| format!("client build error: {e}"))?;

        let resp = client
            .get(request.url.clone())
            .send()
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut buf = Vec::new();
        resp.take(self.preview_bytes)
            .read_to_end(&mut buf)
            .map_err(|e| e.to_string())?;
        let body = String::from_utf8_lossy(&buf);

        Ok(Preview {
            final_url,
            status: status.as_u16(),
            content_type,
            title: extract_title(&body),
            lines: body
                .lines()
                .map(|l| printable(l).trim_end().to_string())
                .filter(|l| !l.trim().is_empty())
                .take(PREVIEW_LINES)
                .collect(),
        })
    }
}

impl EmbedHost for HttpHost {
    fn load(&mut self, request: LoadRequest) {
        let host = self.clone();
        thread::spawn(move || {
            tracing::debug!(generation = %request.generation, url = %request.url, "fetch started");
            let outcome = match host.fetch(&request) {
                Ok(preview) => {
                    tracing::debug!(status = preview.status, url = %preview.final_url, "fetch done");
                    Outcome::Loaded(preview)
                }
                Err(reason) => {
                    tracing::warn!(url = %request.url, %reason, "fetch failed");
                    Outcome::Failed(reason)
                }
            };

            // The receiver is gone once the screen has closed.
            let _ = host.events.send(HostEvent {
                generation: request.generation,
                outcome,
            });
        });
    }
}

/// `text` with tabs expanded and every other control character removed.
///
/// Fetched text ends up in terminal cells, so escape sequences must not.
pub fn printable(text: &str) -> String {
    text.replace('\t', TAB)
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// Text of the first `<title>` element, if any.
fn extract_title(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;

    let title = printable(&body[start..end])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() { None } else { Some(title) }
}
