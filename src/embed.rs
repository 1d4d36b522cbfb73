//! Embed controller: the state machine behind the screen.
//!
//! Owns the current input, the target bound to the embedding host, and its
//! phase. All mutation happens through four events, delivered one at a time
//! by the event loop:
//!
//! ```text
//! idle ──submit(valid)──▶ loading ──loaded──▶ ready
//!                         loading ──failed | watchdog──▶ failed
//! {loading, ready, failed} ──submit(empty | invalid)──▶ idle
//! {loading, ready, failed} ──submit(valid)──▶ loading   (new generation)
//! ```
//!
//! Every event appends exactly one activity log entry, except stale ones,
//! which are dropped without a trace in the log.

mod state;
mod target;
mod watchdog;

use std::time::{Duration, Instant};

use url::Url;

use crate::activity::{ActivityLog, Severity};
use crate::host::{HostEvent, Outcome};

pub use state::{EmbedState, Phase};
pub use target::{Generation, InputError, Target, parse_target, validate};
pub use watchdog::WATCHDOG_TIMEOUT;

use watchdog::Watchdog;

/// What the event loop should hand to the embedding host after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: Generation,
    pub url: Url,
}

pub struct EmbedController {
    state: EmbedState,
    log: ActivityLog,
    watchdog: Option<Watchdog>,
    generation: Generation,
    timeout: Duration,
}

impl EmbedController {
    pub fn new() -> Self {
        Self::with_timeout(WATCHDOG_TIMEOUT)
    }

    /// A controller whose watchdog uses `timeout` instead of [`WATCHDOG_TIMEOUT`].
    pub(crate) fn with_timeout(timeout: Duration) -> Self {
        let mut log = ActivityLog::new();
        log.append(Severity::Info, "Application started");
        Self {
            state: EmbedState::default(),
            log,
            watchdog: None,
            generation: Generation::default(),
            timeout,
        }
    }

    pub fn state(&self) -> &EmbedState {
        &self.state
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// When the armed watchdog fires, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.watchdog.as_ref().map(Watchdog::deadline)
    }

    // ── Input ──

    pub fn set_input(&mut self, raw: impl Into<String>) {
        self.state.raw_input = raw.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.state.raw_input.push(c);
    }

    pub fn backspace(&mut self) {
        self.state.raw_input.pop();
    }

    pub fn clear_input(&mut self) {
        self.state.raw_input.clear();
    }

    // ── Transitions ──

    /// Validate the current input and, if accepted, start loading it.
    ///
    /// Returns the request to pass to the embedding host. Any previously
    /// armed watchdog is cancelled regardless of the outcome.
    pub fn submit(&mut self, now: Instant) -> Option<LoadRequest> {
        self.watchdog = None;

        let raw = self.state.raw_input.clone();
        let url = match parse_target(&raw) {
            Ok(url) => url,
            Err(InputError::Empty) => {
                self.state.clear_target();
                self.log.append(Severity::Error, "Please enter a URL");
                return None;
            }
            Err(e) => {
                tracing::debug!(input = %raw, error = %e, "input rejected");
                self.state.clear_target();
                self.log.append(Severity::Error, format!("Invalid URL: {raw}"));
                return None;
            }
        };

        self.generation = self.generation.next();
        let generation = self.generation;

        self.state.target = Some(Target {
            url: url.clone(),
            generation,
        });
        self.state.phase = Phase::Loading;
        self.watchdog = Some(Watchdog::arm(generation, now, self.timeout));
        self.log
            .append(Severity::Success, format!("Valid URL accepted: {url}"));
        tracing::debug!(%generation, %url, "target armed");

        Some(LoadRequest { generation, url })
    }

    /// The host rendered the target for `generation`.
    pub fn on_embed_loaded(&mut self, generation: Generation) {
        if !self.state.is_loading(generation) {
            tracing::debug!(%generation, "ignoring stale load callback");
            return;
        }
        self.state.phase = Phase::Ready;
        self.watchdog = None;
        self.log.append(Severity::Success, "Embed loaded successfully");
    }

    /// The host reported that the target for `generation` could not render.
    pub fn on_embed_failed(&mut self, generation: Generation) {
        if !self.state.is_loading(generation) {
            tracing::debug!(%generation, "ignoring stale failure callback");
            return;
        }
        self.state.phase = Phase::Failed;
        self.watchdog = None;
        self.log.append(Severity::Error, "Embed failed to load");
    }

    /// Route a host outcome to the matching callback.
    pub fn apply(&mut self, event: &HostEvent) {
        match &event.outcome {
            Outcome::Loaded(_) => self.on_embed_loaded(event.generation),
            Outcome::Failed(reason) => {
                tracing::info!(generation = %event.generation, %reason, "host reported failure");
                self.on_embed_failed(event.generation);
            }
        }
    }

    /// Fire the watchdog if its deadline has passed.
    ///
    /// Returns true when the watchdog moved the target to failed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(dog) = self.watchdog else {
            return false;
        };
        if !dog.is_due(now) {
            return false;
        }

        self.watchdog = None;
        if !self.state.is_loading(dog.generation()) {
            return false;
        }

        self.state.phase = Phase::Failed;
        self.log.append(
            Severity::Error,
            format!(
                "Timed out loading embed ({} seconds)",
                self.timeout.as_secs()
            ),
        );
        true
    }
}

impl Default for EmbedController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::activity::LogEntry;
    use crate::host::Preview;

    fn submitted(input: &str, now: Instant) -> (EmbedController, Option<LoadRequest>) {
        let mut ctl = EmbedController::new();
        ctl.set_input(input);
        let req = ctl.submit(now);
        (ctl, req)
    }

    fn tail(ctl: &EmbedController, n: usize) -> Vec<(Severity, String)> {
        let entries = ctl.log().entries();
        entries[entries.len() - n..]
            .iter()
            .map(|e: &LogEntry| (e.severity, e.message.clone()))
            .collect()
    }

    fn assert_idle(ctl: &EmbedController) {
        assert_eq!(ctl.state().phase(), Phase::Idle);
        assert!(ctl.state().target().is_none());
        assert!(ctl.deadline().is_none());
    }

    #[test]
    fn starts_idle_with_info_entry() {
        let ctl = EmbedController::new();
        assert_idle(&ctl);
        assert_eq!(ctl.log().len(), 1);
        assert_eq!(ctl.log().entries()[0].severity, Severity::Info);
    }

    #[test]
    fn empty_input_resets_to_idle() {
        for input in ["", "   ", "\t"] {
            let (ctl, req) = submitted(input, Instant::now());
            assert!(req.is_none());
            assert_idle(&ctl);
            assert_eq!(ctl.log().len(), 2);
            assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
        }
    }

    #[test]
    fn invalid_input_is_logged_verbatim() {
        let (ctl, req) = submitted("not a url", Instant::now());
        assert!(req.is_none());
        assert_idle(&ctl);

        let (severity, message) = &tail(&ctl, 1)[0];
        assert_eq!(*severity, Severity::Error);
        assert!(message.contains("not a url"), "{message}");
    }

    #[test]
    fn disallowed_scheme_rejected() {
        let (ctl, req) = submitted("ftp://example.com", Instant::now());
        assert!(req.is_none());
        assert_idle(&ctl);
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
    }

    #[test]
    fn valid_input_starts_loading() {
        let now = Instant::now();
        let (ctl, req) = submitted("https://example.com", now);

        let req = req.expect("valid input yields a load request");
        assert_eq!(req.url.as_str(), "https://example.com/");
        assert_eq!(ctl.state().phase(), Phase::Loading);
        assert_eq!(ctl.state().target().unwrap().url, req.url);
        assert_eq!(ctl.state().target().unwrap().generation, req.generation);
        assert_eq!(ctl.deadline(), Some(now + WATCHDOG_TIMEOUT));
        assert_eq!(ctl.log().len(), 2);
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Success);
    }

    #[test]
    fn loaded_moves_to_ready() {
        let (mut ctl, req) = submitted("https://example.com", Instant::now());
        ctl.on_embed_loaded(req.unwrap().generation);

        assert_eq!(ctl.state().phase(), Phase::Ready);
        assert!(ctl.deadline().is_none());
        let tail = tail(&ctl, 2);
        assert_eq!(tail[0].0, Severity::Success);
        assert!(tail[0].1.contains("https://example.com"));
        assert_eq!(tail[1].0, Severity::Success);
    }

    #[test]
    fn loaded_twice_is_noop() {
        let (mut ctl, req) = submitted("https://example.com", Instant::now());
        let generation = req.unwrap().generation;
        ctl.on_embed_loaded(generation);
        let len = ctl.log().len();

        ctl.on_embed_loaded(generation);
        assert_eq!(ctl.state().phase(), Phase::Ready);
        assert_eq!(ctl.log().len(), len);
    }

    #[test]
    fn failed_moves_to_failed() {
        let (mut ctl, req) = submitted("http://example.com", Instant::now());
        ctl.on_embed_failed(req.unwrap().generation);

        assert_eq!(ctl.state().phase(), Phase::Failed);
        assert!(ctl.state().target().is_some());
        assert!(ctl.deadline().is_none());
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
    }

    #[test]
    fn watchdog_times_out_loading_target() {
        let now = Instant::now();
        let (mut ctl, _) = submitted("https://example.com", now);

        assert!(!ctl.tick(now + Duration::from_secs(9)));
        assert_eq!(ctl.state().phase(), Phase::Loading);

        assert!(ctl.tick(now + WATCHDOG_TIMEOUT));
        assert_eq!(ctl.state().phase(), Phase::Failed);
        assert!(ctl.deadline().is_none());

        let tail = tail(&ctl, 2);
        assert_eq!(tail[0].0, Severity::Success);
        assert_eq!(tail[1].0, Severity::Error);
        assert!(tail[1].1.contains("10 seconds"));
    }

    #[test]
    fn failure_before_watchdog_wins() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        ctl.on_embed_failed(req.unwrap().generation);
        let len = ctl.log().len();

        assert!(!ctl.tick(now + WATCHDOG_TIMEOUT));
        assert_eq!(ctl.state().phase(), Phase::Failed);
        assert_eq!(ctl.log().len(), len);
    }

    #[test]
    fn watchdog_before_failure_wins() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        assert!(ctl.tick(now + WATCHDOG_TIMEOUT));
        let len = ctl.log().len();

        let generation = req.unwrap().generation;
        ctl.on_embed_failed(generation);
        ctl.on_embed_loaded(generation);
        assert_eq!(ctl.state().phase(), Phase::Failed);
        assert_eq!(ctl.log().len(), len);
    }

    #[test]
    fn resubmission_supersedes_old_watchdog() {
        let start = Instant::now();
        let (mut ctl, first) = submitted("https://one.example", start);
        let first = first.unwrap();

        let later = start + Duration::from_secs(5);
        ctl.set_input("https://two.example");
        let second = ctl.submit(later).unwrap();
        assert_ne!(first.generation, second.generation);
        assert_eq!(ctl.deadline(), Some(later + WATCHDOG_TIMEOUT));

        // The first target's deadline passes; the new one is still loading.
        assert!(!ctl.tick(start + WATCHDOG_TIMEOUT));
        assert_eq!(ctl.state().phase(), Phase::Loading);

        // Callbacks for the superseded target are ignored.
        ctl.on_embed_failed(first.generation);
        ctl.on_embed_loaded(first.generation);
        assert_eq!(ctl.state().phase(), Phase::Loading);

        ctl.on_embed_loaded(second.generation);
        assert_eq!(ctl.state().phase(), Phase::Ready);
        assert_eq!(ctl.state().target().unwrap().url.as_str(), "https://two.example/");
    }

    #[test]
    fn invalid_submit_from_failed_returns_to_idle() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        ctl.on_embed_failed(req.unwrap().generation);
        assert_eq!(ctl.state().phase(), Phase::Failed);
        let len = ctl.log().len();

        ctl.set_input("not a url");
        assert!(ctl.submit(now).is_none());
        assert_idle(&ctl);
        assert_eq!(ctl.log().len(), len + 1);
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
    }

    #[test]
    fn empty_submit_from_failed_returns_to_idle() {
        let now = Instant::now();
        let (mut ctl, _) = submitted("https://example.com", now);
        assert!(ctl.tick(now + WATCHDOG_TIMEOUT));
        let len = ctl.log().len();

        ctl.set_input("  ");
        assert!(ctl.submit(now).is_none());
        assert_idle(&ctl);
        assert_eq!(ctl.log().len(), len + 1);
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
    }

    #[test]
    fn empty_submit_from_ready_returns_to_idle() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        ctl.on_embed_loaded(req.unwrap().generation);
        assert_eq!(ctl.state().phase(), Phase::Ready);
        let len = ctl.log().len();

        ctl.clear_input();
        assert!(ctl.submit(now).is_none());
        assert_idle(&ctl);
        assert_eq!(ctl.log().len(), len + 1);
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
    }

    #[test]
    fn invalid_submit_from_ready_returns_to_idle() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        ctl.on_embed_loaded(req.unwrap().generation);
        let len = ctl.log().len();

        ctl.set_input("ftp://example.com");
        assert!(ctl.submit(now).is_none());
        assert_idle(&ctl);
        assert_eq!(ctl.log().len(), len + 1);
        assert_eq!(tail(&ctl, 1)[0].0, Severity::Error);
    }

    #[test]
    fn invalid_resubmission_cancels_loading() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);

        ctl.set_input("nope");
        assert!(ctl.submit(now).is_none());
        assert_idle(&ctl);

        // Nothing from the abandoned target can revive it.
        assert!(!ctl.tick(now + WATCHDOG_TIMEOUT));
        ctl.on_embed_loaded(req.unwrap().generation);
        assert_idle(&ctl);
    }

    #[test]
    fn ready_target_can_be_replaced() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        ctl.on_embed_loaded(req.unwrap().generation);

        ctl.set_input("https://example.org");
        let next = ctl.submit(now).unwrap();
        assert_eq!(ctl.state().phase(), Phase::Loading);
        assert_eq!(ctl.state().target().unwrap().generation, next.generation);
    }

    #[test]
    fn one_entry_per_transition_in_order() {
        let now = Instant::now();
        let mut ctl = EmbedController::new();

        ctl.submit(now);
        ctl.set_input("bad");
        ctl.submit(now);
        ctl.set_input("https://example.com");
        let req = ctl.submit(now).unwrap();
        ctl.on_embed_loaded(req.generation);

        let severities: Vec<Severity> = ctl.log().entries().iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            [
                Severity::Info,
                Severity::Error,
                Severity::Error,
                Severity::Success,
                Severity::Success,
            ]
        );
    }

    #[test]
    fn apply_routes_host_outcomes() {
        let now = Instant::now();
        let (mut ctl, req) = submitted("https://example.com", now);
        let generation = req.unwrap().generation;

        ctl.apply(&HostEvent {
            generation,
            outcome: Outcome::Failed("connection refused".into()),
        });
        assert_eq!(ctl.state().phase(), Phase::Failed);

        ctl.set_input("https://example.com");
        let generation = ctl.submit(now).unwrap().generation;
        ctl.apply(&HostEvent {
            generation,
            outcome: Outcome::Loaded(Preview::default()),
        });
        assert_eq!(ctl.state().phase(), Phase::Ready);
    }

    #[test]
    fn custom_timeout_reported_in_message() {
        let now = Instant::now();
        let mut ctl = EmbedController::with_timeout(Duration::from_secs(2));
        ctl.set_input("https://example.com");
        ctl.submit(now);

        assert!(ctl.tick(now + Duration::from_secs(2)));
        assert!(tail(&ctl, 1)[0].1.contains("2 seconds"));
    }

    #[test]
    fn input_editing() {
        let mut ctl = EmbedController::new();
        for c in "http://x".chars() {
            ctl.push_char(c);
        }
        ctl.backspace();
        assert_eq!(ctl.state().raw_input(), "http://");
        ctl.clear_input();
        assert_eq!(ctl.state().raw_input(), "");
    }
}
