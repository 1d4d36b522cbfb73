//! The embed screen: input line, preview panel, and activity log.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::activity::{ActivityLog, Severity};
use crate::embed::{EmbedController, LoadRequest, Phase, validate};
use crate::host::{HostEvent, Outcome, Preview, printable};

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Shown under the error panel. The host cannot say which one applied.
const FAILURE_CAUSES: &[&str] = &[
    "The site does not allow being embedded (X-Frame-Options / frame-ancestors)",
    "Cross-origin or security policy restrictions",
    "The page does not exist or is unreachable",
    "The content took too long to load",
];

/// Rows given to the log panel, borders included.
const LOG_HEIGHT: u16 = 12;

/// Log entries visible at once inside the panel borders.
const LOG_ROWS: usize = LOG_HEIGHT as usize - 2;

pub struct EmbedScreen {
    controller: EmbedController,
    /// Preview for the current target, set once it has loaded.
    preview: Option<Preview>,
    spinner_frame: usize,
    /// Lines scrolled up from the log tail.
    log_scroll: usize,
}

impl EmbedScreen {
    pub fn new(controller: EmbedController) -> Self {
        Self {
            controller,
            preview: None,
            spinner_frame: 0,
            log_scroll: 0,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &EmbedController {
        &self.controller
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.controller.deadline()
    }

    pub fn is_animating(&self) -> bool {
        self.controller.state().phase() == Phase::Loading
    }

    // ── Input ──

    /// Replace the input, as when a URL is given on the command line.
    pub fn set_input(&mut self, raw: impl Into<String>) {
        self.controller.set_input(raw);
    }

    /// Handle a character being typed.
    pub fn on_char(&mut self, c: char) {
        self.controller.push_char(c);
    }

    /// Handle backspace.
    pub fn on_backspace(&mut self) {
        self.controller.backspace();
    }

    /// Handle escape: clear the input.
    pub fn on_clear(&mut self) {
        self.controller.clear_input();
    }

    /// Handle scroll up in the log. Stops once the oldest entry is on screen.
    pub fn on_scroll_up(&mut self) {
        let max = self.controller.log().len().saturating_sub(LOG_ROWS);
        self.log_scroll = (self.log_scroll + 1).min(max);
    }

    /// Handle scroll down in the log, back towards the tail.
    pub fn on_scroll_down(&mut self) {
        self.log_scroll = self.log_scroll.saturating_sub(1);
    }

    // ── Events ──

    pub fn submit(&mut self, now: Instant) -> Option<LoadRequest> {
        self.preview = None;
        self.log_scroll = 0;
        self.controller.submit(now)
    }

    pub fn on_host_event(&mut self, event: HostEvent) {
        self.controller.apply(&event);

        let current = self.controller.state().target().map(|t| t.generation);
        if let Outcome::Loaded(preview) = event.outcome {
            if current == Some(event.generation) && self.controller.state().phase() == Phase::Ready
            {
                self.preview = Some(preview);
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.controller.tick(now);
        if self.is_animating() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
        }
    }

    // ── Rendering ──

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Length(3),          // title
            Constraint::Length(3),          // input
            Constraint::Min(6),             // preview
            Constraint::Length(LOG_HEIGHT), // log
            Constraint::Length(1),          // help
        ])
        .split(frame.area());

        let title = Paragraph::new(Line::from(vec![Span::styled(
            "embedview",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )]))
        .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(title, chunks[0]);

        self.render_input(frame, chunks[1]);
        self.render_preview(frame, chunks[2]);
        self.render_log(frame, chunks[3]);

        let help = Paragraph::new(Line::from(vec![Span::styled(
            " ⏎ load  esc clear  ↑↓ scroll log  ctrl-c quit",
            Style::default().fg(Color::DarkGray),
        )]));
        frame.render_widget(help, chunks[4]);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let raw = self.controller.state().raw_input();
        let text_style = if raw.is_empty() || validate(raw) {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Yellow)
        };

        let line = if raw.is_empty() {
            Line::from(vec![
                Span::styled(" › ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled("https://example.com", Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(vec![
                Span::styled(" › ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(raw, text_style),
                Span::styled("█", Style::default().fg(Color::DarkGray)),
            ])
        };

        let input = Paragraph::new(line).block(Block::bordered().title(" URL to embed "));
        frame.render_widget(input, area);
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect) {
        let muted = Style::default().fg(Color::DarkGray);
        let state = self.controller.state();
        let block = Block::bordered().title(" Preview ").padding(Padding::horizontal(1));

        let lines: Vec<Line> = match (state.phase(), state.target()) {
            (Phase::Idle, _) | (_, None) => vec![Line::from(Span::styled(
                "Enter a valid URL and press Enter to see the preview",
                muted,
            ))],
            (Phase::Loading, Some(target)) => vec![Line::from(vec![
                Span::styled(
                    SPINNER[self.spinner_frame],
                    Style::default().fg(Color::Blue),
                ),
                Span::raw(" Loading "),
                Span::styled(target.url.to_string(), muted),
            ])],
            (Phase::Ready, Some(_)) => match &self.preview {
                Some(preview) => preview_lines(preview),
                None => vec![Line::from("Loaded.")],
            },
            (Phase::Failed, Some(target)) => failure_lines(target.url.as_str()),
        };

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Logs ").padding(Padding::horizontal(1));
        let visible = block.inner(area).height as usize;
        let lines = log_lines(self.controller.log(), visible, self.log_scroll);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn preview_lines(preview: &Preview) -> Vec<Line<'_>> {
    let muted = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::with_capacity(preview.lines.len() + 3);

    if let Some(title) = &preview.title {
        lines.push(Line::from(Span::styled(
            printable(title),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    let content_type = preview.content_type.as_deref().unwrap_or("unknown type");
    lines.push(Line::from(Span::styled(
        format!("{} · {content_type} · {}", preview.status, preview.final_url),
        muted,
    )));
    lines.push(Line::default());
    lines.extend(preview.lines.iter().map(|l| Line::from(printable(l))));
    lines
}

fn failure_lines(url: &str) -> Vec<Line<'static>> {
    let red = Style::default().fg(Color::Red);
    let muted = Style::default().fg(Color::Gray);

    let mut lines = vec![
        Line::from(Span::styled(
            "⚠ Could not load the embed",
            red.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!("Failed to load content from {url}"), red)),
        Line::default(),
        Line::from(Span::styled("Possible causes:", muted)),
    ];
    lines.extend(
        FAILURE_CAUSES
            .iter()
            .map(|cause| Line::from(Span::styled(format!("  • {cause}"), muted))),
    );
    lines
}

/// The `visible` log lines ending `scroll` entries above the tail.
fn log_lines(log: &ActivityLog, visible: usize, scroll: usize) -> Vec<Line<'_>> {
    if log.is_empty() {
        return vec![Line::from(Span::styled(
            "No log entries yet...",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let entries = log.entries();
    let end = entries.len().saturating_sub(scroll);
    let start = end.saturating_sub(visible);

    entries[start..end]
        .iter()
        .map(|entry| {
            let color = match entry.severity {
                Severity::Success => Color::Green,
                Severity::Error => Color::Red,
                Severity::Info => Color::Blue,
            };
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("[{}] ", entry.severity.label()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(entry.message.as_str(), Style::default().fg(color)),
            ])
        })
        .collect()
}
