//! Application loop and key routing.
//!
//! All controller mutation happens here, on one thread: key presses, host
//! outcomes drained from the channel, and watchdog ticks.

use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::config::Config;
use crate::embed::EmbedController;
use crate::host::{EmbedHost, HttpHost};

use super::screen::EmbedScreen;

/// Redraw interval while something is animating.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Idle poll interval; host events are drained at least this often.
const IDLE_INTERVAL: Duration = Duration::from_millis(250);

/// Runs the TUI event loop until the user quits.
pub fn run(config: &Config, initial_url: Option<String>) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, config, initial_url);
    ratatui::restore();
    result
}

/// What a key press asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Submit,
    Handled,
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    config: &Config,
    initial_url: Option<String>,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut host = HttpHost::new(config, tx);
    let mut screen = EmbedScreen::new(EmbedController::new());

    if let Some(url) = initial_url {
        screen.set_input(url);
        submit(&mut screen, &mut host);
    }

    loop {
        terminal.draw(|frame| screen.render(frame))?;

        let now = Instant::now();
        if event::poll(poll_timeout(&screen, now))? {
            if let Event::Key(key) = event::read()? {
                match on_key(&mut screen, key) {
                    KeyAction::Quit => return Ok(()),
                    KeyAction::Submit => submit(&mut screen, &mut host),
                    KeyAction::Handled => {}
                }
            }
        }

        while let Ok(event) = rx.try_recv() {
            screen.on_host_event(event);
        }
        screen.tick(Instant::now());
    }
}

fn submit(screen: &mut EmbedScreen, host: &mut impl EmbedHost) {
    if let Some(request) = screen.submit(Instant::now()) {
        host.load(request);
    }
}

/// How long to block on terminal input before checking the host and watchdog.
fn poll_timeout(screen: &EmbedScreen, now: Instant) -> Duration {
    let base = if screen.is_animating() {
        FRAME_INTERVAL
    } else {
        IDLE_INTERVAL
    };
    match screen.deadline() {
        Some(deadline) => base.min(deadline.saturating_duration_since(now)),
        None => base,
    }
}

fn on_key(screen: &mut EmbedScreen, key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Handled;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => return KeyAction::Quit,
        KeyCode::Enter => return KeyAction::Submit,
        KeyCode::Char(c) if !ctrl => screen.on_char(c),
        KeyCode::Backspace => screen.on_backspace(),
        KeyCode::Esc => screen.on_clear(),
        KeyCode::Up => screen.on_scroll_up(),
        KeyCode::Down => screen.on_scroll_down(),
        _ => {}
    }
    KeyAction::Handled
}
