use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Mode};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        app.dirty = true;
        return;
    }

    // If the detail overlay is shown, handle overlay-specific keys
    if app.show_detail {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.go_back();
            }
            // Allow scrolling through rows while the overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            _ => {}
        }
        return;
    }

    match app.mode {
        Mode::Search => handle_search_input(app, key),
        Mode::EditInterval => handle_interval_input(app, key, now),
        Mode::Normal => handle_normal_input(app, key),
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Enter detail overlay
        KeyCode::Enter => app.enter_detail(),

        // Go back
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Track a new entity
        KeyCode::Char('a') | KeyCode::Char('/') => app.start_search(),

        // Stop tracking the selected entity
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),

        // Toggle realtime/batch mode
        KeyCode::Char('t') | KeyCode::Char(' ') => app.toggle_realtime_selected(),

        // Edit the batch interval
        KeyCode::Char('i') => app.start_interval_edit(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle key input while the candidate search is active
fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Track the highlighted candidate
        KeyCode::Enter => app.add_selected_candidate(),

        // Cancel
        KeyCode::Esc => app.cancel_search(),

        // Move through candidates
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),

        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.cancel_search();
        }

        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) => app.search_push(c),

        _ => {}
    }
}

/// Handle key input while the interval editor is active
fn handle_interval_input(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        // Confirm; the debounced commit stays armed
        KeyCode::Enter => app.finish_interval_edit(),

        // Cancel and discard the uncommitted edit
        KeyCode::Esc => app.cancel_interval_edit(),

        KeyCode::Backspace => app.interval_pop(now),
        KeyCode::Char(c) => app.interval_push(c, now),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendHandle;
    use crate::source::{ChannelSource, StateSnapshot};
    use crossterm::event::KeyEventState;

    fn test_app() -> App {
        let (_tx, source) = ChannelSource::create("test");
        let (handle, _endpoint) = BackendHandle::pair();
        let mut app = App::new(Box::new(source), handle);
        app.snapshot = StateSnapshot::default();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_q_quits_in_normal_mode() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('q')), Instant::now());
        assert!(!app.running);
    }

    #[test]
    fn test_q_types_into_search_query() {
        let mut app = test_app();
        app.start_search();
        handle_key_event(&mut app, key(KeyCode::Char('q')), Instant::now());
        assert!(app.running);
        assert_eq!(app.search_query, "q");
    }

    #[test]
    fn test_escape_cancels_search() {
        let mut app = test_app();
        app.start_search();
        handle_key_event(&mut app, key(KeyCode::Esc), Instant::now());
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_any_key_closes_help() {
        let mut app = test_app();
        app.toggle_help();
        handle_key_event(&mut app, key(KeyCode::Char('x')), Instant::now());
        assert!(!app.show_help);
        assert!(app.running);
    }
}
