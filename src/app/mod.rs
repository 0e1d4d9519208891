use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use ratatui::Terminal;
use time::Date;

use crate::catalog::{self, LicenseCatalog};
use crate::cli::local_today;
use crate::config::AppConfig;
use crate::ui;

pub mod state;

pub use state::{AppState, DetailsOverlay, OverlayState};

const PAGE_STEP: isize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    PageDown,
    PageUp,
    StartSearch,
    CycleFilter,
    CycleSort,
    ToggleDirection,
    ToggleKeys,
    ShowDetails,
    Reload,
}

pub struct App {
    pub config: Arc<AppConfig>,
    state: AppState,
    table_state: TableState,
    should_quit: bool,
    tick_rate: Duration,
    today_override: Option<Date>,
}

impl App {
    pub fn new(config: Arc<AppConfig>, catalog: LicenseCatalog, today_override: Option<Date>) -> Self {
        let today = today_override.unwrap_or_else(local_today);
        let view = config.view.to_view_state();
        let mut state = AppState::new(catalog, view, today);
        if let Some(date) = today_override {
            state.set_status_message(Some(format!("Evaluating expiry as of {date}")));
        }
        Self {
            config,
            state,
            table_state: TableState::default(),
            should_quit: false,
            tick_rate: Duration::from_millis(250),
            today_override,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.is_empty() {
                        self.table_state.select(None);
                    } else {
                        self.table_state.select(Some(self.state.selected));
                    }
                    ui::draw_app(frame, &self.state, &mut self.table_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.state.clear_status_message();

        if self.handle_overlay_key(key) {
            return;
        }

        if self.state.is_search_active() {
            match key.code {
                KeyCode::Esc => {
                    self.state.cancel_search();
                    self.state.set_status_message(Some("Search cleared"));
                    return;
                }
                KeyCode::Enter => {
                    self.state.finish_search();
                    return;
                }
                KeyCode::Backspace => {
                    self.state.pop_search_char();
                    return;
                }
                KeyCode::Char(ch) if !has_command_modifier(&key) => {
                    self.state.push_search_char(ch);
                    return;
                }
                _ => {}
            }
        }

        let plain = !has_command_modifier(&key);
        let action = match key.code {
            KeyCode::Char('q') if plain => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Reload)
            }
            KeyCode::Char('/') if plain => Some(Action::StartSearch),
            KeyCode::Char('f') if plain => Some(Action::CycleFilter),
            KeyCode::Char('s') if plain => Some(Action::CycleSort),
            KeyCode::Char('o') if plain => Some(Action::ToggleDirection),
            KeyCode::Char('v') if plain => Some(Action::ToggleKeys),
            KeyCode::Enter => Some(Action::ShowDetails),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::PageDown => self.state.move_selection(PAGE_STEP),
            Action::PageUp => self.state.move_selection(-PAGE_STEP),
            Action::StartSearch => {
                self.state.begin_search();
                self.state
                    .set_status_message(Some("Type to search • Enter keep • Esc clear"));
            }
            Action::CycleFilter => {
                let filter = self.state.cycle_filter();
                self.state
                    .set_status_message(Some(format!("Filter: {}", filter.label())));
            }
            Action::CycleSort => {
                let key = self.state.cycle_sort_key();
                self.state
                    .set_status_message(Some(format!("Sort by {}", key.label())));
            }
            Action::ToggleDirection => {
                let direction = self.state.toggle_direction();
                self.state
                    .set_status_message(Some(format!("Sort order: {direction}")));
            }
            Action::ToggleKeys => {
                let message = if self.state.toggle_keys() {
                    "License keys visible"
                } else {
                    "License keys hidden"
                };
                self.state.set_status_message(Some(message));
            }
            Action::ShowDetails => {
                if !self.state.open_details() {
                    self.state.set_status_message(Some("No license selected"));
                }
            }
            Action::Reload => self.handle_reload(),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay() {
            Some(OverlayState::Details(_)) => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                        self.state.close_overlay();
                    }
                    KeyCode::Char('v') if !has_command_modifier(&key) => {
                        self.handle_action(Action::ToggleKeys);
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn handle_reload(&mut self) {
        match catalog::load(&self.config.source) {
            Ok(catalog) => {
                let count = catalog.len();
                let origin = catalog.origin().describe();
                self.state.replace_catalog(catalog);
                tracing::info!(count, %origin, "reloaded license catalog");
                self.state.set_status_message(Some(format!(
                    "Reloaded {count} license(s) from {origin}"
                )));
            }
            Err(err) => {
                tracing::error!(?err, "failed to reload license catalog");
                self.state
                    .set_status_message(Some(format!("Reload failed: {err}")));
            }
        }
    }

    fn on_tick(&mut self) {
        if self.today_override.is_some() {
            return;
        }
        let today = local_today();
        if self.state.set_today(today) {
            tracing::info!(%today, "date changed, re-evaluating expiry");
        }
    }
}

fn has_command_modifier(key: &KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{FilterMode, SortDirection};
    use crossterm::event::KeyEventState;
    use time::macros::date;

    fn app() -> App {
        App::new(
            Arc::new(AppConfig::default()),
            LicenseCatalog::demo(),
            Some(date!(2024 - 06 - 01)),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
    }

    #[test]
    fn keys_drive_view_state() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.state().view.filter, FilterMode::ExpiringSoon);
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.state().view.direction, SortDirection::Descending);
        press(&mut app, KeyCode::Char('v'));
        assert!(app.state().view.show_keys);
        assert_eq!(
            app.state().status_message.as_deref(),
            Some("License keys visible")
        );
    }

    #[test]
    fn search_mode_captures_letters() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        for ch in "fig".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        // 'f' went into the search box rather than cycling the filter
        assert_eq!(app.state().search_term(), "fig");
        assert_eq!(app.state().view.filter, FilterMode::All);
        press(&mut app, KeyCode::Enter);
        assert!(!app.state().is_search_active());
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state().search_term(), "");
    }

    #[test]
    fn details_overlay_opens_and_closes() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.state().details_record().map(|r| r.id.as_str()),
            Some("2")
        );
        press(&mut app, KeyCode::Char('j'));
        // navigation is swallowed while the overlay is open
        assert_eq!(app.state().selected, 1);
        press(&mut app, KeyCode::Esc);
        assert!(app.state().overlay().is_none());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn reload_replaces_catalog_from_source() {
        let mut app = app();
        app.handle_action(Action::Reload);
        assert_eq!(app.state().catalog.len(), 4);
        assert_eq!(
            app.state().status_message.as_deref(),
            Some("Reloaded 4 license(s) from demo data")
        );
    }
}
