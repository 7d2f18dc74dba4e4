//! App: terminal init, main loop, tick and key handling.

use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::GameConfig;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tachyonfx::Effect;

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding. 50 ms ≈ 20 moves/sec.
const REPEAT_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    /// Rows being flashed since the most recent lock. Empty when idle.
    flash_rows: Vec<usize>,
    /// TachyonFX fade effect for line-clear (created when animation starts).
    line_clear_effect: Option<Effect>,
    /// Last time we processed the line-clear effect (for delta).
    line_clear_effect_process_time: Option<Instant>,
}

/// Explicit seed when given, otherwise derived from the wall clock.
fn derive_seed(config: &GameConfig) -> u32 {
    config.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(1)
    })
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let seed = derive_seed(&config);
        let state = GameState::new(&config, seed);
        Self {
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            last_tick: Instant::now(),
            repeat_state: None,
            last_repeat_fire: None,
            flash_rows: Vec::new(),
            line_clear_effect: None,
            line_clear_effect_process_time: None,
        }
    }

    fn reset_game(&mut self) {
        let seed = derive_seed(&self.config);
        self.state = GameState::new(&self.config, seed);
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_tick = Instant::now();
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.flash_rows.clear();
        self.line_clear_effect = None;
        self.line_clear_effect_process_time = None;
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::MoveLeft => self.state.move_left(),
            Action::MoveRight => self.state.move_right(),
            Action::SoftDrop => self.state.soft_drop(),
            Action::Rotate => self.state.rotate(),
            Action::Pause | Action::Quit | Action::None => {}
        }
        self.after_simulation();
    }

    /// Pick up rows removed by the last lock and hand the game-over
    /// transition to the screen state.
    fn after_simulation(&mut self) {
        let cleared = self.state.take_cleared_rows();
        if !cleared.is_empty() {
            self.flash_rows = cleared;
            self.line_clear_effect = None;
            self.line_clear_effect_process_time = None;
        }
        if self.state.game_over {
            self.screen = Screen::GameOver;
            self.repeat_state = None;
        }
    }

    fn tick_repeat(&mut self) {
        let now = Instant::now();
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        if first.elapsed() < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next =
            self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Attempt to enable enhanced keyboard for Release events
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    f.area(),
                    &self.flash_rows,
                    &mut self.line_clear_effect,
                    &mut self.line_clear_effect_process_time,
                    now,
                    self.config.no_animation,
                )
            })?;

            if !self.flash_rows.is_empty()
                && (self.config.no_animation
                    || self.line_clear_effect.as_ref().is_some_and(|e| e.done()))
            {
                self.flash_rows.clear();
                self.line_clear_effect = None;
                self.line_clear_effect_process_time = None;
            }

            // Limit event polling to hit ~60 FPS rendering (16ms)
            let frame_duration = Duration::from_millis(16);
            let timeout = frame_duration.saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let action = key_to_action(key);

                        // Ignore OS repeats; DAS/ARR below handles held keys.
                        if key.kind != KeyEventKind::Press {
                            if key.kind == KeyEventKind::Release
                                && self.repeat_state.map(|(a, _)| a) == Some(action)
                            {
                                self.repeat_state = None;
                                self.last_repeat_fire = None;
                            }
                            continue;
                        }
                        if self.repeat_state.map(|(a, _)| a) == Some(action) {
                            continue;
                        }

                        match self.screen {
                            Screen::Playing => {
                                if self.paused {
                                    match action {
                                        Action::Pause => self.paused = false,
                                        Action::Quit => return Ok(()),
                                        _ => {}
                                    }
                                } else {
                                    match action {
                                        Action::Quit => return Ok(()),
                                        Action::Pause => self.paused = true,
                                        Action::None => {}
                                        _ => {
                                            self.apply_action(action);
                                            if matches!(
                                                action,
                                                Action::MoveLeft
                                                    | Action::MoveRight
                                                    | Action::SoftDrop
                                            ) {
                                                self.repeat_state =
                                                    Some((action, Instant::now()));
                                                self.last_repeat_fire = None;
                                            }
                                        }
                                    }
                                }
                            }
                            Screen::GameOver => {
                                if action == Action::Quit {
                                    return Ok(());
                                }
                                if matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R')) {
                                    self.reset_game();
                                }
                            }
                        }
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.tick_repeat();
                // tick_interval is re-read every frame; a mid-game speed-up
                // reschedules the next gravity step, it never queues extras.
                if self.last_tick.elapsed() >= self.state.tick_interval {
                    self.last_tick = Instant::now();
                    self.state.step_down();
                    self.after_simulation();
                }
            }
        }
    }
}
