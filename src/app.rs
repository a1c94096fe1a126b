//! App: terminal init, frame loop, key handling and auto-repeat.

use crate::game::{Command, Game, Status};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, LineClearFlash};
use crate::{Args, GameConfig};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding. 50 ms ≈ 20 moves/sec.
const REPEAT_INTERVAL_MS: u64 = 50;

pub struct App {
    args: Args,
    theme: Theme,
    game: Game,
    flash: LineClearFlash,
    /// Wall-clock time of the previous frame, for gravity deltas.
    last_frame: Instant,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Self {
        let game = Game::new(&config, crate::sound::sink_for(args.sound));
        Self {
            args,
            theme,
            game,
            flash: LineClearFlash::default(),
            last_frame: Instant::now(),
            repeat_state: None,
            last_repeat_fire: None,
        }
    }

    /// Apply a key action. Returns false when the app should exit.
    fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::Start => {
                self.game.start();
                self.flash = LineClearFlash::default();
                self.repeat_state = None;
            }
            Action::HardDrop => {
                self.game.apply(Command::HardDrop);
                self.repeat_state = None;
            }
            other => {
                if let Some(command) = other.command() {
                    self.game.apply(command);
                }
            }
        }
        let cleared = self.game.take_cleared_rows();
        if !cleared.is_empty() {
            self.flash.start(cleared);
        }
        true
    }

    fn tick_repeat(&mut self, now: Instant) {
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        if now.saturating_duration_since(first) < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next = self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events let held keys stop repeating; not every terminal supports them.
        let enhanced = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok();
        if !enhanced {
            log::debug!("keyboard enhancement unavailable; key auto-repeat disabled");
        }

        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        if self.args.autostart {
            self.apply_action(Action::Start);
        }
        let result = self.run_loop(&mut terminal, enhanced);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal, repeat_keys: bool) -> Result<()> {
        let frame_duration = Duration::try_from_secs_f64(1.0 / self.args.frame_rate)
            .with_context(|| format!("unusable frame rate {}", self.args.frame_rate))?;
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;

            if self.game.status() == Status::Running {
                self.tick_repeat(now);
                self.game.tick(delta);
                let cleared = self.game.take_cleared_rows();
                if !cleared.is_empty() {
                    self.flash.start(cleared);
                }
            } else {
                self.repeat_state = None;
            }

            terminal.draw(|f| ui::draw(f, &self.game, &self.theme, &mut self.flash, now))?;
            self.flash.finish_if_done();

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                let action = key_to_action(key);

                if key.kind != KeyEventKind::Press {
                    if key.kind == KeyEventKind::Release
                        && self.repeat_state.map(|(a, _)| a) == Some(action)
                    {
                        self.repeat_state = None;
                        self.last_repeat_fire = None;
                    }
                    continue;
                }
                // Already repeating this action ourselves: ignore the OS repeat.
                if self.repeat_state.map(|(a, _)| a) == Some(action) {
                    continue;
                }

                if !self.apply_action(action) {
                    return Ok(());
                }
                if repeat_keys && action.repeats() && self.game.status() == Status::Running {
                    self.repeat_state = Some((action, Instant::now()));
                    self.last_repeat_fire = None;
                }
            }
        }
    }
}
