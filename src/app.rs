//! App: terminal init, fixed-rate main loop, key handling, restart.

use crate::AppOptions;
use crate::config::GameConfig;
use crate::game::{GameEvent, GameState};
use crate::input::{Action, KeyTracker, key_to_action};
use crate::theme::Theme;
use crate::ui::MatchFade;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::{debug, info, trace};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// What the loop should do after a batch of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    options: AppOptions,
    state: GameState,
    screen: Screen,
    keys: KeyTracker,
    /// Recently cleared numbers, fading out.
    fades: Vec<MatchFade>,
    /// Start of the previous frame; `None` until the loop draws its first one.
    last_frame: Option<Instant>,
    /// Best score this session (not persisted).
    best: u32,
    games: u32,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, options: AppOptions) -> Result<Self> {
        let state = GameState::new(&config)?;
        Ok(Self {
            config,
            theme,
            options,
            state,
            screen: Screen::Playing,
            keys: KeyTracker::new(),
            fades: Vec::new(),
            last_frame: None,
            best: 0,
            games: 1,
        })
    }

    /// Start a fresh game with the next seed so restarts do not replay the same numbers.
    fn reset_game(&mut self) -> Result<()> {
        self.config.seed = self.config.seed.wrapping_add(1);
        self.state = GameState::new(&self.config)?;
        self.screen = Screen::Playing;
        self.keys.clear();
        self.fades.clear();
        self.games += 1;
        info!("game {} started (seed {})", self.games, self.config.seed);
        Ok(())
    }

    /// Run until the player quits. Returns the score of the last game.
    pub fn run(&mut self) -> Result<u32> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events make held keys exact; terminals without them fall back to a timeout.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        info!(
            "game 1 started: {}x{} field, {} ticks per step, seed {}",
            self.config.width, self.config.height, self.config.tick_threshold, self.config.seed
        );

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        result.map(|()| self.state.score())
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let frame_start = Instant::now();
            let elapsed = self.frame_elapsed(frame_start);

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    self.state.snapshot(),
                    &self.theme,
                    self.best,
                    &mut self.fades,
                    elapsed,
                );
            })?;
            self.fades.retain(|fade| !fade.done());

            // Handle input until this frame's time slice is used up.
            let deadline = frame_start + self.options.frame;
            while let Some(left) = deadline.checked_duration_since(Instant::now()) {
                if !event::poll(left)? {
                    break;
                }
                if self.drain_events()? == Flow::Quit {
                    return Ok(());
                }
            }

            if self.screen == Screen::Playing {
                let held = self.keys.held(Instant::now());
                let events = self.state.tick(&held);
                self.on_game_events(&events);
            }
        }
    }

    /// Time since the previous frame started. Zero for the first frame.
    fn frame_elapsed(&mut self, now: Instant) -> Duration {
        let elapsed = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_frame = Some(now);
        elapsed
    }

    fn drain_events(&mut self) -> Result<Flow> {
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            self.keys.handle(key, Instant::now());
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match (self.screen, key_to_action(key)) {
                (_, Action::Quit) => return Ok(Flow::Quit),
                (Screen::GameOver, Action::Restart) => self.reset_game()?,
                _ => {}
            }
        }
        Ok(Flow::Continue)
    }

    fn on_game_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::Scrolled => {}
                GameEvent::Spawned { value, row } => debug!("spawned {} in row {}", value, row),
                GameEvent::Matched { value, x, y, score } => {
                    debug!("matched {} at ({}, {}), score {}", value, x, y, score);
                    if !self.options.no_animation {
                        self.fades.push(MatchFade::new(x, y, value));
                    }
                }
                GameEvent::Missed { digit } => trace!("pressed {}, not the oldest number", digit),
                GameEvent::SpedUp { tick_threshold } => {
                    info!("speed up: {} ticks per step", tick_threshold);
                }
                GameEvent::Over { score } => {
                    info!("game over after {} ticks, score {}", self.state.ticks(), score);
                    self.best = self.best.max(score);
                    self.screen = Screen::GameOver;
                }
            }
        }
    }
}
