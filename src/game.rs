//! Game state: grid, pending-number queue, scroll, spawn, matching, speed-up.

use crate::config::{ConfigError, GameConfig};
use crate::grid::{Cell, Grid};
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Digit keys 0..=9. Index = digit.
pub const DIGIT_KEYS: usize = 10;

/// Held state of each digit key, sampled once per frame.
pub type HeldKeys = [bool; DIGIT_KEYS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    /// A token reached the wall. Terminal.
    Over,
}

/// What happened during one tick; the app logs these and animates matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Scrolled,
    Spawned { value: u8, row: usize },
    Matched { value: u8, x: usize, y: usize, score: u32 },
    /// Digit pressed that is not the oldest pending number.
    Missed { digit: u8 },
    SpedUp { tick_threshold: u32 },
    Over { score: u32 },
}

/// Turns level-triggered key state into rising edges.
#[derive(Debug, Clone, Default)]
pub struct DigitEdges {
    prev: HeldKeys,
}

impl DigitEdges {
    /// Digits that went from released to held since the previous call, ascending.
    pub fn update(&mut self, held: &HeldKeys) -> Vec<u8> {
        let rising = (0..DIGIT_KEYS)
            .filter(|&d| held[d] && !self.prev[d])
            .map(|d| d as u8)
            .collect();
        self.prev = *held;
        rising
    }
}

/// Decides whether a scroll step introduces a token, and where.
#[derive(Debug, Clone)]
pub struct Spawner {
    spawn_chance: f64,
}

impl Spawner {
    pub fn new(spawn_chance: f64) -> Self {
        Self { spawn_chance }
    }

    /// Value in 1..=9 and an interior row, or `None` when this step is skipped.
    pub fn maybe_spawn(&self, rng: &mut impl Rng, grid: &Grid) -> Option<(u8, usize)> {
        if self.spawn_chance < 1.0 && !rng.gen_bool(self.spawn_chance) {
            return None;
        }
        let value = rng.gen_range(1..=9u8);
        let row = rng.gen_range(grid.interior_rows());
        Some((value, row))
    }
}

/// Move every token one column left. Returns `true` (and leaves the grid alone) when a
/// token already sits in the leftmost playable column: the step would push it into the wall.
pub fn scroll(grid: &mut Grid) -> bool {
    let wall_col = grid.wall_column();
    let breached = grid
        .interior_rows()
        .any(|y| grid.get(wall_col, y).is_some_and(|c| !c.is_empty()));
    if breached {
        return true;
    }
    for y in grid.interior_rows() {
        grid.shift_row_left(y);
    }
    false
}

/// Read-only view handed to the renderer each frame.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub score: u32,
    pub tick_threshold: u32,
    pub pending: usize,
    pub phase: Phase,
}

/// Everything one game needs. Owned by the app; single writer.
#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    grid: Grid,
    /// Spawned, not yet matched. Front = oldest.
    queue: VecDeque<u8>,
    spawner: Spawner,
    rng: StdRng,
    edges: DigitEdges,
    score: u32,
    tick_threshold: u32,
    /// In [0, tick_threshold). Starts one short so the first tick scrolls and spawns.
    tick_counter: u32,
    ticks: u64,
    phase: Phase,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height)?;
        Ok(Self {
            config: config.clone(),
            grid,
            queue: VecDeque::new(),
            spawner: Spawner::new(config.spawn_chance),
            rng: StdRng::seed_from_u64(config.seed),
            edges: DigitEdges::default(),
            score: 0,
            tick_threshold: config.tick_threshold,
            tick_counter: config.tick_threshold - 1,
            ticks: 0,
            phase: Phase::Running,
        })
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn tick_threshold(&self) -> u32 {
        self.tick_threshold
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    /// Ticks elapsed while running.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_front(&self) -> Option<u8> {
        self.queue.front().copied()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: &self.grid,
            score: self.score(),
            tick_threshold: self.tick_threshold(),
            pending: self.pending(),
            phase: self.phase,
        }
    }

    /// Advance one tick: maybe scroll+spawn, then resolve fresh key presses.
    pub fn tick(&mut self, held: &HeldKeys) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }
        self.ticks += 1;
        self.tick_counter += 1;
        if self.tick_counter >= self.tick_threshold {
            self.tick_counter = 0;
            self.step(&mut events);
        }

        // Edge state follows the keys even after a loss so nothing fires late.
        let pressed = self.edges.update(held);
        if !self.is_over() {
            for digit in pressed {
                self.on_digit_pressed(digit, &mut events);
            }
        }
        events
    }

    /// One scroll step followed by a spawn.
    fn step(&mut self, events: &mut Vec<GameEvent>) {
        if scroll(&mut self.grid) {
            self.phase = Phase::Over;
            events.push(GameEvent::Over { score: self.score });
            return;
        }
        events.push(GameEvent::Scrolled);

        if let Some((value, row)) = self.spawner.maybe_spawn(&mut self.rng, &self.grid) {
            let x = self.grid.spawn_column();
            debug_assert!(self.grid.get(x, row).is_some_and(Cell::is_empty));
            self.grid.set(x, row, Cell::Digit(value));
            self.queue.push_back(value);
            events.push(GameEvent::Spawned { value, row });
        }
        debug_assert_eq!(self.grid.digits().count(), self.queue.len());
    }

    /// Resolve a fresh press of `digit`. Only the oldest pending number matches.
    pub fn on_digit_pressed(&mut self, digit: u8, events: &mut Vec<GameEvent>) {
        let Some(front) = self.queue_front() else {
            return;
        };
        if digit != front {
            events.push(GameEvent::Missed { digit });
            return;
        }

        // One token per column, all moving together: the leftmost `digit` is the front token.
        let Some((x, y)) = self.grid.first_digit(digit) else {
            // Tokens only leave the grid through a match or the wall, and the wall ends the game.
            warn!("pending {} not found on the field", digit);
            return;
        };
        self.grid.set(x, y, Cell::Empty);
        self.queue.pop_front();

        let previous = self.score;
        self.score = self.score.saturating_add(self.config.reward);
        events.push(GameEvent::Matched {
            value: digit,
            x,
            y,
            score: self.score,
        });

        let every = self.config.speedup_every;
        let crossed = self.score / every - previous / every;
        if crossed > 0 && self.speed_up(crossed) {
            events.push(GameEvent::SpedUp {
                tick_threshold: self.tick_threshold,
            });
        }
    }

    /// Lower the threshold `times` steps, never past the floor. Returns whether it changed.
    fn speed_up(&mut self, times: u32) -> bool {
        let before = self.tick_threshold;
        for _ in 0..times {
            self.tick_threshold = self
                .tick_threshold
                .saturating_sub(self.config.speedup_step)
                .max(self.config.min_tick_threshold);
        }
        if self.tick_counter >= self.tick_threshold {
            self.tick_counter = self.tick_threshold - 1;
        }
        self.tick_threshold != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_KEYS: HeldKeys = [false; DIGIT_KEYS];

    fn held(digit: u8) -> HeldKeys {
        let mut keys = NO_KEYS;
        keys[digit as usize] = true;
        keys
    }

    fn state_with(config: GameConfig) -> GameState {
        GameState::new(&config).unwrap()
    }

    /// Put a token on the field and queue it, bypassing the spawner.
    fn place(state: &mut GameState, x: usize, y: usize, value: u8) {
        assert!(state.grid.set(x, y, Cell::Digit(value)));
        state.queue.push_back(value);
    }

    fn press(state: &mut GameState, digit: u8) -> Vec<GameEvent> {
        let mut events = Vec::new();
        state.on_digit_pressed(digit, &mut events);
        events
    }

    fn assert_border_intact(grid: &Grid) {
        for y in 0..grid.height {
            for x in 0..grid.width {
                if grid.is_border(x, y) {
                    assert_eq!(grid.get(x, y), Some(Cell::Wall), "border ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_first_tick_spawns_in_rightmost_column() {
        let mut state = state_with(GameConfig::default());
        let events = state.tick(&NO_KEYS);
        let (value, row) = events
            .iter()
            .find_map(|e| match e {
                GameEvent::Spawned { value, row } => Some((*value, *row)),
                _ => None,
            })
            .expect("first tick spawns");
        assert!((1..=9).contains(&value));
        assert!(state.grid.interior_rows().contains(&row));
        assert_eq!(
            state.grid.get(state.grid.spawn_column(), row),
            Some(Cell::Digit(value))
        );
        assert_eq!(state.queue_front(), Some(value));
        assert_eq!(state.pending(), 1);
    }

    #[test]
    fn test_match_scenario_with_debounce() {
        // 25x8 field = 23x6 interior, threshold 40, reward 25.
        let mut state = state_with(GameConfig::default());
        state.tick(&NO_KEYS);
        let spawn_col = state.grid.spawn_column();
        let value = state.queue_front().unwrap();
        let (_, row, _) = state.grid.digits().next().unwrap();

        for _ in 0..39 {
            state.tick(&NO_KEYS);
        }
        assert_eq!(state.grid.get(spawn_col, row), Some(Cell::Digit(value)));
        state.tick(&NO_KEYS);
        assert_eq!(state.grid.get(spawn_col - 1, row), Some(Cell::Digit(value)));
        assert_eq!(state.pending(), 2);

        let events = state.tick(&held(value));
        assert!(events.contains(&GameEvent::Matched {
            value,
            x: spawn_col - 1,
            y: row,
            score: 25
        }));
        assert_eq!(state.score(), 25);
        assert_eq!(state.grid.get(spawn_col - 1, row), Some(Cell::Empty));
        assert_eq!(state.pending(), 1);

        // Still holding: no further matches even if the next token has the same value.
        for _ in 0..40 {
            state.tick(&held(value));
        }
        assert_eq!(state.score(), 25);
    }

    #[test]
    fn test_release_and_press_again_matches_repeat_digit() {
        let mut state = state_with(GameConfig {
            tick_threshold: 1000,
            ..GameConfig::default()
        });
        state.tick_counter = 0;
        place(&mut state, 3, 2, 4);
        place(&mut state, 6, 1, 4);

        state.tick(&held(4));
        state.tick(&held(4));
        assert_eq!(state.score(), 25);
        state.tick(&NO_KEYS);
        state.tick(&held(4));
        assert_eq!(state.score(), 50);
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn test_wrong_digit_is_a_miss() {
        let mut state = state_with(GameConfig::default());
        place(&mut state, 5, 2, 3);
        place(&mut state, 6, 3, 8);
        let events = press(&mut state, 8);
        assert_eq!(events, vec![GameEvent::Missed { digit: 8 }]);
        assert_eq!(state.score(), 0);
        assert_eq!(state.pending(), 2);
        assert_eq!(state.grid.get(6, 3), Some(Cell::Digit(8)));
    }

    #[test]
    fn test_press_with_empty_queue_is_noop() {
        let mut state = state_with(GameConfig::default());
        assert!(press(&mut state, 5).is_empty());
        assert!(press(&mut state, 0).is_empty());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_match_clears_oldest_duplicate() {
        let mut state = state_with(GameConfig::default());
        place(&mut state, 3, 4, 6);
        place(&mut state, 4, 1, 2);
        place(&mut state, 5, 1, 6);
        press(&mut state, 6);
        assert_eq!(state.grid.get(3, 4), Some(Cell::Empty));
        assert_eq!(state.grid.get(5, 1), Some(Cell::Digit(6)));
        assert_eq!(state.queue_front(), Some(2));
    }

    #[test]
    fn test_speedup_every_hundred_points() {
        let mut state = state_with(GameConfig::default());
        for i in 1..=8u32 {
            place(&mut state, 10, 3, 7);
            press(&mut state, 7);
            match i {
                1..=3 => assert_eq!(state.tick_threshold(), 40),
                4..=7 => assert_eq!(state.tick_threshold(), 38),
                _ => assert_eq!(state.tick_threshold(), 36),
            }
        }
        assert_eq!(state.score(), 200);
    }

    #[test]
    fn test_speedup_event_emitted_once_per_change() {
        let mut state = state_with(GameConfig::default());
        let mut sped_up = 0;
        for _ in 0..4 {
            place(&mut state, 10, 3, 1);
            sped_up += press(&mut state, 1)
                .iter()
                .filter(|e| matches!(e, GameEvent::SpedUp { tick_threshold: 38 }))
                .count();
        }
        assert_eq!(sped_up, 1);
    }

    #[test]
    fn test_speedup_respects_floor() {
        let mut state = state_with(GameConfig {
            tick_threshold: 10,
            min_tick_threshold: 5,
            speedup_step: 3,
            ..GameConfig::default()
        });
        for _ in 0..100 {
            place(&mut state, 10, 3, 9);
            press(&mut state, 9);
            assert!(state.tick_threshold() >= 5);
        }
        assert_eq!(state.tick_threshold(), 5);
    }

    #[test]
    fn test_large_reward_crosses_several_multiples() {
        let mut state = state_with(GameConfig {
            reward: 250,
            ..GameConfig::default()
        });
        place(&mut state, 10, 3, 2);
        press(&mut state, 2);
        assert_eq!(state.tick_threshold(), 36);
    }

    #[test]
    fn test_scroll_shifts_by_one_column() {
        let mut state = state_with(GameConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        let spawner = Spawner::new(1.0);
        for x in 2..state.grid.width - 1 {
            if let Some((value, row)) = spawner.maybe_spawn(&mut rng, &state.grid) {
                state.grid.set(x, row, Cell::Digit(value));
            }
        }
        let before = state.grid.clone();
        assert!(!scroll(&mut state.grid));

        let spawn_col = state.grid.spawn_column();
        for y in state.grid.interior_rows() {
            for x in 1..spawn_col {
                assert_eq!(state.grid.get(x, y), before.get(x + 1, y));
            }
            assert_eq!(state.grid.get(spawn_col, y), Some(Cell::Empty));
        }
        assert_border_intact(&state.grid);
    }

    #[test]
    fn test_scroll_detects_wall_before_writing() {
        let mut grid = Grid::new(8, 5).unwrap();
        grid.set(1, 3, Cell::Digit(4));
        grid.set(5, 2, Cell::Digit(9));
        let before = grid.clone();
        assert!(scroll(&mut grid));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_token_next_to_wall_column_is_not_a_loss() {
        let mut grid = Grid::new(8, 5).unwrap();
        grid.set(2, 1, Cell::Digit(4));
        assert!(!scroll(&mut grid));
        assert_eq!(grid.get(1, 1), Some(Cell::Digit(4)));
        assert!(scroll(&mut grid));
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut state = state_with(GameConfig {
            width: 5,
            height: 3,
            tick_threshold: 1,
            min_tick_threshold: 1,
            ..GameConfig::default()
        });
        let mut over_events = 0;
        for _ in 0..20 {
            over_events += state
                .tick(&NO_KEYS)
                .iter()
                .filter(|e| matches!(e, GameEvent::Over { .. }))
                .count();
        }
        assert!(state.is_over());
        assert_eq!(over_events, 1);
        // Three spawns walk across a 3-wide interior, the fourth step hits the wall.
        assert_eq!(state.ticks(), 4);

        let grid = state.grid.clone();
        assert!(state.tick(&held(1)).is_empty());
        assert_eq!(state.grid, grid);
        assert_eq!(state.ticks(), 4);
    }

    #[test]
    fn test_spawner_respects_chance() {
        let grid = Grid::new(10, 6).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let spawner = Spawner::new(0.5);
        let spawned = (0..400)
            .filter_map(|_| spawner.maybe_spawn(&mut rng, &grid))
            .inspect(|&(value, row)| {
                assert!((1..=9).contains(&value));
                assert!((1..5).contains(&row));
            })
            .count();
        assert!(spawned > 100 && spawned < 300, "spawned {}", spawned);
    }

    #[test]
    fn test_digit_edges() {
        let mut edges = DigitEdges::default();
        assert_eq!(edges.update(&held(3)), vec![3]);
        assert!(edges.update(&held(3)).is_empty());
        let mut both = held(3);
        both[1] = true;
        assert_eq!(edges.update(&both), vec![1]);
        assert!(edges.update(&NO_KEYS).is_empty());
        assert_eq!(edges.update(&both), vec![1, 3]);
    }

    /// Cycles through digits with a release frame between presses.
    fn scripted_keys(tick: u64) -> HeldKeys {
        if tick % 3 == 0 {
            NO_KEYS
        } else {
            held(((tick / 3) % 10) as u8)
        }
    }

    #[test]
    fn test_invariants_hold_through_a_game() {
        let mut state = state_with(GameConfig {
            tick_threshold: 3,
            min_tick_threshold: 1,
            seed: 99,
            ..GameConfig::default()
        });
        for _ in 0..5_000 {
            let keys = scripted_keys(state.ticks());
            state.tick(&keys);
            assert_border_intact(&state.grid);
            assert!(state.tick_threshold() >= 1);
            assert!(state.tick_counter < state.tick_threshold());
            if state.is_over() {
                break;
            }
            if let Some(front) = state.queue_front() {
                assert!(state.grid.first_digit(front).is_some());
            }
            assert_eq!(state.grid.digits().count(), state.pending());
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let config = GameConfig {
            tick_threshold: 2,
            min_tick_threshold: 1,
            seed: 1234,
            ..GameConfig::default()
        };
        let run = || {
            let mut state = state_with(config.clone());
            let mut frames = Vec::new();
            while !state.is_over() && state.ticks() < 10_000 {
                let keys = scripted_keys(state.ticks());
                state.tick(&keys);
                frames.push((state.grid.clone(), state.score()));
            }
            (frames, state.ticks())
        };
        let (a, over_a) = run();
        let (b, over_b) = run();
        assert!(over_a < 10_000, "game never ended");
        assert_eq!(over_a, over_b);
        assert_eq!(a, b);
    }
}
