//! Game state: grid, current and next piece, counters, and the session state machine.

use crate::GameConfig;
use crate::collision::collides;
use crate::grid::Grid;
use crate::piece::{Piece, PieceSource};
use crate::rotation::rotate;
use crate::scoring::Progress;
use crate::sound::{SoundEvent, SoundSink};
use std::time::Duration;

/// Session lifecycle. `GameOver` is left only through `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    Running,
    Paused,
    GameOver,
}

/// Player input, already decoded from keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    TogglePause,
}

#[derive(Debug)]
pub struct Game {
    grid: Grid,
    current: Option<Piece>,
    /// Always present so the preview has something to show, even before the first start.
    next: Piece,
    source: PieceSource,
    progress: Progress,
    status: Status,
    /// Time accumulated toward the next gravity step.
    drop_counter: Duration,
    /// Rows that were full at the most recent lock, for the presentation layer.
    cleared_rows: Vec<usize>,
    sound: Box<dyn SoundSink>,
}

impl Game {
    pub fn new(config: &GameConfig, sound: Box<dyn SoundSink>) -> Self {
        let cols = config.width as usize;
        let mut source = PieceSource::new(config.randomizer, config.seed);
        let next = Piece::spawn(source.next_kind(), cols);
        Self {
            grid: Grid::new(cols, config.height as usize),
            current: None,
            next,
            source,
            progress: Progress::default(),
            status: Status::NotStarted,
            drop_counter: Duration::ZERO,
            cleared_rows: Vec::new(),
            sound,
        }
    }

    /// Reset grid and counters and spawn the first piece. Also restarts a running,
    /// paused or finished session.
    pub fn start(&mut self) {
        self.grid = Grid::new(self.grid.cols(), self.grid.rows());
        self.progress = Progress::default();
        self.drop_counter = Duration::ZERO;
        self.cleared_rows.clear();
        self.current = None;
        self.status = Status::Running;
        log::info!("game started ({}x{})", self.grid.cols(), self.grid.rows());
        self.notify(SoundEvent::GameStart);
        self.spawn();
    }

    /// Apply one input command. Piece commands only act while running;
    /// pause toggling only acts while running or paused.
    pub fn apply(&mut self, command: Command) {
        if command == Command::TogglePause {
            self.status = match self.status {
                Status::Running => Status::Paused,
                Status::Paused => Status::Running,
                _ => return,
            };
            self.notify(SoundEvent::Click);
            return;
        }
        if self.status != Status::Running {
            return;
        }
        match command {
            Command::MoveLeft => self.try_shift(-1),
            Command::MoveRight => self.try_shift(1),
            Command::SoftDrop => {
                self.step_down();
            }
            Command::HardDrop => self.hard_drop(),
            Command::Rotate => self.rotate(),
            Command::TogglePause => {}
        }
    }

    /// Advance the gravity clock by `delta`; moves the piece down once the
    /// accumulated time exceeds the drop interval.
    pub fn tick(&mut self, delta: Duration) {
        if self.status != Status::Running {
            return;
        }
        self.drop_counter += delta;
        if self.drop_counter > self.progress.drop_interval() {
            self.step_down();
        }
    }

    fn try_shift(&mut self, dx: i32) {
        if let Some(piece) = self.current {
            let moved = piece.shifted(dx, 0);
            if !collides(&moved, &self.grid) {
                self.current = Some(moved);
            }
        }
    }

    fn rotate(&mut self) {
        if let Some(piece) = self.current {
            if let Some(rotated) = rotate(&piece, &self.grid) {
                self.current = Some(rotated);
            }
        }
    }

    /// Move down one row, or lock when blocked. Returns true if the piece moved.
    fn step_down(&mut self) -> bool {
        self.drop_counter = Duration::ZERO;
        let Some(piece) = self.current else {
            return false;
        };
        let moved = piece.shifted(0, 1);
        if collides(&moved, &self.grid) {
            self.lock_and_spawn();
            false
        } else {
            self.current = Some(moved);
            true
        }
    }

    fn hard_drop(&mut self) {
        let Some(mut piece) = self.current else {
            return;
        };
        while !collides(&piece.shifted(0, 1), &self.grid) {
            piece = piece.shifted(0, 1);
        }
        self.current = Some(piece);
        self.lock_and_spawn();
        self.drop_counter = Duration::ZERO;
    }

    fn lock_and_spawn(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        self.grid.lock(&piece);
        self.cleared_rows = self.grid.full_rows();
        let cleared = self.grid.clear_full_rows();
        if cleared > 0 {
            let level_before = self.progress.level;
            let points = self.progress.record_clear(cleared);
            log::debug!(
                "cleared {cleared} line(s) for {points} points (score {}, lines {})",
                self.progress.score,
                self.progress.lines
            );
            if self.progress.level != level_before {
                log::debug!(
                    "level {} reached, drop interval {:?}",
                    self.progress.level,
                    self.progress.drop_interval()
                );
            }
            self.notify(SoundEvent::LineClear);
        }
        self.spawn();
    }

    /// Promote the next piece and draw a new one; a blocked spawn ends the game.
    fn spawn(&mut self) {
        let cols = self.grid.cols();
        let incoming = std::mem::replace(&mut self.next, Piece::spawn(self.source.next_kind(), cols));
        self.current = Some(incoming);
        if collides(&incoming, &self.grid) {
            self.status = Status::GameOver;
            log::info!(
                "game over: score {}, level {}, lines {}",
                self.progress.score,
                self.progress.level,
                self.progress.lines
            );
            self.notify(SoundEvent::GameOver);
        }
    }

    fn notify(&mut self, event: SoundEvent) {
        if let Err(e) = self.sound.play(event) {
            log::warn!("sound {event} failed: {e}");
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn current(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    #[inline]
    pub fn next(&self) -> &Piece {
        &self.next
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    #[inline]
    pub fn drop_interval(&self) -> Duration {
        self.progress.drop_interval()
    }

    /// Rows that were full when the last piece locked; empty once taken.
    pub fn take_cleared_rows(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.cleared_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Randomizer;
    use crate::grid::Cell;
    use crate::piece::TetrominoKind;
    use crate::sound::SoundError;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<SoundEvent>>>);

    impl Recorder {
        fn events(&self) -> Vec<SoundEvent> {
            self.0.borrow().clone()
        }
    }

    impl SoundSink for Recorder {
        fn play(&mut self, event: SoundEvent) -> Result<(), SoundError> {
            self.0.borrow_mut().push(event);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl SoundSink for Broken {
        fn play(&mut self, _event: SoundEvent) -> Result<(), SoundError> {
            Err(SoundError::Io(std::io::Error::other("no audio device")))
        }
    }

    impl Game {
        fn set_current(&mut self, piece: Piece) {
            self.current = Some(piece);
        }

        fn grid_mut(&mut self) -> &mut Grid {
            &mut self.grid
        }
    }

    fn config(seed: u64) -> GameConfig {
        GameConfig {
            width: 10,
            height: 20,
            seed: Some(seed),
            randomizer: Randomizer::Uniform,
        }
    }

    fn started(seed: u64) -> (Game, Recorder) {
        let rec = Recorder::default();
        let mut game = Game::new(&config(seed), Box::new(rec.clone()));
        game.start();
        (game, rec)
    }

    fn fill_row_except(grid: &mut Grid, row: usize, gaps: &[usize]) {
        for col in 0..grid.cols() {
            if !gaps.contains(&col) {
                grid.set(row, col, Cell::Block(1));
            }
        }
    }

    #[test]
    fn test_not_started_ignores_input() {
        let rec = Recorder::default();
        let mut game = Game::new(&config(1), Box::new(rec.clone()));
        assert_eq!(game.status(), Status::NotStarted);
        assert!(game.current().is_none());
        game.apply(Command::TogglePause);
        game.apply(Command::HardDrop);
        game.tick(Duration::from_secs(5));
        assert_eq!(game.status(), Status::NotStarted);
        assert_eq!(game.grid(), &Grid::new(10, 20));
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_start_promotes_preview_piece() {
        let rec = Recorder::default();
        let mut game = Game::new(&config(3), Box::new(rec.clone()));
        let preview = *game.next();
        game.start();
        assert_eq!(game.status(), Status::Running);
        assert_eq!(game.current(), Some(&preview));
        assert_eq!(preview.y, 0);
        assert_eq!(rec.events(), vec![SoundEvent::GameStart]);
    }

    #[test]
    fn test_o_piece_falls_to_floor_and_locks() {
        let (mut game, _) = started(1);
        game.set_current(Piece::spawn(TetrominoKind::O, 10));
        assert_eq!(game.current().map(|p| (p.x, p.y)), Some((4, 0)));
        for row in 1..=18 {
            game.apply(Command::SoftDrop);
            assert_eq!(game.current().map(|p| p.y), Some(row));
        }
        game.apply(Command::SoftDrop);
        for (row, col) in [(18, 4), (18, 5), (19, 4), (19, 5)] {
            assert_eq!(game.grid().get(row, col), Some(Cell::Block(2)));
        }
        assert_eq!(game.current().map(|p| p.y), Some(0));
        assert_eq!(game.status(), Status::Running);
    }

    #[test]
    fn test_blocked_moves_are_reverted() {
        let (mut game, _) = started(1);
        let o = Piece::new(TetrominoKind::O, 0, 0, 5);
        game.set_current(o);
        game.apply(Command::MoveLeft);
        assert_eq!(game.current(), Some(&o));
        game.apply(Command::MoveRight);
        assert_eq!(game.current(), Some(&o.shifted(1, 0)));
    }

    #[test]
    fn test_failed_rotation_leaves_piece_untouched() {
        let (mut game, _) = started(1);
        for row in 2..20 {
            fill_row_except(game.grid_mut(), row, &[0]);
        }
        // Flat I on row 1 above a nearly full stack: the vertical form and every kick collide.
        let i = Piece::new(TetrominoKind::I, 0, 3, 1);
        game.set_current(i);
        game.apply(Command::Rotate);
        assert_eq!(game.current(), Some(&i));
    }

    #[test]
    fn test_gravity_waits_for_interval() {
        let (mut game, _) = started(1);
        game.set_current(Piece::new(TetrominoKind::T, 0, 3, 0));
        game.tick(Duration::from_millis(600));
        game.tick(Duration::from_millis(400));
        assert_eq!(game.current().map(|p| p.y), Some(0));
        game.tick(Duration::from_millis(1));
        assert_eq!(game.current().map(|p| p.y), Some(1));
        // Counter restarted after the step.
        game.tick(Duration::from_millis(999));
        assert_eq!(game.current().map(|p| p.y), Some(1));
    }

    #[test]
    fn test_soft_drop_restarts_gravity_clock() {
        let (mut game, _) = started(1);
        game.set_current(Piece::new(TetrominoKind::T, 0, 3, 0));
        game.tick(Duration::from_millis(900));
        game.apply(Command::SoftDrop);
        game.tick(Duration::from_millis(900));
        assert_eq!(game.current().map(|p| p.y), Some(1));
    }

    #[test]
    fn test_pause_freezes_everything() {
        let (mut game, rec) = started(1);
        let piece = *game.current().unwrap();
        game.apply(Command::TogglePause);
        assert_eq!(game.status(), Status::Paused);
        game.apply(Command::MoveLeft);
        game.apply(Command::HardDrop);
        game.tick(Duration::from_secs(10));
        assert_eq!(game.current(), Some(&piece));
        game.apply(Command::TogglePause);
        assert_eq!(game.status(), Status::Running);
        game.tick(Duration::from_millis(500));
        assert_eq!(game.current(), Some(&piece));
        assert_eq!(
            rec.events(),
            vec![SoundEvent::GameStart, SoundEvent::Click, SoundEvent::Click]
        );
    }

    #[test]
    fn test_double_clear_scores_and_reports_rows() {
        let (mut game, rec) = started(1);
        fill_row_except(game.grid_mut(), 18, &[4, 5]);
        fill_row_except(game.grid_mut(), 19, &[4, 5]);
        game.grid_mut().set(17, 0, Cell::Block(6));
        game.set_current(Piece::spawn(TetrominoKind::O, 10));
        game.apply(Command::HardDrop);
        let p = game.progress();
        assert_eq!((p.score, p.lines, p.level), (100, 2, 1));
        assert_eq!(game.take_cleared_rows(), vec![18, 19]);
        assert!(game.take_cleared_rows().is_empty());
        assert_eq!(game.grid().get(19, 0), Some(Cell::Block(6)));
        assert!(rec.events().contains(&SoundEvent::LineClear));
    }

    #[test]
    fn test_gravity_locks_clears_and_spawns() {
        let (mut game, rec) = started(4);
        fill_row_except(game.grid_mut(), 19, &[4, 5]);
        game.set_current(Piece::new(TetrominoKind::O, 0, 4, 18));
        let preview = *game.next();

        game.tick(Duration::from_millis(1001));

        let mut expected = Grid::new(10, 20);
        expected.set(19, 4, Cell::Block(2));
        expected.set(19, 5, Cell::Block(2));
        assert_eq!(game.grid(), &expected);
        assert_eq!(game.take_cleared_rows(), vec![19]);
        let p = game.progress();
        assert_eq!((p.score, p.lines, p.level), (40, 1, 1));
        assert_eq!(game.current(), Some(&preview));
        assert_eq!(game.status(), Status::Running);
        assert_eq!(
            rec.events(),
            vec![SoundEvent::GameStart, SoundEvent::LineClear]
        );
    }

    #[test]
    fn test_gravity_lock_with_blocked_spawn_ends_game() {
        let (mut game, rec) = started(4);
        for col in 3..7 {
            game.grid_mut().set(0, col, Cell::Block(4));
        }
        game.set_current(Piece::new(TetrominoKind::O, 0, 0, 18));

        game.tick(Duration::from_millis(1001));

        assert_eq!(game.status(), Status::GameOver);
        assert_eq!(game.grid().get(19, 0), Some(Cell::Block(2)));
        assert_eq!(game.grid().get(18, 1), Some(Cell::Block(2)));
        assert_eq!(game.progress(), Progress::default());
        assert_eq!(rec.events().last(), Some(&SoundEvent::GameOver));
    }

    #[test]
    fn test_blocked_spawn_is_game_over_without_touching_grid() {
        let (mut game, rec) = started(1);
        for col in 3..7 {
            game.grid_mut().set(0, col, Cell::Block(4));
            game.grid_mut().set(1, col, Cell::Block(4));
        }
        game.set_current(Piece::new(TetrominoKind::O, 0, 0, 0));
        game.apply(Command::HardDrop);

        let mut expected = Grid::new(10, 20);
        for col in 3..7 {
            expected.set(0, col, Cell::Block(4));
            expected.set(1, col, Cell::Block(4));
        }
        for (row, col) in [(18, 0), (18, 1), (19, 0), (19, 1)] {
            expected.set(row, col, Cell::Block(2));
        }
        assert_eq!(game.status(), Status::GameOver);
        assert_eq!(game.grid(), &expected);
        assert_eq!(rec.events().last(), Some(&SoundEvent::GameOver));

        let frozen = game.grid().clone();
        game.apply(Command::HardDrop);
        game.apply(Command::TogglePause);
        game.tick(Duration::from_secs(3));
        assert_eq!(game.grid(), &frozen);
        assert_eq!(game.status(), Status::GameOver);
    }

    #[test]
    fn test_restart_after_game_over_resets() {
        let (mut game, _) = started(1);
        for col in 3..7 {
            game.grid_mut().set(0, col, Cell::Block(4));
        }
        game.set_current(Piece::new(TetrominoKind::O, 0, 0, 0));
        game.apply(Command::HardDrop);
        assert_eq!(game.status(), Status::GameOver);
        game.start();
        assert_eq!(game.status(), Status::Running);
        assert_eq!(game.progress(), Progress::default());
        assert_eq!(game.grid(), &Grid::new(10, 20));
    }

    #[test]
    fn test_broken_sound_sink_does_not_matter() {
        let mut quiet = Game::new(&config(9), Box::new(Broken));
        let mut loud = Game::new(&config(9), Box::new(Recorder::default()));
        for game in [&mut quiet, &mut loud] {
            game.start();
            for _ in 0..40 {
                game.apply(Command::HardDrop);
            }
        }
        assert_eq!(quiet.grid(), loud.grid());
        assert_eq!(quiet.progress(), loud.progress());
        assert_eq!(quiet.status(), loud.status());
    }

    proptest! {
        #[test]
        fn hard_drop_matches_repeated_soft_drops(
            seed in any::<u64>(),
            kind in 0usize..7,
            rotation in 0u8..4,
            x in 0i32..7,
            heights in prop::collection::vec(0usize..12, 10),
        ) {
            let setup = |game: &mut Game| {
                for (col, &h) in heights.iter().enumerate() {
                    for row in (20 - h)..20 {
                        // Column 9 stays open so no row is pre-filled.
                        if col != 9 {
                            game.grid_mut().set(row, col, Cell::Block(3));
                        }
                    }
                }
                game.set_current(Piece::new(TetrominoKind::ALL[kind], rotation, x, 0));
            };
            let (mut hard, _) = started(seed);
            let (mut soft, _) = started(seed);
            setup(&mut hard);
            setup(&mut soft);
            let start = *hard.current().unwrap();
            prop_assume!(!collides(&start, hard.grid()));

            hard.apply(Command::HardDrop);
            loop {
                let before = *soft.current().unwrap();
                soft.apply(Command::SoftDrop);
                match soft.current() {
                    Some(p) if p.kind == before.kind && p.y == before.y + 1 && p.x == before.x => {}
                    _ => break,
                }
            }
            prop_assert_eq!(hard.grid(), soft.grid());
            prop_assert_eq!(hard.progress(), soft.progress());
            prop_assert_eq!(hard.status(), soft.status());
        }
    }
}
