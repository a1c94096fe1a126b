//! Score, level and gravity speed progression.

use std::time::Duration;

/// Points per simultaneous line clear (0..=4 lines), multiplied by the level.
pub const LINE_POINTS: [u32; 5] = [0, 40, 100, 300, 1200];

pub const LINES_PER_LEVEL: u32 = 10;

const BASE_DROP_MS: u64 = 1000;
const DROP_STEP_MS: u64 = 100;
const MIN_DROP_MS: u64 = 100;

/// Points for clearing `lines` rows at once on `level`.
pub fn line_score(lines: usize, level: u32) -> u32 {
    LINE_POINTS[lines.min(LINE_POINTS.len() - 1)] * level
}

/// Level reached after `lines` total cleared lines (starts at 1).
pub fn level_for_lines(lines: u32) -> u32 {
    lines / LINES_PER_LEVEL + 1
}

/// Gravity interval for a level: 1000 ms, 100 ms faster per level, never below 100 ms.
pub fn drop_interval(level: u32) -> Duration {
    let faster = u64::from(level.saturating_sub(1)) * DROP_STEP_MS;
    Duration::from_millis(BASE_DROP_MS.saturating_sub(faster).max(MIN_DROP_MS))
}

/// Counters for one session. All three only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub score: u32,
    pub level: u32,
    pub lines: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            lines: 0,
        }
    }
}

impl Progress {
    /// Apply one lock's worth of cleared rows. Returns points awarded.
    /// Scored at the level in effect before the clear.
    pub fn record_clear(&mut self, cleared: usize) -> u32 {
        if cleared == 0 {
            return 0;
        }
        let points = line_score(cleared, self.level);
        self.score = self.score.saturating_add(points);
        self.lines = self.lines.saturating_add(cleared as u32);
        self.level = self.level.max(level_for_lines(self.lines));
        points
    }

    #[inline]
    pub fn drop_interval(&self) -> Duration {
        drop_interval(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_score_table() {
        assert_eq!(line_score(0, 5), 0);
        assert_eq!(line_score(1, 1), 40);
        assert_eq!(line_score(2, 3), 300);
        assert_eq!(line_score(3, 2), 600);
        assert_eq!(line_score(4, 1), 1200);
    }

    #[test]
    fn test_drop_interval_floor() {
        assert_eq!(drop_interval(1), Duration::from_millis(1000));
        assert_eq!(drop_interval(2), Duration::from_millis(900));
        assert_eq!(drop_interval(10), Duration::from_millis(100));
        assert_eq!(drop_interval(11), Duration::from_millis(100));
        assert_eq!(drop_interval(50), Duration::from_millis(100));
    }

    #[test]
    fn test_two_lines_at_level_three() {
        let mut p = Progress {
            score: 0,
            level: 3,
            lines: 20,
        };
        assert_eq!(p.record_clear(2), 300);
        assert_eq!(p.score, 300);
        assert_eq!(p.level, 3);
    }

    #[test]
    fn test_tetris_at_level_one() {
        let mut p = Progress::default();
        assert_eq!(p.record_clear(4), 1200);
        assert_eq!((p.score, p.lines, p.level), (1200, 4, 1));
    }

    #[test]
    fn test_crossing_ten_lines_levels_up_once() {
        let mut p = Progress {
            score: 0,
            level: 1,
            lines: 9,
        };
        p.record_clear(1);
        assert_eq!(p.lines, 10);
        assert_eq!(p.level, 2);
        assert_eq!(p.drop_interval(), Duration::from_millis(900));
        p.record_clear(1);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn test_zero_clear_changes_nothing() {
        let mut p = Progress::default();
        assert_eq!(p.record_clear(0), 0);
        assert_eq!(p, Progress::default());
    }
}
