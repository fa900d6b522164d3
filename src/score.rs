//! Cumulative score and level derived from fixed checkpoints.

/// Outcome of one `Score::update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub awarded: u64,
    /// Scoreboard text taken before the level was recomputed.
    pub status: String,
    /// New level when it went up.
    pub level_up: Option<usize>,
}

/// Points and level. `level` is 0-based; the player sees `level + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    points: u64,
    level: usize,
    /// Ascending thresholds: level N needs `checkpoints[N - 1]`.
    checkpoints: Vec<u64>,
    /// Points exponent per level; the last entry covers any higher level.
    exponents: Vec<f64>,
}

impl Score {
    pub fn new(checkpoints: Vec<u64>, exponents: Vec<f64>) -> Self {
        Self {
            points: 0,
            level: 0,
            checkpoints,
            exponents,
        }
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn points_exponent(&self, level: usize) -> f64 {
        self.exponents
            .get(level)
            .or_else(|| self.exponents.last())
            .copied()
            .unwrap_or(1.0)
    }

    /// Award `floor(clear_count ^ exponent)`, snapshot the status text, then
    /// re-derive the level.
    pub fn update(&mut self, clear_count: u32) -> ScoreUpdate {
        let exponent = self.points_exponent(self.level);
        let award = f64::from(clear_count).powf(exponent).floor();
        let awarded = if award.is_finite() && award > 0.0 {
            award as u64
        } else {
            0
        };
        self.points = self.points.saturating_add(awarded);
        let status = self.status_text();
        let level = self.calc_level();
        let level_up = (level > self.level).then(|| {
            self.level = level;
            level
        });
        ScoreUpdate {
            awarded,
            status,
            level_up,
        }
    }

    /// Highest level whose checkpoint is reached; never below the current level.
    pub fn calc_level(&self) -> usize {
        self.checkpoints
            .iter()
            .enumerate()
            .rev()
            .find(|&(_, &threshold)| self.points >= threshold)
            .map_or(self.level, |(i, _)| (i + 1).max(self.level))
    }

    pub fn status_text(&self) -> String {
        format!("Level: {} / Score: {}", self.level + 1, self.points)
    }
}
