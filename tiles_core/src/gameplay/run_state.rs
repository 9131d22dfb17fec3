/// Score and combo accumulator for one run.
///
/// Passive: it trusts the judge's outcomes and performs no validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub paused: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_points(&mut self, points: u32) {
        self.score += points as u64;
    }

    /// One more successful judgment.
    pub fn register_hit(&mut self) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}
