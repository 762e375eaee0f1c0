use crate::question::models::Level;

pub const PRIZES: [u64; Level::COUNT] = [
    100, 200, 300, 500, 1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 64_000, 125_000, 250_000,
    500_000, 1_000_000,
];

pub const FIREPROOF_LEVELS: [u8; 3] = [4, 9, 14];

/// Cumulative prize per level plus the levels whose prize survives a loss.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeTable {
    prizes: [u64; Level::COUNT],
    fireproof: Vec<Level>,
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self {
            prizes: PRIZES,
            fireproof: FIREPROOF_LEVELS.into_iter().filter_map(|l| Level::new(l).ok()).collect(),
        }
    }
}

impl PrizeTable {
    pub fn prize(&self, level: Level) -> u64 {
        self.prizes[level.index()]
    }

    pub fn top_prize(&self) -> u64 {
        self.prize(Level::MAX)
    }

    pub fn is_fireproof(&self, level: Level) -> bool {
        self.fireproof.contains(&level)
    }

    /// Prize of the highest fireproof level at or below `answered`, 0 if none.
    pub fn fireproof_prize(&self, answered: Option<Level>) -> u64 {
        let Some(answered) = answered else {
            return 0;
        };

        Level::all()
            .take_while(|l| *l <= answered)
            .filter(|l| self.is_fireproof(*l))
            .last()
            .map(|l| self.prize(l))
            .unwrap_or(0)
    }
}
