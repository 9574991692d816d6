use serde::{Deserialize, Serialize};

/// Canonical player-visible state of one board cell.
///
/// Revealed and flagged are mutually exclusive by construction; `Detonated`
/// is the single mine cell whose reveal ended the game and counts as
/// revealed for accounting purposes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed(u8),
    Detonated,
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_) | Self::Detonated)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}
