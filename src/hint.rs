use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Primary recommendation of one analysis pass. The first two variants are
/// exact deductions; the guess variants are heuristics with no safety
/// guarantee, surfaced only when no deduction exists anywhere on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suggestion {
    SafeReveal(Coord2),
    FlagMine(Coord2),
    EdgeGuess(Coord2),
    BlindGuess(Coord2),
}

impl Suggestion {
    pub const fn coords(self) -> Coord2 {
        match self {
            Self::SafeReveal(coords)
            | Self::FlagMine(coords)
            | Self::EdgeGuess(coords)
            | Self::BlindGuess(coords) => coords,
        }
    }

    pub const fn is_deduced(self) -> bool {
        matches!(self, Self::SafeReveal(_) | Self::FlagMine(_))
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based coordinates for the player-facing message
        let (row, col) = self.coords();
        let (row, col) = (row + 1, col + 1);
        match self {
            Self::SafeReveal(_) => {
                write!(f, "Row {row}, column {col} is safe to reveal.")
            }
            Self::FlagMine(_) => {
                write!(f, "Row {row}, column {col} is very likely a mine; flag it.")
            }
            Self::EdgeGuess(_) => {
                write!(
                    f,
                    "No certain move; row {row}, column {col} near the border is worth a try."
                )
            }
            Self::BlindGuess(_) => {
                write!(f, "No certain move; row {row}, column {col} is a blind guess.")
            }
        }
    }
}

/// Full result of one analysis pass: the primary suggestion plus every
/// provably-safe and provably-mined cell for highlighting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintReport {
    pub suggestion: Option<Suggestion>,
    pub safe_cells: BTreeSet<Coord2>,
    pub probable_mines: BTreeSet<Coord2>,
}

impl HintReport {
    /// Fixed result for sessions that are not started or already over.
    pub fn not_applicable() -> Self {
        Self {
            suggestion: None,
            safe_cells: BTreeSet::new(),
            probable_mines: BTreeSet::new(),
        }
    }

    /// An applicable report always carries a suggestion: while a session is
    /// active there are more hidden cells than mines, so at least one
    /// unflagged hidden cell exists for the fallback to pick.
    pub fn is_applicable(&self) -> bool {
        self.suggestion.is_some()
    }
}

/// Single-pass exact constraint deduction over every revealed numbered cell.
///
/// For each clue with `n > 0` adjacent mines, `unopened` unrevealed
/// neighbors and `flagged` flagged neighbors:
/// - `n == flagged` and more unopened than flags: the unflagged unopened
///   neighbors are provably safe.
/// - `unopened == n - flagged`: the unflagged unopened neighbors are
///   provably mines.
///
/// Deductions are local per clue; nothing chains across clues and no
/// probabilities are estimated. The analyzer is read-only and stateless:
/// usage caps belong to the caller, and `rng` is consulted only by the
/// non-deductive fallback guess.
pub fn analyze<R: Rng + ?Sized>(session: &GameSession, rng: &mut R) -> HintReport {
    if !session.is_started() || session.is_finished() {
        return HintReport::not_applicable();
    }

    let (rows, cols) = session.size();
    let mut safe_cells = BTreeSet::new();
    let mut probable_mines = BTreeSet::new();

    for row in 0..rows {
        for col in 0..cols {
            let clue = (row, col);
            let CellState::Revealed(number) = session.cell_at(clue) else {
                continue;
            };
            if number == 0 {
                continue;
            }

            let mut unopened = Vec::new();
            let mut flagged: u8 = 0;
            for pos in NeighborIter::new(clue, session.size()) {
                match session.cell_at(pos) {
                    CellState::Hidden => unopened.push(pos),
                    CellState::Flagged => {
                        unopened.push(pos);
                        flagged += 1;
                    }
                    CellState::Revealed(_) | CellState::Detonated => {}
                }
            }

            let unflagged = || {
                unopened
                    .iter()
                    .copied()
                    .filter(|&pos| !session.cell_at(pos).is_flagged())
            };

            if number == flagged && unopened.len() > usize::from(flagged) {
                safe_cells.extend(unflagged());
            }

            if number >= flagged && unopened.len() == usize::from(number - flagged) {
                probable_mines.extend(unflagged());
            }
        }
    }

    let suggestion = if let Some(&coords) = safe_cells.iter().next() {
        Some(Suggestion::SafeReveal(coords))
    } else if let Some(&coords) = probable_mines.iter().next() {
        Some(Suggestion::FlagMine(coords))
    } else {
        fallback_guess(session, rng)
    };

    HintReport {
        suggestion,
        safe_cells,
        probable_mines,
    }
}

/// Convenience wrapper for callers without an rng at hand.
pub fn analyze_with_seed(session: &GameSession, seed: u64) -> HintReport {
    use rand::prelude::*;
    analyze(session, &mut SmallRng::seed_from_u64(seed))
}

/// Heuristic pick when no deduction fired: a uniformly random hidden
/// unflagged border cell, else any hidden unflagged cell.
fn fallback_guess<R: Rng + ?Sized>(session: &GameSession, rng: &mut R) -> Option<Suggestion> {
    let (rows, cols) = session.size();
    let mut border = Vec::new();
    let mut hidden = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let coords = (row, col);
            if session.cell_at(coords) != CellState::Hidden {
                continue;
            }
            hidden.push(coords);
            if is_border(coords, session.size()) {
                border.push(coords);
            }
        }
    }

    if !border.is_empty() {
        let pick = border[rng.random_range(0..border.len())];
        Some(Suggestion::EdgeGuess(pick))
    } else if !hidden.is_empty() {
        let pick = hidden[rng.random_range(0..hidden.len())];
        Some(Suggestion::BlindGuess(pick))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn fixture(size: Coord2, mines: &[Coord2]) -> GameSession {
        GameSession::from_minefield(Minefield::from_mine_coords(size, mines).unwrap())
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0)
    }

    #[test]
    fn not_applicable_before_start_and_after_finish() {
        let session = fixture((2, 2), &[(0, 0)]);
        assert!(!analyze(&session, &mut rng()).is_applicable());

        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((0, 0)).unwrap();
        assert!(session.is_finished());
        let report = analyze(&session, &mut rng());
        assert_eq!(report, HintReport::not_applicable());
    }

    #[test]
    fn safe_rule_clears_neighbors_of_satisfied_clue() {
        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((1, 1)).unwrap();
        session.toggle_flag((0, 0)).unwrap();

        let report = analyze(&session, &mut rng());

        assert_eq!(
            report.safe_cells,
            BTreeSet::from([(0, 1), (1, 0)])
        );
        assert!(report.probable_mines.is_empty());
        assert_eq!(report.suggestion, Some(Suggestion::SafeReveal((0, 1))));
    }

    #[test]
    fn mine_rule_marks_forced_neighbors() {
        // revealed "2" flanked by its only two unopened neighbors
        let mut session = fixture((1, 4), &[(0, 0), (0, 2)]);
        session.reveal((0, 1)).unwrap();

        let report = analyze(&session, &mut rng());

        assert_eq!(report.probable_mines, BTreeSet::from([(0, 0), (0, 2)]));
        assert!(report.safe_cells.is_empty());
        assert_eq!(report.suggestion, Some(Suggestion::FlagMine((0, 0))));
    }

    #[test]
    fn flagged_cells_never_appear_in_either_set() {
        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((1, 1)).unwrap();
        session.toggle_flag((0, 0)).unwrap();

        let report = analyze(&session, &mut rng());

        assert!(!report.safe_cells.contains(&(0, 0)));
        assert!(!report.probable_mines.contains(&(0, 0)));
        assert_eq!(report.safe_cells, BTreeSet::from([(0, 1), (1, 0)]));
    }

    #[test]
    fn deductions_are_idempotent_on_unchanged_session() {
        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((1, 1)).unwrap();
        session.toggle_flag((0, 0)).unwrap();

        let first = analyze(&session, &mut rng());
        let second = analyze(&session, &mut rng());

        assert_eq!(first.safe_cells, second.safe_cells);
        assert_eq!(first.probable_mines, second.probable_mines);
        assert_eq!(first, second);
    }

    #[test]
    fn fallback_prefers_hidden_border_cells() {
        // one revealed "1" with three hidden neighbors fires neither rule
        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((1, 1)).unwrap();

        let report = analyze(&session, &mut rng());

        assert!(report.safe_cells.is_empty());
        assert!(report.probable_mines.is_empty());
        let suggestion = report.suggestion.unwrap();
        assert!(matches!(suggestion, Suggestion::EdgeGuess(_)));
        assert!(!suggestion.is_deduced());
        assert!([(0, 0), (0, 1), (1, 0)].contains(&suggestion.coords()));
    }

    #[test]
    fn fallback_is_reproducible_for_a_fixed_seed() {
        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((1, 1)).unwrap();

        let first = analyze_with_seed(&session, 99);
        let second = analyze_with_seed(&session, 99);

        assert_eq!(first, second);
    }

    #[test]
    fn analyzer_leaves_the_session_untouched() {
        let mut session = fixture((2, 2), &[(0, 0)]);
        session.reveal((1, 1)).unwrap();

        let before = (session.revealed_cells(), session.flags_placed());
        // analyzer is stateless; callers may invoke it arbitrarily often
        for seed in 0..8 {
            analyze_with_seed(&session, seed);
        }
        assert_eq!(
            (session.revealed_cells(), session.flags_placed()),
            before
        );
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn suggestion_messages_use_one_based_coordinates() {
        use alloc::string::ToString;

        let text = Suggestion::SafeReveal((0, 1)).to_string();
        assert_eq!(text, "Row 1, column 2 is safe to reveal.");

        let text = Suggestion::FlagMine((2, 0)).to_string();
        assert!(text.starts_with("Row 3, column 1"));
    }

    #[test]
    fn report_json_round_trip() {
        let mut session = fixture((1, 4), &[(0, 0), (0, 2)]);
        session.reveal((0, 1)).unwrap();

        let report = analyze(&session, &mut rng());
        let json = serde_json::to_string(&report).unwrap();
        let back: HintReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
