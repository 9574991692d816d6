use crate::*;
pub use random::*;

mod random;

/// Mine-placement seam. The first reveal of a session drives this with the
/// clicked cell as `safe_anchor`; implementations must leave the clamped 3x3
/// zone around the anchor mine-free and place exactly `config.mines` mines.
pub trait MinePlacer: core::fmt::Debug {
    fn place(&mut self, config: GameConfig, safe_anchor: Coord2) -> Result<Minefield>;
}

/// Whether `coords` falls inside the 3x3 safe zone centered on `anchor`.
pub(crate) fn in_safe_zone(coords: Coord2, anchor: Coord2) -> bool {
    coords.0.abs_diff(anchor.0) <= 1 && coords.1.abs_diff(anchor.1) <= 1
}

/// Cells of the safe zone after clamping to the board edges.
pub(crate) fn safe_zone_len(size: Coord2, anchor: Coord2) -> CellCount {
    let span = |center: Coord, max: Coord| -> CellCount {
        let lo = center.saturating_sub(1);
        let hi = (center + 1).min(max - 1);
        CellCount::from(hi - lo) + 1
    };
    span(anchor.0, size.0) * span(anchor.1, size.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_zone_clamps_at_edges() {
        assert_eq!(safe_zone_len((9, 9), (4, 4)), 9);
        assert_eq!(safe_zone_len((9, 9), (0, 0)), 4);
        assert_eq!(safe_zone_len((9, 9), (0, 4)), 6);
        assert_eq!(safe_zone_len((9, 9), (8, 8)), 4);
    }

    #[test]
    fn safe_zone_membership_is_chebyshev_distance_one() {
        assert!(in_safe_zone((3, 3), (4, 4)));
        assert!(in_safe_zone((4, 4), (4, 4)));
        assert!(!in_safe_zone((2, 4), (4, 4)));
        assert!(!in_safe_zone((4, 6), (4, 4)));
    }
}
