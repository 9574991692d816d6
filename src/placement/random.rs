use ndarray::Array2;

use super::*;

/// Rejection-sampling placer: uniformly random cells are drawn until the
/// requested mine count lands outside the safe zone. Expected O(mines) draws
/// at the preset densities; degenerate configs error out instead of looping.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinePlacer {
    seed: u64,
}

impl RandomMinePlacer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl MinePlacer for RandomMinePlacer {
    fn place(&mut self, config: GameConfig, safe_anchor: Coord2) -> Result<Minefield> {
        use rand::prelude::*;

        let (rows, cols) = config.size;
        if safe_anchor.0 >= rows || safe_anchor.1 >= cols {
            return Err(GameError::InvalidCoords);
        }

        let placeable = config
            .total_cells()
            .saturating_sub(safe_zone_len(config.size, safe_anchor));
        if config.mines > placeable {
            log::warn!(
                "cannot place {} mines outside the safe zone, only {} cells available",
                config.mines,
                placeable
            );
            return Err(GameError::TooManyMines);
        }

        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut placed: CellCount = 0;
        let mut rng = SmallRng::seed_from_u64(self.seed);

        while placed < config.mines {
            let coords: Coord2 = (rng.random_range(0..rows), rng.random_range(0..cols));

            if mines[coords.to_nd_index()] || in_safe_zone(coords, safe_anchor) {
                continue;
            }

            mines[coords.to_nd_index()] = true;
            placed += 1;
        }

        log::debug!(
            "placed {} mines on a {}x{} board, anchor ({}, {})",
            placed,
            rows,
            cols,
            safe_anchor.0,
            safe_anchor.1
        );
        Ok(Minefield::from_mine_mask(mines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_zone_clear_for_interior_anchor() {
        let config = Difficulty::Easy.config();

        for seed in 0..32 {
            let field = RandomMinePlacer::new(seed).place(config, (4, 4)).unwrap();

            assert_eq!(field.mine_count(), config.mines);
            for row in 3..=5 {
                for col in 3..=5 {
                    assert!(!field.contains_mine((row, col)), "seed {seed}");
                }
            }
        }
    }

    #[test]
    fn keeps_safe_zone_clear_for_corner_anchor() {
        let config = Difficulty::Hard.config();
        let field = RandomMinePlacer::new(7).place(config, (0, 0)).unwrap();

        assert_eq!(field.mine_count(), 99);
        for coords in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert!(!field.contains_mine(coords));
        }
    }

    #[test]
    fn same_seed_reproduces_placement() {
        let config = Difficulty::Medium.config();
        let first = RandomMinePlacer::new(42).place(config, (8, 8)).unwrap();
        let second = RandomMinePlacer::new(42).place(config, (8, 8)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_mine_count_exceeding_placeable_cells() {
        // 4x4 board, corner anchor leaves 12 placeable cells
        let config = GameConfig::new_unchecked((4, 4), 13);
        let result = RandomMinePlacer::new(0).place(config, (0, 0));
        assert_eq!(result, Err(GameError::TooManyMines));
    }

    #[test]
    fn rejects_out_of_bounds_anchor() {
        let config = Difficulty::Easy.config();
        let result = RandomMinePlacer::new(0).place(config, (9, 0));
        assert_eq!(result, Err(GameError::InvalidCoords));
    }
}
