#![no_std]

extern crate alloc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use error::*;
pub use hint::*;
pub use placement::*;
pub use session::*;
pub use types::*;

mod cell;
mod error;
mod hint;
mod placement;
mod session;
mod types;

/// Cells in a full, edge-unclamped 3x3 first-click safe zone.
pub const SAFE_ZONE_CELLS: CellCount = 9;

/// The three fixed board presets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn config(self) -> GameConfig {
        match self {
            Self::Easy => GameConfig::new_unchecked((9, 9), 10),
            Self::Medium => GameConfig::new_unchecked((16, 16), 40),
            Self::Hard => GameConfig::new_unchecked((16, 30), 99),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    /// Rejects configs that cannot guarantee first-click safety: the anchor
    /// is unknown at creation time, so the full 3x3 zone must always fit.
    pub fn validate(&self) -> Result<()> {
        let total = self.total_cells();
        if total == 0 || self.mines == 0 {
            return Err(GameError::InvalidConfig);
        }
        if self.mines > total.saturating_sub(SAFE_ZONE_CELLS) {
            return Err(GameError::InvalidConfig);
        }
        Ok(())
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

/// Immutable mine placement for one session: the mine mask plus adjacency
/// numbers, both fixed at construction time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minefield {
    mines: Array2<bool>,
    numbers: Array2<u8>,
    mine_count: CellCount,
}

impl Minefield {
    pub fn from_mine_mask(mines: Array2<bool>) -> Self {
        let mine_count = mines
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();

        let mut numbers: Array2<u8> = Array2::default(mines.dim());
        let dim = mines.dim();
        for row in 0..dim.0 {
            for col in 0..dim.1 {
                let coords = (row as Coord, col as Coord);
                if mines[coords.to_nd_index()] {
                    // adjacency numbers for mine cells are never read
                    continue;
                }
                numbers[coords.to_nd_index()] = mines
                    .iter_neighbors(coords)
                    .filter(|&pos| mines[pos.to_nd_index()])
                    .count()
                    .try_into()
                    .unwrap();
            }
        }

        Self {
            mines,
            numbers,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mines: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mines[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mines))
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mines.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.mines.len().try_into().unwrap()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self.mines[coords.to_nd_index()]
    }

    /// Adjacency number of a non-mine cell. Don't-care for mine cells.
    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.numbers[coords.to_nd_index()]
    }

    /// Row-major coordinates of every mine, for end-of-game presentation.
    pub fn mine_coords(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mines
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mines.iter_neighbors(coords)
    }
}
