use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board configuration cannot guarantee a mine-free first click")]
    InvalidConfig,
    #[error("Too many mines for the requested safe zone")]
    TooManyMines,
}

pub type Result<T> = core::result::Result<T, GameError>;
