//! Data module - CSV loading and typed participant rows

mod loader;
mod model;

pub use loader::{DataLoader, LoaderError, CAKE_COLUMN, SEX_COLUMN};
pub use model::{
    CakeGroup, Measure, Participant, ParticipantTable, Sex, UnknownSex, DEFAULT_CAKE_CUTOFF,
};
