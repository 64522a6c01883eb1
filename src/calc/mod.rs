//! Calculators driven by the computation nodes. Each one turns a mesh index,
//! a reader and a set of regions into a [`Table`](crate::data::Table).

pub mod arrival;
pub mod condition;
pub mod flux;
pub mod volume;

pub use arrival::{ArrivalDurationCalculator, ConditionColumns, TimeUnit};
pub use condition::Condition;
pub use flux::{FluxCalculator, FluxKind, FluxOption, available_flux_options};
pub use volume::{RegionVolume, Subtrahend, VolumeCalculator, VolumeKind};
