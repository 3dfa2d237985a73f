pub mod analysis;
pub mod snapshot;
