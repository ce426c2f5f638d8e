pub mod config;
pub mod error;
pub mod lineage;
pub mod reports;
pub mod store;
pub mod transit;
pub mod types;

pub use error::{HerdbookError, Result};
pub use lineage::{Lineage, PedigreeNode, PedigreeResolver};
pub use transit::{append_checkpoint, build_timeline, compute_distance_km, TransitRoute};
