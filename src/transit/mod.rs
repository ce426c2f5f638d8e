pub mod plan;
pub mod route;
pub mod timeline;

pub use plan::{parse_checkpoints, TransitPlan, TransitRecord, TransitRecordDraft};
pub use route::{append_checkpoint, compute_distance_km, haversine_km, TransitRoute};
pub use timeline::{build_timeline, Stop, TimelineEvent};
