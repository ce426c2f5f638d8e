//! Ancestry resolution over the herd's parent links

pub mod graph;
pub mod resolver;

pub use graph::PedigreeGraph;
pub use resolver::{GapReason, Lineage, LineageGap, PedigreeNode, PedigreeResolver, Relation};
