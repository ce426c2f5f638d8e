pub mod formatters;
pub mod generator;

pub use formatters::{JsonFormatter, MarkdownFormatter, OutputFormat, ReportFormatter, TextFormatter};
pub use generator::{LineageReport, ReportGenerator, TransitSummary};
