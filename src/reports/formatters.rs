use crate::lineage::PedigreeNode;
use crate::reports::generator::{LineageReport, TransitSummary};
use crate::types::Animal;
use anyhow::Result;
use std::fmt::Write;
use std::str::FromStr;

/// Output formats understood by the report generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(anyhow::anyhow!("Unsupported format: {}", other)),
        }
    }
}

/// Trait for report formatters
pub trait ReportFormatter {
    fn lineage(&self, report: &LineageReport) -> Result<String>;
    fn transit(&self, summary: &TransitSummary) -> Result<String>;
    fn transit_list(&self, summaries: &[TransitSummary]) -> Result<String>;
    fn animals(&self, animals: &[Animal]) -> Result<String>;
}

/// JSON formatter
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn lineage(&self, report: &LineageReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    fn transit(&self, summary: &TransitSummary) -> Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }

    fn transit_list(&self, summaries: &[TransitSummary]) -> Result<String> {
        Ok(serde_json::to_string_pretty(summaries)?)
    }

    fn animals(&self, animals: &[Animal]) -> Result<String> {
        Ok(serde_json::to_string_pretty(animals)?)
    }
}

/// Markdown formatter. The pedigree becomes a nested list.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn tree(&self, report: &LineageReport, node: &PedigreeNode, level: usize, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(level);
        write!(out, "{}- **{}**: {}", indent, node.relation, node.animal.display_label())?;
        if let Some(url) = report.image_url(&node.animal.id) {
            write!(out, " ([photo]({}))", url)?;
        }
        writeln!(out)?;

        for parent in &node.children {
            self.tree(report, parent, level + 1, out)?;
        }
        Ok(())
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn lineage(&self, report: &LineageReport) -> Result<String> {
        let lineage = &report.lineage;
        let mut out = String::new();

        writeln!(out, "# Lineage of {}", lineage.root.animal.display_label())?;
        writeln!(out)?;
        writeln!(
            out,
            "**Depth**: {} (requested {})",
            lineage.effective_depth, lineage.requested_depth
        )?;
        writeln!(out, "**Animals**: {}", report.animal_count)?;
        writeln!(out, "**Generations**: {}", report.generations)?;
        writeln!(out)?;
        writeln!(out, "## Pedigree")?;
        self.tree(report, &lineage.root, 0, &mut out)?;

        if !report.shared_ancestors.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Shared Ancestors")?;
            for id in &report.shared_ancestors {
                writeln!(out, "- {}", id)?;
            }
        }

        if lineage.has_gaps() {
            writeln!(out)?;
            writeln!(out, "## Unresolved Links")?;
            for gap in &lineage.gaps {
                writeln!(
                    out,
                    "- {} of `{}` -> `{}`: {}",
                    gap.relation, gap.child_id, gap.parent_id, gap.reason
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "---")?;
        writeln!(out, "*Query {}*", lineage.query_id)?;
        Ok(out)
    }

    fn transit(&self, summary: &TransitSummary) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "# Transit {}", summary.transit_id.as_deref().unwrap_or("(draft)"))?;
        writeln!(out)?;
        if let Some(purpose) = &summary.purpose {
            writeln!(out, "**Purpose**: {}", purpose)?;
        }
        if let (Some(from), Some(to)) = (&summary.from, &summary.to) {
            writeln!(out, "**Route**: {} -> {}", from, to)?;
        }
        if let Some(status) = &summary.status {
            writeln!(out, "**Status**: {}", status)?;
        }
        writeln!(out, "**Checkpoints**: {}", summary.checkpoint_count)?;
        writeln!(out, "**Distance**: {} km", summary.distance)?;
        writeln!(out)?;
        writeln!(out, "## Timeline")?;
        if summary.timeline.is_empty() {
            writeln!(out, "No timeline until the route has a departure and an arrival.")?;
        }
        for event in &summary.timeline {
            writeln!(out, "- **{}**: {}", event.label, event.timestamp.to_rfc3339())?;
        }
        Ok(out)
    }

    fn transit_list(&self, summaries: &[TransitSummary]) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "# Transits")?;
        writeln!(out)?;
        writeln!(out, "| Id | Route | Animals | Status | Distance |")?;
        writeln!(out, "|---|---|---|---|---|")?;
        for summary in summaries {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} km |",
                summary.transit_id.as_deref().unwrap_or("-"),
                route_label(summary),
                summary.livestock.len(),
                status_label(summary),
                summary.distance
            )?;
        }
        Ok(out)
    }

    fn animals(&self, animals: &[Animal]) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "# Available Livestock")?;
        writeln!(out)?;
        for animal in animals {
            writeln!(out, "- `{}` {}", animal.id, animal.display_label())?;
        }
        Ok(out)
    }
}

/// Plain text formatter. The pedigree is indented two spaces per generation.
pub struct TextFormatter;

impl TextFormatter {
    fn tree(&self, node: &PedigreeNode, level: usize, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(level);
        if level == 0 {
            writeln!(out, "{}", node.animal.display_label())?;
        } else {
            writeln!(out, "{}{}: {}", indent, node.relation, node.animal.display_label())?;
        }

        for parent in &node.children {
            self.tree(parent, level + 1, out)?;
        }
        Ok(())
    }
}

impl ReportFormatter for TextFormatter {
    fn lineage(&self, report: &LineageReport) -> Result<String> {
        let lineage = &report.lineage;
        let mut out = String::new();

        writeln!(out, "Lineage (depth {})", lineage.effective_depth)?;
        writeln!(out, "===================")?;
        self.tree(&lineage.root, 0, &mut out)?;

        if !report.shared_ancestors.is_empty() {
            writeln!(out)?;
            writeln!(out, "Shared ancestors: {}", report.shared_ancestors.join(", "))?;
        }

        if lineage.has_gaps() {
            writeln!(out)?;
            writeln!(out, "Unresolved links:")?;
            for gap in &lineage.gaps {
                writeln!(
                    out,
                    "  - {} of {} -> {} ({})",
                    gap.relation, gap.child_id, gap.parent_id, gap.reason
                )?;
            }
        }
        Ok(out)
    }

    fn transit(&self, summary: &TransitSummary) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "Distance: {} km", summary.distance)?;
        writeln!(out, "Checkpoints: {}", summary.checkpoint_count)?;
        if let Some(status) = &summary.status {
            writeln!(out, "Status: {}", status)?;
        }
        for event in &summary.timeline {
            writeln!(out, "  {:<14} {}", event.label, event.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(out)
    }

    fn transit_list(&self, summaries: &[TransitSummary]) -> Result<String> {
        let mut out = String::new();
        if summaries.is_empty() {
            writeln!(out, "No transits stored.")?;
        }
        for summary in summaries {
            writeln!(
                out,
                "{:<16} {:<32} {:<12} {:>10} km",
                summary.transit_id.as_deref().unwrap_or("-"),
                route_label(summary),
                status_label(summary),
                summary.distance
            )?;
        }
        Ok(out)
    }

    fn animals(&self, animals: &[Animal]) -> Result<String> {
        let mut out = String::new();
        if animals.is_empty() {
            writeln!(out, "No livestock available.")?;
        }
        for animal in animals {
            writeln!(out, "{:<16} {}", animal.id, animal.display_label())?;
        }
        Ok(out)
    }
}

fn route_label(summary: &TransitSummary) -> String {
    format!(
        "{} -> {}",
        summary.from.as_deref().unwrap_or("?"),
        summary.to.as_deref().unwrap_or("?")
    )
}

fn status_label(summary: &TransitSummary) -> String {
    summary
        .status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
