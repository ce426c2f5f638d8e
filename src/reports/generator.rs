use crate::lineage::{Lineage, PedigreeGraph, PedigreeNode};
use crate::reports::formatters::{JsonFormatter, MarkdownFormatter, OutputFormat, ReportFormatter, TextFormatter};
use crate::store::FileUrlResolver;
use crate::transit::{build_timeline, TimelineEvent, TransitRecord, TransitRoute};
use crate::types::{Animal, TransitStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A resolved lineage together with the pedigree statistics shown alongside it
#[derive(Debug, Clone, Serialize)]
pub struct LineageReport {
    #[serde(flatten)]
    pub lineage: Lineage,
    pub animal_count: usize,
    pub generations: usize,
    pub founders: Vec<String>,
    pub shared_ancestors: Vec<String>,
    /// Photo URL per animal id, for animals that have one
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, String>,
    pub generated_at: DateTime<Utc>,
}

impl LineageReport {
    pub fn new(lineage: Lineage, files: Option<&dyn FileUrlResolver>) -> Self {
        let graph = PedigreeGraph::from_tree(&lineage.root);

        let mut images = BTreeMap::new();
        if let Some(files) = files {
            collect_images(&lineage.root, files, &mut images);
        }

        Self {
            animal_count: graph.node_count(),
            generations: graph.generations(),
            founders: graph.founders(),
            shared_ancestors: graph.shared_ancestors(),
            images,
            generated_at: Utc::now(),
            lineage,
        }
    }

    pub fn image_url(&self, animal_id: &str) -> Option<&str> {
        self.images.get(animal_id).map(String::as_str)
    }
}

fn collect_images(node: &PedigreeNode, files: &dyn FileUrlResolver, images: &mut BTreeMap<String, String>) {
    if let Some(image) = &node.animal.image_ref {
        images
            .entry(node.animal.id.clone())
            .or_insert_with(|| files.file_url(&node.animal.id, image));
    }
    for parent in &node.children {
        collect_images(parent, files, images);
    }
}

/// Distance and timeline of a route, planned or stored
#[derive(Debug, Clone, Serialize)]
pub struct TransitSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub livestock: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransitStatus>,
    pub checkpoint_count: usize,
    pub distance_km: f64,
    /// Two-decimal display form of `distance_km`
    pub distance: String,
    pub timeline: Vec<TimelineEvent>,
}

impl TransitSummary {
    pub fn from_route(route: &TransitRoute) -> Self {
        Self {
            transit_id: None,
            purpose: None,
            from: None,
            to: None,
            livestock: Vec::new(),
            status: None,
            checkpoint_count: route.len(),
            distance_km: route.total_distance_km,
            distance: route.formatted_distance(),
            timeline: build_timeline(&route.checkpoints),
        }
    }

    /// Summarise a stored record. The distance is recomputed from the
    /// checkpoints rather than taken from the rounded stored value.
    pub fn from_record(record: &TransitRecord) -> crate::error::Result<Self> {
        let route = record.route()?;
        Ok(Self {
            transit_id: Some(record.id.clone()),
            purpose: Some(record.purpose.clone()),
            from: Some(record.from.clone()),
            to: Some(record.to.clone()),
            livestock: record.livestock.clone(),
            status: Some(record.status.clone()),
            ..Self::from_route(&route)
        })
    }
}

/// Report generator for creating various output formats
#[derive(Default)]
pub struct ReportGenerator {
    file_urls: Option<Arc<dyn FileUrlResolver + Send + Sync>>,
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self { file_urls: None }
    }

    /// Resolve animal photos to URLs in lineage reports
    pub fn with_file_urls(mut self, file_urls: Arc<dyn FileUrlResolver + Send + Sync>) -> Self {
        self.file_urls = Some(file_urls);
        self
    }

    pub fn lineage_report(&self, lineage: Lineage) -> LineageReport {
        let files = self.file_urls.as_deref().map(|f| f as &dyn FileUrlResolver);
        LineageReport::new(lineage, files)
    }

    /// Render a lineage in the specified format
    pub fn generate_lineage(&self, lineage: Lineage, format: &str) -> Result<String> {
        let format: OutputFormat = format.parse()?;
        let report = self.lineage_report(lineage);
        debug!(
            "Rendering lineage report of {} animals as {:?}",
            report.animal_count, format
        );
        formatter(format).lineage(&report)
    }

    /// Render a transit summary in the specified format
    pub fn generate_transit(&self, summary: &TransitSummary, format: &str) -> Result<String> {
        let format: OutputFormat = format.parse()?;
        formatter(format).transit(summary)
    }

    /// Render one row per stored transit
    pub fn generate_transit_list(&self, summaries: &[TransitSummary], format: &str) -> Result<String> {
        let format: OutputFormat = format.parse()?;
        formatter(format).transit_list(summaries)
    }

    pub fn generate_animals(&self, animals: &[Animal], format: &str) -> Result<String> {
        let format: OutputFormat = format.parse()?;
        formatter(format).animals(animals)
    }
}

fn formatter(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
        OutputFormat::Text => Box::new(TextFormatter),
    }
}
