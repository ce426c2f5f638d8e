use crate::error::{HerdbookError, Result};
use crate::transit::route::{round_km, TransitRoute};
use crate::types::{Checkpoint, TransitStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A transit being planned: who moves, between which farms, along which route
#[derive(Debug, Clone, Serialize)]
pub struct TransitPlan {
    pub purpose: String,
    pub from_farm: String,
    pub to_farm: String,
    pub livestock: Vec<String>,
    pub route: TransitRoute,
}

/// Payload written to the transit collection when a plan is finalised
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitRecordDraft {
    pub purpose: String,
    pub from: String,
    pub to: String,
    pub livestock: Vec<String>,
    /// Checkpoints serialised as a JSON array string
    pub checkpoints: String,
    pub status: TransitStatus,
    /// Route length rounded to two decimals; not suitable for re-aggregation
    pub distance: f64,
}

/// A transit record read back from the store
#[derive(Debug, Clone, Deserialize)]
pub struct TransitRecord {
    pub id: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub livestock: Vec<String>,
    #[serde(default)]
    pub checkpoints: Value,
    #[serde(default)]
    pub status: TransitStatus,
    #[serde(default)]
    pub distance: f64,
}

impl TransitPlan {
    pub fn new(
        purpose: impl Into<String>,
        from_farm: impl Into<String>,
        to_farm: impl Into<String>,
        livestock: Vec<String>,
    ) -> Self {
        Self {
            purpose: purpose.into(),
            from_farm: from_farm.into(),
            to_farm: to_farm.into(),
            livestock,
            route: TransitRoute::new(),
        }
    }

    pub fn with_route(mut self, route: TransitRoute) -> Self {
        self.route = route;
        self
    }

    /// Check the plan is complete and build the record to persist
    pub fn finalize(&self, min_checkpoints: usize) -> Result<TransitRecordDraft> {
        if self.route.len() < min_checkpoints {
            return Err(HerdbookError::InsufficientCheckpoints {
                required: min_checkpoints,
                got: self.route.len(),
            });
        }

        if self.livestock.is_empty() {
            return Err(HerdbookError::InvalidInput(
                "a transit must carry at least one animal".to_string(),
            ));
        }

        let checkpoints = serde_json::to_string(&self.route.checkpoints)?;
        debug!(
            "Finalised transit plan with {} checkpoints and {} animals",
            self.route.len(),
            self.livestock.len()
        );

        Ok(TransitRecordDraft {
            purpose: self.purpose.clone(),
            from: self.from_farm.clone(),
            to: self.to_farm.clone(),
            livestock: self.livestock.clone(),
            checkpoints,
            status: TransitStatus::Preparing,
            distance: round_km(self.route.total_distance_km),
        })
    }
}

impl TransitRecord {
    /// Stored checkpoints, accepting either a JSON string or an inline array
    pub fn checkpoints(&self) -> Result<Vec<Checkpoint>> {
        match &self.checkpoints {
            Value::Null => Ok(Vec::new()),
            Value::String(raw) => parse_checkpoints(raw),
            other => serde_json::from_value(other.clone())
                .map_err(|e| HerdbookError::InvalidInput(format!("stored checkpoints are malformed: {}", e))),
        }
    }

    /// Rebuild the route, recomputing the unrounded distance
    pub fn route(&self) -> Result<TransitRoute> {
        Ok(TransitRoute::from_checkpoints(self.checkpoints()?))
    }
}

/// Parse checkpoints stored as a JSON array string. An empty string is an
/// empty route.
pub fn parse_checkpoints(raw: &str) -> Result<Vec<Checkpoint>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(trimmed)
        .map_err(|e| HerdbookError::InvalidInput(format!("stored checkpoints are malformed: {}", e)))
}
