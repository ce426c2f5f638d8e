use crate::error::HerdbookError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Core domain records shared by the lineage and transit modules

/// An animal as seen by the pedigree resolver. Parent references may be
/// absent, dangling, or even point back at a descendant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: String,
    pub name: Option<String>,
    pub tag_code: Option<String>,
    pub mother_id: Option<String>,
    pub father_id: Option<String>,
    pub image_ref: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Animal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            tag_code: None,
            mother_id: None,
            father_id: None,
            image_ref: None,
            date_of_birth: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag_code: impl Into<String>) -> Self {
        self.tag_code = Some(tag_code.into());
        self
    }

    pub fn with_mother(mut self, mother_id: impl Into<String>) -> Self {
        self.mother_id = Some(mother_id.into());
        self
    }

    pub fn with_father(mut self, father_id: impl Into<String>) -> Self {
        self.father_id = Some(father_id.into());
        self
    }

    pub fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    pub fn has_parent_links(&self) -> bool {
        self.mother_id.is_some() || self.father_id.is_some()
    }

    /// Label used wherever an animal is listed: `"<name> (<tag>)"`
    pub fn display_label(&self) -> String {
        let name = self.name.as_deref().unwrap_or("Unnamed");
        match &self.tag_code {
            Some(tag) => format!("{} ({})", name, tag),
            None => name.to_string(),
        }
    }

    /// Whole calendar years between the date of birth and `today`
    pub fn age_in_years(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        if dob > today {
            return None;
        }

        let mut years = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }

        u32::try_from(years).ok()
    }
}

/// Livestock record exactly as the record store serves it. Unset relation
/// and file fields come back as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivestockRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "RFID_Tag", default)]
    pub rfid_tag: String,
    #[serde(default)]
    pub mother: String,
    #[serde(default)]
    pub father: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub in_transit: bool,
}

impl From<LivestockRecord> for Animal {
    fn from(record: LivestockRecord) -> Self {
        let date_of_birth = parse_record_date(&record.date_of_birth);
        Self {
            id: record.id,
            name: non_empty(record.name),
            tag_code: non_empty(record.rfid_tag),
            mother_id: non_empty(record.mother),
            father_id: non_empty(record.father),
            image_ref: non_empty(record.image),
            date_of_birth,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the date part of a record-store datetime (`2021-03-04 00:00:00.000Z`
/// or RFC 3339)
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// A validated position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, HerdbookError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(HerdbookError::InvalidInput(format!(
                "coordinates must be finite numbers, got ({}, {})",
                lat, lng
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(HerdbookError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(HerdbookError::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                lng
            )));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

#[derive(Deserialize)]
struct RawPoint {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = HerdbookError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        let (lat, lng) = require_coordinates(raw.lat, raw.lng)?;
        GeoPoint::new(lat, lng)
    }
}

fn require_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(f64, f64), HerdbookError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok((lat, lng)),
        (None, _) => Err(HerdbookError::InvalidInput(
            "checkpoint is missing latitude".to_string(),
        )),
        (_, None) => Err(HerdbookError::InvalidInput(
            "checkpoint is missing longitude".to_string(),
        )),
    }
}

/// A route point with the moment it was recorded. Serialised flat as
/// `{"lat": .., "lng": .., "timestamp": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCheckpoint", into = "RawCheckpoint")]
pub struct Checkpoint {
    pub point: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Result<Self, HerdbookError> {
        Ok(Self {
            point: GeoPoint::new(lat, lng)?,
            timestamp,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct RawCheckpoint {
    lat: Option<f64>,
    lng: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawCheckpoint> for Checkpoint {
    type Error = HerdbookError;

    fn try_from(raw: RawCheckpoint) -> Result<Self, Self::Error> {
        let (lat, lng) = require_coordinates(raw.lat, raw.lng)?;
        Checkpoint::new(lat, lng, raw.timestamp)
    }
}

impl From<Checkpoint> for RawCheckpoint {
    fn from(checkpoint: Checkpoint) -> Self {
        Self {
            lat: Some(checkpoint.point.lat),
            lng: Some(checkpoint.point.lng),
            timestamp: checkpoint.timestamp,
        }
    }
}

/// Lifecycle of a transit record. Values the dashboard does not know are
/// kept verbatim so that writing a record back never rewrites its status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitStatus {
    #[default]
    Preparing,
    InTransit,
    Completed,
    Unknown(String),
}

impl TransitStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransitStatus::Preparing => "preparing",
            TransitStatus::InTransit => "in-transit",
            TransitStatus::Completed => "completed",
            TransitStatus::Unknown(raw) => raw,
        }
    }
}

impl From<String> for TransitStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "preparing" => TransitStatus::Preparing,
            "in-transit" => TransitStatus::InTransit,
            "completed" => TransitStatus::Completed,
            _ => TransitStatus::Unknown(raw),
        }
    }
}

impl From<TransitStatus> for String {
    fn from(status: TransitStatus) -> Self {
        match status {
            TransitStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TransitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label() {
        let animal = Animal::new("a1").with_name("Daisy").with_tag("ZW-0042");
        assert_eq!(animal.display_label(), "Daisy (ZW-0042)");

        let unnamed = Animal::new("a2");
        assert_eq!(unnamed.display_label(), "Unnamed");
    }

    #[test]
    fn test_age_in_years() {
        let animal = Animal::new("a1")
            .with_date_of_birth(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap());

        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(animal.age_in_years(before_birthday), Some(3));
        assert_eq!(animal.age_in_years(on_birthday), Some(4));

        let before_birth = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert_eq!(animal.age_in_years(before_birth), None);
        assert_eq!(Animal::new("a2").age_in_years(on_birthday), None);
    }

    #[test]
    fn test_livestock_record_conversion() {
        let json = r#"{
            "id": "cow1",
            "name": "Daisy",
            "RFID_Tag": "ZW-0042",
            "mother": "cow0",
            "father": "",
            "image": "",
            "dateOfBirth": "2021-03-04 00:00:00.000Z",
            "inTransit": false
        }"#;
        let record: LivestockRecord = serde_json::from_str(json).unwrap();
        let animal: Animal = record.into();

        assert_eq!(animal.id, "cow1");
        assert_eq!(animal.tag_code.as_deref(), Some("ZW-0042"));
        assert_eq!(animal.mother_id.as_deref(), Some("cow0"));
        assert_eq!(animal.father_id, None);
        assert_eq!(animal.image_ref, None);
        assert_eq!(animal.date_of_birth, NaiveDate::from_ymd_opt(2021, 3, 4));
    }

    #[test]
    fn test_parse_record_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2022, 11, 30);
        assert_eq!(parse_record_date("2022-11-30 08:15:00.000Z"), expected);
        assert_eq!(parse_record_date("2022-11-30T08:15:00Z"), expected);
        assert_eq!(parse_record_date("2022-11-30"), expected);
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("not a date"), None);
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(-17.824858, 31.053028).is_ok());
        assert!(GeoPoint::new(f64::NAN, 31.0).is_err());
        assert!(GeoPoint::new(-17.8, f64::INFINITY).is_err());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_checkpoint_json_shape() {
        let json = r#"{"lat": -17.824858, "lng": 31.053028, "timestamp": "2024-05-01T08:00:00.000Z"}"#;
        let checkpoint: Checkpoint = serde_json::from_str(json).unwrap();
        assert_eq!(checkpoint.point.lat(), -17.824858);

        let value = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(value["lng"], serde_json::json!(31.053028));
        assert!(value.get("point").is_none());
    }

    #[test]
    fn test_checkpoint_missing_coordinate_rejected() {
        let json = r#"{"lat": -17.8, "timestamp": "2024-05-01T08:00:00Z"}"#;
        let err = serde_json::from_str::<Checkpoint>(json).unwrap_err();
        assert!(err.to_string().contains("longitude"), "Error was: {}", err);
    }

    #[test]
    fn test_transit_status_wire_values() {
        let status: TransitStatus = serde_json::from_str("\"in-transit\"").unwrap();
        assert_eq!(status, TransitStatus::InTransit);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in-transit\"");

        let status: TransitStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TransitStatus::Completed);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"completed\"");

        assert_eq!(serde_json::to_string(&TransitStatus::Preparing).unwrap(), "\"preparing\"");
    }

    #[test]
    fn test_transit_status_unknown_value_is_preserved() {
        let status: TransitStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(status, TransitStatus::Unknown("delivered".to_string()));
        assert_eq!(status.to_string(), "delivered");
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"delivered\"");

        // the snake_case spelling is not the dashboard's
        let status: TransitStatus = serde_json::from_str("\"in_transit\"").unwrap();
        assert_eq!(status, TransitStatus::Unknown("in_transit".to_string()));
    }
}
