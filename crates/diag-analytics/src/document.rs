//! Analytics document model and pose aggregation.
//!
//! Parses the JSON returned by the analytics endpoint into typed records,
//! rejecting malformed values, and derives the ranked pose summary used by
//! the report renderer.

use diag_core::{DiagError, Result};
use serde_json::{Map, Number, Value};

/// Detection statistics for one pose label.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseStat {
    /// Number of detections of this label in the session.
    pub count: u64,
    /// Mean detector confidence (0.0..1.0).
    pub average_confidence: f64,
    /// Share of total detections (0.0..100.0), computed by the server.
    pub percentage: f64,
}

/// Session-level movement quality scores (0..100 each).
///
/// Kept as JSON numbers so `82` and `82.0` print the way the server sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallScores {
    pub smoothness: Number,
    pub rom: Number,
    pub trajectory: Number,
    pub consistency: Number,
}

impl Default for OverallScores {
    fn default() -> Self {
        Self {
            smoothness: Number::from(0),
            rom: Number::from(0),
            trajectory: Number::from(0),
            consistency: Number::from(0),
        }
    }
}

/// State of the `poseStatistics` field in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseStatistics {
    /// Key missing (or null); typically a session recorded before pose detection.
    Absent,
    /// Labels in document order.
    Present(Vec<(String, PoseStat)>),
}

impl PoseStatistics {
    /// Entries in document order; empty when absent.
    pub fn entries(&self) -> &[(String, PoseStat)] {
        match self {
            Self::Absent => &[],
            Self::Present(entries) => entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Analytics for one user's most recent session.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsDocument {
    pub pose_statistics: PoseStatistics,
    pub overall_scores: Option<OverallScores>,
}

impl AnalyticsDocument {
    /// Parse a JSON document from text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Validate and convert a decoded JSON value.
    ///
    /// Missing optional sections are "no data"; values of the wrong shape
    /// fail with [`DiagError::MalformedDocument`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| DiagError::malformed("$", "document must be a JSON object"))?;

        let pose_statistics = match root.get("poseStatistics") {
            None | Some(Value::Null) => PoseStatistics::Absent,
            Some(Value::Object(map)) => PoseStatistics::Present(parse_pose_map(map)?),
            Some(_) => {
                return Err(DiagError::malformed("poseStatistics", "must be an object"));
            }
        };

        let overall_scores = match root.get("overallScores") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(parse_scores(map)?),
            Some(_) => {
                return Err(DiagError::malformed("overallScores", "must be an object"));
            }
        };

        Ok(Self {
            pose_statistics,
            overall_scores,
        })
    }
}

fn parse_pose_map(map: &Map<String, Value>) -> Result<Vec<(String, PoseStat)>> {
    map.iter()
        .map(|(label, raw)| {
            let path = format!("poseStatistics.{}", label);
            let fields = raw
                .as_object()
                .ok_or_else(|| DiagError::malformed(&path, "must be an object"))?;

            let count = fields
                .get("count")
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    DiagError::malformed(format!("{}.count", path), "must be a non-negative integer")
                })?;
            let average_confidence = required_number(fields, &path, "averageConfidence")?;
            let percentage = required_number(fields, &path, "percentage")?;

            Ok((
                label.clone(),
                PoseStat {
                    count,
                    average_confidence,
                    percentage,
                },
            ))
        })
        .collect()
}

fn required_number(fields: &Map<String, Value>, path: &str, key: &str) -> Result<f64> {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| DiagError::malformed(format!("{}.{}", path, key), "must be a number"))
}

fn parse_scores(map: &Map<String, Value>) -> Result<OverallScores> {
    let score = |key: &str| -> Result<Number> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(Number::from(0)),
            Some(Value::Number(n)) => Ok(n.clone()),
            Some(_) => Err(DiagError::malformed(
                format!("overallScores.{}", key),
                "must be a number",
            )),
        }
    };

    Ok(OverallScores {
        smoothness: score("smoothness")?,
        rom: score("rom")?,
        trajectory: score("trajectory")?,
        consistency: score("consistency")?,
    })
}

/// Session quality verdict derived from the total detection count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Good,
    Moderate,
    Low,
}

impl Verdict {
    pub fn from_total(total_detections: u128) -> Self {
        if total_detections > 20 {
            Self::Good
        } else if total_detections > 10 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Good => "✅ Good session! Multiple poses detected with variety",
            Self::Moderate => "⚠️  Moderate session - try holding poses longer",
            Self::Low => "❌ Low detection - make sure poses are clear and confident",
        }
    }
}

/// Pose labels ranked by detection count, with totals.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSummary<'a> {
    /// Entries sorted by count, descending; ties keep document order.
    pub ranked: Vec<(&'a str, &'a PoseStat)>,
    /// Sum of all counts; wide enough that no set of `u64` counts overflows it.
    pub total_detections: u128,
    pub verdict: Verdict,
}

impl<'a> PoseSummary<'a> {
    pub fn from_document(doc: &'a AnalyticsDocument) -> Self {
        let mut ranked: Vec<(&str, &PoseStat)> = doc
            .pose_statistics
            .entries()
            .iter()
            .map(|(label, stat)| (label.as_str(), stat))
            .collect();
        // Stable: equal counts stay in document order.
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));

        let total_detections: u128 = ranked.iter().map(|(_, stat)| u128::from(stat.count)).sum();

        Self {
            ranked,
            total_detections,
            verdict: Verdict::from_total(total_detections),
        }
    }
}
