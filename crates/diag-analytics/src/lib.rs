//! Analytics document model and console reporting for FlowState sessions.
//!
//! Validates the per-user analytics payload, ranks pose detections, and
//! renders the pose statistics and movement score report.

pub mod document;
pub mod reports;

pub use document::{AnalyticsDocument, OverallScores, PoseStat, PoseStatistics, PoseSummary, Verdict};
pub use reports::ReportRenderer;
