//! Console report generation from analytics documents.
//!
//! Produces the pose statistics table, per-label bar charts, the session
//! verdict, and the overall movement scores as plain text lines.

use crate::document::{AnalyticsDocument, OverallScores, PoseStatistics, PoseSummary};
use diag_core::Result;
use serde_json::Value;

/// Width of the section rules.
const RULE_WIDTH: usize = 60;

/// Percentage points per bar character (a 100% share draws 50 characters).
const PERCENT_PER_BAR_CHAR: f64 = 2.0;

const BAR_CHAR: char = '█';

/// Column offset of the bar line, aligned under the table separator.
const BAR_INDENT: &str = "           │ ";

const NO_POSES_TIPS: [&str; 4] = [
    "   Make sure to:",
    "   1. Show your hand to the camera",
    "   2. Make clear poses (palm, 1, 2, 3, fist)",
    "   3. Hold each pose for 1-2 seconds",
];

/// Icon shown next to a pose label.
pub fn pose_icon(label: &str) -> &'static str {
    match label {
        "palm" => "🖐️",
        "1" => "☝️",
        "2" => "✌️",
        "3" => "🤟",
        "fist" => "✊",
        _ => "👋",
    }
}

/// Number of bar characters for a share of `percentage` percent.
pub fn bar_length(percentage: f64) -> usize {
    // NaN clamps to 0 through the saturating cast.
    (percentage.clamp(0.0, 100.0) / PERCENT_PER_BAR_CHAR).floor() as usize
}

/// Horizontal rule used between report sections.
pub fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Report renderer for analytics documents.
pub struct ReportRenderer;

impl ReportRenderer {
    /// Validate a decoded JSON document, then render it.
    pub fn render_value(value: &Value) -> Result<Vec<String>> {
        let doc = AnalyticsDocument::from_value(value)?;
        Ok(Self::render(&doc))
    }

    /// Render the full report: pose section followed by movement scores.
    pub fn render(doc: &AnalyticsDocument) -> Vec<String> {
        let mut lines = Self::pose_section(doc);
        lines.push(String::new());
        lines.push(rule('-'));
        lines.push(String::new());
        lines.extend(Self::scores_section(doc.overall_scores.as_ref()));
        lines
    }

    /// Pose statistics table, total, and verdict; or the "no poses" notice.
    pub fn pose_section(doc: &AnalyticsDocument) -> Vec<String> {
        if doc.pose_statistics.is_empty() {
            return Self::no_poses_notice(&doc.pose_statistics);
        }

        let summary = PoseSummary::from_document(doc);
        tracing::debug!(
            labels = summary.ranked.len(),
            total = %summary.total_detections,
            "Rendering pose statistics"
        );

        let mut lines = vec![
            "📊 POSE STATISTICS FROM MOST RECENT SESSION:".to_string(),
            rule('-'),
            String::new(),
        ];

        for (label, stat) in &summary.ranked {
            lines.push(format!(
                "{} {:<8} │ {:>3} times │ {:>5.1}% │ Conf: {:.2}",
                pose_icon(label),
                label.to_uppercase(),
                stat.count,
                stat.percentage,
                stat.average_confidence,
            ));
            lines.push(format!(
                "{}{}",
                BAR_INDENT,
                BAR_CHAR.to_string().repeat(bar_length(stat.percentage))
            ));
            lines.push(String::new());
        }

        lines.push(rule('-'));
        lines.push(format!("Total pose detections: {}", summary.total_detections));
        lines.push(String::new());
        lines.push("💡 INTERPRETATION:".to_string());
        lines.push(summary.verdict.message().to_string());
        lines
    }

    /// Movement score lines; missing scores read as 0.
    pub fn scores_section(scores: Option<&OverallScores>) -> Vec<String> {
        let scores = scores.cloned().unwrap_or_default();
        vec![
            "📈 OVERALL MOVEMENT SCORES:".to_string(),
            format!("  Smoothness:  {}/100", scores.smoothness),
            format!("  ROM:         {}/100", scores.rom),
            format!("  Trajectory:  {}/100", scores.trajectory),
            format!("  Consistency: {}/100", scores.consistency),
        ]
    }

    fn no_poses_notice(stats: &PoseStatistics) -> Vec<String> {
        let mut lines = vec!["⚠️  No poses detected in most recent session".to_string()];
        if *stats == PoseStatistics::Absent {
            lines.push("   This might be an old session recorded before pose detection".to_string());
        }
        lines.extend(NO_POSES_TIPS.iter().map(|tip| tip.to_string()));
        lines
    }
}
