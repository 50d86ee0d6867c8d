//! Markdown memo rendering of the final report.

use super::{write_file, ReportBundle, ReportSink};
use crate::config::ReportConfig;
use crate::errors::SinkError;
use crate::schema::{EvaluatedStrategy, FinalReport};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::fmt::Write as _;
use std::path::PathBuf;

/// The memo's address block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoHeader {
    /// `TO:` line.
    pub recipient: String,
    /// `FROM:` line.
    pub sender: String,
    /// `SUBJECT:` line.
    pub subject: String,
}

impl From<&ReportConfig> for MemoHeader {
    fn from(config: &ReportConfig) -> Self {
        Self {
            recipient: config.recipient.clone(),
            sender: config.sender.clone(),
            subject: config.subject.clone(),
        }
    }
}

impl Default for MemoHeader {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

/// Writes the report as a Markdown memorandum.
#[derive(Debug, Clone)]
pub struct MarkdownMemoSink {
    path: PathBuf,
    header: MemoHeader,
    date: Option<NaiveDate>,
}

impl MarkdownMemoSink {
    /// Creates a sink writing to `path`, dated on the day it writes.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, header: MemoHeader) -> Self {
        Self {
            path: path.into(),
            header,
            date: None,
        }
    }

    /// Pins the memo date.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Renders the memo text.
    #[must_use]
    pub fn render(&self, report: &FinalReport) -> String {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let mut out = String::new();

        let _ = writeln!(out, "# MEMORANDUM FOR THE RECORD\n");
        let _ = writeln!(out, "**TO:** {}  ", self.header.recipient);
        let _ = writeln!(out, "**FROM:** {}  ", self.header.sender);
        let _ = writeln!(out, "**DATE:** {}  ", date.format("%B %d, %Y"));
        let _ = writeln!(out, "**SUBJECT:** {}\n", self.header.subject);

        section(&mut out, "1. DIAGNOSIS", &report.diagnosis_summary);

        let _ = writeln!(out, "## 2. RECOMMENDED STRATEGIC ACTIONS\n");
        for action in &report.detailed_actions {
            let _ = writeln!(out, "- **{}**", action.name.trim());
            for line in action.explanation.trim().lines() {
                let _ = writeln!(out, "  {line}");
            }
            out.push('\n');
        }

        section(&mut out, "3. STRATEGIC ANALYSIS & FORECAST", &report.forecast_analysis);
        section(
            &mut out,
            "4. COMMENTARY: AGENT & SELLER BEHAVIOUR",
            &report.behavioural_commentary,
        );

        out.push_str("---\n\n");
        out.push_str(&disclaimer());
        out
    }
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "## {title}\n");
    let _ = writeln!(out, "{}\n", body.trim());
}

fn disclaimer() -> String {
    format!(
        "*Scoring Method Disclaimer:*\n\n\
         1. Individual scores (Impact, Speed, Cost-Risk) are generated on a scale of 0-10.\n\
         2. The Weighted Overall Score for each strategy is calculated as: \
         (Impact * {}) + (Speed * {}) + (Cost-Risk * {}).\n\
         3. The final simulation score is the average of the top strategies' overall scores, \
         converted to a 0.0-1.0 scale.\n",
        EvaluatedStrategy::IMPACT_WEIGHT,
        EvaluatedStrategy::SPEED_WEIGHT,
        EvaluatedStrategy::COST_RISK_WEIGHT,
    )
}

#[async_trait]
impl ReportSink for MarkdownMemoSink {
    async fn write(&self, bundle: &ReportBundle) -> Result<Option<PathBuf>, SinkError> {
        let Some(report) = &bundle.report else {
            return Ok(None);
        };
        write_file(&self.path, &self.render(report)).await?;
        Ok(Some(self.path.clone()))
    }
}
