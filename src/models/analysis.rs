use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStatus {
    Success,
    Failed,
    #[serde(other)]
    Other,
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStatus::Success => write!(f, "success"),
            LoginStatus::Failed => write!(f, "failed"),
            LoginStatus::Other => write!(f, "unknown"),
        }
    }
}

/// One login event as submitted or as echoed back by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub username: String,
    pub ip_address: String,
    /// Passed through as received; never parsed locally.
    pub timestamp: String,
    pub location: String,
    pub device: String,
    pub login_status: LoginStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A log entry together with the analyzer's verdict for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Position of the entry in the submitted input, when the analyzer reports it.
    #[serde(default)]
    pub log_index: Option<usize>,
}

/// Complete verdict for one submission. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: String,
    pub overall_risk_score: RiskLevel,
    pub risk_summary: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub high_risk_logs: Vec<RiskVerdict>,
    #[serde(default)]
    pub medium_risk_logs: Vec<RiskVerdict>,
    #[serde(default)]
    pub low_risk_logs: Vec<RiskVerdict>,
}

impl AnalysisResult {
    pub fn bucket(&self, bucket: RiskBucket) -> &[RiskVerdict] {
        match bucket {
            RiskBucket::High => &self.high_risk_logs,
            RiskBucket::Medium => &self.medium_risk_logs,
            RiskBucket::Low => &self.low_risk_logs,
        }
    }

    pub fn total_entries(&self) -> usize {
        self.high_risk_logs.len() + self.medium_risk_logs.len() + self.low_risk_logs.len()
    }
}

/// One of the three partitions of an analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    High,
    Medium,
    Low,
}

impl RiskBucket {
    pub const ALL: [RiskBucket; 3] = [RiskBucket::High, RiskBucket::Medium, RiskBucket::Low];

    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBucket::High => "high",
            RiskBucket::Medium => "medium",
            RiskBucket::Low => "low",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            RiskBucket::High => RiskLevel::High,
            RiskBucket::Medium => RiskLevel::Medium,
            RiskBucket::Low => RiskLevel::Low,
        }
    }
}

/// Report formats offered by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Spreadsheet-friendly CSV report.
    Tabular,
    /// PDF report.
    Document,
}

impl ExportFormat {
    /// Path segment used by the export endpoint and the console routes.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Tabular => "csv",
            ExportFormat::Document => "pdf",
        }
    }

    pub fn from_path_segment(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Tabular),
            "pdf" => Some(Self::Document),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.path_segment()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Tabular => write!(f, "CSV"),
            ExportFormat::Document => write!(f, "PDF"),
        }
    }
}

/// Pre-built sample input advertised by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFileDescriptor {
    pub filename: String,
    pub display_name: String,
    pub log_count: u64,
    pub size_bytes: u64,
}
