use crate::models::analysis::{AnalysisResult, RiskBucket, RiskLevel, RiskVerdict};
use crate::models::view::Accent;
use serde::Serialize;
use std::collections::HashMap;

/// Low-risk entries shown before the rest is summarized as a count.
pub const LOW_RISK_DISPLAY_LIMIT: usize = 5;

pub fn risk_accent(level: RiskLevel) -> Accent {
    match level {
        RiskLevel::High => Accent::Critical,
        RiskLevel::Medium => Accent::Warning,
        RiskLevel::Low => Accent::Safe,
        RiskLevel::Unknown => Accent::Neutral,
    }
}

/// Header marker for the overall score.
pub fn risk_icon(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "🚨",
        RiskLevel::Medium => "⚠️",
        _ => "✅",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BucketCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl BucketCounts {
    pub fn of(result: &AnalysisResult) -> Self {
        Self {
            high: result.high_risk_logs.len(),
            medium: result.medium_risk_logs.len(),
            low: result.low_risk_logs.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Identifies one rendered entry: its bucket and position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub bucket: RiskBucket,
    pub index: usize,
}

impl EntryKey {
    pub fn new(bucket: RiskBucket, index: usize) -> Self {
        Self { bucket, index }
    }
}

/// Expanded/collapsed state of each entry's detail section.
///
/// Entries are collapsed unless toggled; toggling one key never touches another.
#[derive(Debug, Default)]
pub struct DetailToggles {
    expanded: HashMap<EntryKey, bool>,
}

impl DetailToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, key: EntryKey) -> bool {
        self.expanded.get(&key).copied().unwrap_or(false)
    }

    /// Flips one entry and returns its new state.
    pub fn toggle(&mut self, key: EntryKey) -> bool {
        let state = self.expanded.entry(key).or_insert(false);
        *state = !*state;
        *state
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    /// 1-based position within the bucket.
    pub position: usize,
    pub index: usize,
    pub accent: Accent,
    pub expanded: bool,
    pub verdict: RiskVerdict,
}

impl EntryView {
    pub fn has_risk_factors(&self) -> bool {
        !self.verdict.risk_factors.is_empty()
    }

    /// The analyzer's explanation, unless it is missing or blank.
    pub fn explanation(&self) -> Option<&str> {
        self.verdict
            .explanation
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketView {
    pub bucket: RiskBucket,
    pub accent: Accent,
    pub total: usize,
    pub entries: Vec<EntryView>,
    /// Entries left out of `entries`; only ever set for the low-risk bucket.
    pub overflow: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub analysis_id: String,
    pub overall_risk: RiskLevel,
    pub overall_accent: Accent,
    pub overall_icon: &'static str,
    pub risk_summary: String,
    pub recommendations: Vec<String>,
    pub counts: BucketCounts,
    /// Non-empty buckets in display order: high, medium, low.
    pub buckets: Vec<BucketView>,
}

/// Derives everything the results view shows from a received verdict.
/// Nothing here re-classifies entries; bucket membership is taken as given.
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn display_limit(bucket: RiskBucket) -> Option<usize> {
        match bucket {
            RiskBucket::Low => Some(LOW_RISK_DISPLAY_LIMIT),
            RiskBucket::High | RiskBucket::Medium => None,
        }
    }

    pub fn bucket_view(
        result: &AnalysisResult,
        bucket: RiskBucket,
        toggles: &DetailToggles,
    ) -> BucketView {
        let logs = result.bucket(bucket);
        let shown = Self::display_limit(bucket)
            .map(|limit| limit.min(logs.len()))
            .unwrap_or(logs.len());

        let entries = logs[..shown]
            .iter()
            .enumerate()
            .map(|(index, verdict)| EntryView {
                position: index + 1,
                index,
                accent: risk_accent(verdict.risk_level),
                expanded: toggles.is_expanded(EntryKey::new(bucket, index)),
                verdict: verdict.clone(),
            })
            .collect();

        BucketView {
            bucket,
            accent: risk_accent(bucket.risk_level()),
            total: logs.len(),
            entries,
            overflow: (logs.len() > shown).then(|| logs.len() - shown),
        }
    }

    pub fn summarize(result: &AnalysisResult, toggles: &DetailToggles) -> ResultView {
        let buckets = RiskBucket::ALL
            .iter()
            .filter(|bucket| !result.bucket(**bucket).is_empty())
            .map(|bucket| Self::bucket_view(result, *bucket, toggles))
            .collect();

        ResultView {
            analysis_id: result.analysis_id.clone(),
            overall_risk: result.overall_risk_score,
            overall_accent: risk_accent(result.overall_risk_score),
            overall_icon: risk_icon(result.overall_risk_score),
            risk_summary: result.risk_summary.clone(),
            recommendations: result.recommendations.clone(),
            counts: BucketCounts::of(result),
            buckets,
        }
    }
}
