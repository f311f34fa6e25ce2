use serde::{Deserialize, Serialize};
use std::fmt;

/// Display accent attached to risk levels, statuses and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Critical,
    Warning,
    Safe,
    Neutral,
    Info,
}

impl Accent {
    pub fn css_class(&self) -> &'static str {
        match self {
            Accent::Critical => "accent-critical",
            Accent::Warning => "accent-warning",
            Accent::Safe => "accent-safe",
            Accent::Neutral => "accent-neutral",
            Accent::Info => "accent-info",
        }
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// The two top-level views of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Analysis,
    Health,
}
