//! Severity labels and notification urgency.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a threat, decision or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Parse a label case-insensitively. Unknown labels are treated as
    /// `Medium`, the server's own default.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            "LOW" => Severity::Low,
            "INFO" | "INFORMATIONAL" => Severity::Info,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    /// Notification urgency for this severity.
    pub fn urgency(&self) -> Category {
        match self {
            Severity::Critical => Category::Urgent,
            Severity::High => Category::Warning,
            Severity::Medium | Severity::Low | Severity::Info => Category::Info,
        }
    }

    /// Marker color as 0xRRGGBB.
    pub fn color(&self) -> u32 {
        match self {
            Severity::Critical => 0xff_00_55,
            Severity::High => 0xff_8c_00,
            Severity::Medium => 0xff_d7_00,
            Severity::Low => 0x00_ff_9d,
            Severity::Info => 0x00_bf_ff,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        Severity::from_label(&label)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Urgent,
    Warning,
    Info,
    Success,
    Error,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Urgent => "urgent",
            Category::Warning => "warning",
            Category::Info => "info",
            Category::Success => "success",
            Category::Error => "error",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
