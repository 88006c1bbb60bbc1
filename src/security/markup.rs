//! Display-text sanitization.
//!
//! Alert messages, threat descriptions and decision text come from the
//! server and ultimately from attacker-controlled logs (the WAF samples
//! literally contain `<script>` payloads). Everything shown to the operator
//! is HTML-escaped; markup patterns are detected and logged.

use lazy_static::lazy_static;
use regex::Regex;

use crate::logging::structured::LogContext;

/// Longest text kept for a single display field.
pub const MAX_DISPLAY_CHARS: usize = 2_000;

lazy_static! {
    /// Active-content patterns
    static ref MARKUP_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<script[^>]*>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
        Regex::new(r"(?i)<iframe[^>]*>").unwrap(),
        Regex::new(r"(?i)<object[^>]*>").unwrap(),
        Regex::new(r"(?i)<embed[^>]*>").unwrap(),
    ];

    /// Terminal control sequences (for console renderers)
    static ref CONTROL_PATTERN: Regex = Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").unwrap();
}

/// Detection counts for one piece of text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarkupScan {
    pub markup_detections: usize,
    pub control_chars: usize,
    pub truncated: bool,
}

impl MarkupScan {
    pub fn has_detections(&self) -> bool {
        self.markup_detections > 0 || self.control_chars > 0
    }
}

/// Scan `text` without modifying it.
pub fn scan_text(text: &str) -> MarkupScan {
    MarkupScan {
        markup_detections: MARKUP_PATTERNS.iter().filter(|p| p.is_match(text)).count(),
        control_chars: CONTROL_PATTERN.find_iter(text).count(),
        truncated: text.chars().count() > MAX_DISPLAY_CHARS,
    }
}

/// Escape `text` for display, stripping control characters and truncating.
pub fn sanitize_display_text(text: &str, ctx: &LogContext) -> String {
    let scan = scan_text(text);
    if scan.has_detections() {
        log::warn!(
            "{} MARKUP_DETECTED patterns={} control_chars={} len={}",
            ctx,
            scan.markup_detections,
            scan.control_chars,
            text.len()
        );
    }

    let stripped = CONTROL_PATTERN.replace_all(text, "");
    let mut out = String::with_capacity(stripped.len());
    for ch in stripped.chars().take(MAX_DISPLAY_CHARS) {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    if scan.truncated {
        out.push('…');
    }
    out
}
