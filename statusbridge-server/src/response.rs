//! Response bodies for the trigger endpoint, as JSON or as a small HTML page.

use serde::{Deserialize, Serialize};

use statusbridge_core::{LogEntry, SyncResult};

/// Body of a completed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub message: String,
    pub updated: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_log: Option<Vec<LogEntry>>,
}

impl SyncSummary {
    /// The per-item log is only included when `debug` was requested.
    pub fn from_result(result: SyncResult, debug: bool) -> Self {
        Self {
            message: format!(
                "Status sync complete: {} updated, {} skipped",
                result.updated, result.skipped
            ),
            updated: result.updated,
            skipped: result.skipped,
            debug_log: debug.then_some(result.entries),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn summary_html(summary: &SyncSummary) -> String {
    let (badge, color) = if summary.updated > 0 {
        ("&#10004;", "#4CAF50")
    } else {
        ("&#9888;", "#EAB308")
    };
    let rows = summary
        .debug_log
        .as_deref()
        .map(debug_table)
        .unwrap_or_default();
    page(&format!(
        "<h2 style='color: {color};'>{badge} Status Sync Complete</h2>\n\
         <p style='font-size: 18px;'>Updated: <b>{}</b> &nbsp;&nbsp; Skipped: <b>{}</b></p>\n{rows}",
        summary.updated, summary.skipped
    ))
}

pub fn error_html(message: &str) -> String {
    page(&format!(
        "<h3 style='color: #DC2626;'>&#10008; {}</h3>",
        escape_html(message)
    ))
}

fn debug_table(entries: &[LogEntry]) -> String {
    let mut html = String::from(
        "<table style='margin: 0 auto; font-size: 13px;'>\n\
         <tr><th>Version</th><th>Shot</th><th>Status</th><th>Mapped</th><th>Outcome</th></tr>\n",
    );
    for entry in entries {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            entry.version_id,
            entry.shot_id.map(|id| id.to_string()).unwrap_or_default(),
            escape_html(entry.source_status.as_deref().unwrap_or_default()),
            escape_html(entry.mapped_status.as_deref().unwrap_or_default()),
            escape_html(&entry.note),
        ));
    }
    html.push_str("</table>\n");
    html
}

fn page(body: &str) -> String {
    format!(
        "<html>\n<body style='font-family: Arial; text-align: center; padding: 20px;'>\n{body}\n</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
