//! Step reporting sinks
//!
//! The wait engine reports steps and attachments purely for observability.
//! Sinks are fallible, but callers go through `WaitEngine`, which logs and
//! discards sink failures so they never replace a wait or search outcome.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

/// Final status of a reported step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Passed,
    Failed,
    Broken,
}

/// Report sink, e.g. an Allure adapter
pub trait Reporter: Send + Sync {
    fn start_step(&self, description: &str) -> anyhow::Result<()>;

    fn attach(&self, name: &str, bytes: &[u8], mime_type: &str) -> anyhow::Result<()>;

    fn end_step(&self, outcome: StepOutcome) -> anyhow::Result<()>;
}

/// Reporter that writes steps to the tracing log
///
/// Binary attachments are logged at debug level as a JSON record with a
/// base64 payload; text attachments are logged verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn start_step(&self, description: &str) -> anyhow::Result<()> {
        info!(step = description, "Step started");
        Ok(())
    }

    fn attach(&self, name: &str, bytes: &[u8], mime_type: &str) -> anyhow::Result<()> {
        if mime_type.starts_with("text/") {
            info!(attachment = name, content = %String::from_utf8_lossy(bytes), "Attachment");
        } else {
            let record = json!({
                "name": name,
                "mime_type": mime_type,
                "size": bytes.len(),
                "data": BASE64.encode(bytes),
            });
            debug!(attachment = name, record = %record, "Attachment");
        }
        Ok(())
    }

    fn end_step(&self, outcome: StepOutcome) -> anyhow::Result<()> {
        info!(?outcome, "Step finished");
        Ok(())
    }
}

/// Event recorded by `MemoryReporter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    StepStarted { description: String },
    Attached { name: String, mime_type: String, size: usize },
    StepEnded { outcome: StepOutcome },
}

/// Reporter that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.events.lock())
    }
}

impl Reporter for MemoryReporter {
    fn start_step(&self, description: &str) -> anyhow::Result<()> {
        self.events.lock().push(ReportEvent::StepStarted {
            description: description.to_string(),
        });
        Ok(())
    }

    fn attach(&self, name: &str, bytes: &[u8], mime_type: &str) -> anyhow::Result<()> {
        self.events.lock().push(ReportEvent::Attached {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size: bytes.len(),
        });
        Ok(())
    }

    fn end_step(&self, outcome: StepOutcome) -> anyhow::Result<()> {
        self.events.lock().push(ReportEvent::StepEnded { outcome });
        Ok(())
    }
}

/// Attachment file name for a step: separators collapse to `_`, followed by
/// a compact ISO-8601 timestamp.
///
/// ```rust
/// # use kodegen_tools_wait::report::sanitized_file_name;
/// use chrono::{TimeZone, Utc};
/// let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// assert_eq!(
///     sanitized_file_name("Scrolled to Status, Name", at),
///     "Scrolled_to_Status_Name_2024-03-05T140709000Z.png"
/// );
/// ```
pub fn sanitized_file_name(description: &str, at: DateTime<Utc>) -> String {
    let mut sanitized = String::with_capacity(description.len());
    let mut in_separator = false;
    for ch in description.chars() {
        if matches!(ch, '|' | ',' | ' ') {
            if !in_separator {
                sanitized.push('_');
                in_separator = true;
            }
        } else {
            sanitized.push(ch);
            in_separator = false;
        }
    }

    let timestamp: String = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .chars()
        .filter(|c| !matches!(c, ':' | '.'))
        .collect();

    format!("{sanitized}_{timestamp}.png")
}
