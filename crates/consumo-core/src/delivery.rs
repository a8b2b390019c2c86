use crate::error::ConsumoError;
use crate::parsing::normalize::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// One person's slice of the text report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportBlock {
    pub name: String,
    pub body: String,
}

/// Split the text report back into per-person blocks.
///
/// Blocks start at each `--- <section_title>` heading; the rest of the
/// heading line (without the closing dashes) is the name and everything up
/// to the next heading is the body.
pub fn read_report_blocks(text: &str, section_title: &str) -> Vec<ReportBlock> {
    let delimiter = format!("--- {section_title}");
    text.split(delimiter.as_str())
        .skip(1)
        .filter_map(|chunk| {
            let chunk = chunk.trim();
            let (first, rest) = chunk.split_once('\n').unwrap_or((chunk, ""));
            let name = first.replace("---", "").trim().to_string();
            if name.is_empty() {
                tracing::warn!("report block without a name, skipped");
                return None;
            }
            tracing::debug!(name = %name, "report block read");
            Some(ReportBlock {
                name,
                body: rest.trim().to_string(),
            })
        })
        .collect()
}

/// Directory entry for one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "UID", default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default)]
    pub send_message: bool,
}

/// Person name to messaging identifier, matched ignoring case and spacing.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: BTreeMap<String, Recipient>,
}

impl Directory {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Recipient)>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for (name, recipient) in entries {
            map.entry(normalize_name(name.as_ref())).or_insert(recipient);
        }
        Directory { entries: map }
    }

    /// Parse the JSON object `{ "NAME": { "UID": "...", "send_message": true } }`.
    pub fn from_json(json: &str) -> Result<Self, ConsumoError> {
        let raw: BTreeMap<String, Recipient> = serde_json::from_str(json)?;
        Ok(Self::from_entries(raw))
    }

    pub fn load(path: &Path) -> Result<Self, ConsumoError> {
        let content = std::fs::read_to_string(path)?;
        let directory = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), entries = directory.len(), "directory loaded");
        Ok(directory)
    }

    pub fn lookup(&self, name: &str) -> Option<&Recipient> {
        self.entries.get(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trait for message delivery backends.
pub trait MessageSender {
    fn send(&self, recipient_id: &str, text: &str) -> Result<(), ConsumoError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Posts messages through the Slack Web API.
pub struct SlackSender {
    client: reqwest::blocking::Client,
    token: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackSender {
    pub fn new(token: impl Into<String>) -> Result<Self, ConsumoError> {
        Self::with_endpoint(token, SLACK_POST_MESSAGE_URL)
    }

    pub fn with_endpoint(
        token: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, ConsumoError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("consumo/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConsumoError::Delivery(e.to_string()))?;
        Ok(SlackSender {
            client,
            token: token.into(),
            endpoint: endpoint.into(),
        })
    }
}

impl MessageSender for SlackSender {
    fn send(&self, recipient_id: &str, text: &str) -> Result<(), ConsumoError> {
        let response: SlackResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "channel": recipient_id, "text": text }))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| ConsumoError::Delivery(e.to_string()))?;

        if response.ok {
            Ok(())
        } else {
            Err(ConsumoError::Delivery(format!(
                "Slack API error: {}",
                response.error.as_deref().unwrap_or("unknown")
            )))
        }
    }

    fn backend_name(&self) -> &str {
        "slack"
    }
}

/// Logs what would be sent without contacting anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSender;

impl MessageSender for DryRunSender {
    fn send(&self, recipient_id: &str, text: &str) -> Result<(), ConsumoError> {
        tracing::info!(recipient = %recipient_id, chars = text.chars().count(), "dry run, message not sent");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "dry-run"
    }
}

/// Why a block was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotInDirectory,
    ConsentOff,
    MissingUid,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    pub sent: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    pub failed: Vec<(String, String)>,
}

/// Greeting plus the block body in a code fence.
pub fn format_message(block: &ReportBlock) -> String {
    format!(
        "¡Hola {}! 👋 Aquí tienes tu resumen de consumos de este mes:\n\n```\n{}\n```",
        title_case(&block.name),
        block.body
    )
}

/// Uppercase the first letter of every word, lowercase the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;
    for c in name.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

/// Send each block to its recipient, one at a time.
///
/// Blocks whose person is missing from the directory, has delivery turned
/// off or has no identifier are skipped. A failed send is recorded and the
/// batch continues; `pause` is waited between consecutive sends.
pub fn deliver(
    blocks: &[ReportBlock],
    directory: &Directory,
    sender: &dyn MessageSender,
    pause: Duration,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    let mut attempted = false;

    for block in blocks {
        let recipient = match directory.lookup(&block.name) {
            None => Err(SkipReason::NotInDirectory),
            Some(r) if !r.send_message => Err(SkipReason::ConsentOff),
            Some(r) => r
                .uid
                .as_deref()
                .filter(|uid| !uid.trim().is_empty())
                .ok_or(SkipReason::MissingUid),
        };
        let uid = match recipient {
            Ok(uid) => uid,
            Err(reason) => {
                tracing::warn!(name = %block.name, reason = ?reason, "report not sent");
                report.skipped.push((block.name.clone(), reason));
                continue;
            }
        };

        if attempted && !pause.is_zero() {
            std::thread::sleep(pause);
        }
        attempted = true;

        match sender.send(uid, &format_message(block)) {
            Ok(()) => {
                tracing::info!(name = %block.name, recipient = %uid, backend = sender.backend_name(), "report sent");
                report.sent.push(block.name.clone());
            }
            Err(e) => {
                tracing::error!(name = %block.name, recipient = %uid, error = %e, "report delivery failed");
                report.failed.push((block.name.clone(), e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<(String, String)>>,
        fail_for: Option<&'static str>,
    }

    impl MessageSender for Recorder {
        fn send(&self, recipient_id: &str, text: &str) -> Result<(), ConsumoError> {
            if self.fail_for == Some(recipient_id) {
                return Err(ConsumoError::Delivery("channel_not_found".into()));
            }
            self.sent
                .borrow_mut()
                .push((recipient_id.to_string(), text.to_string()));
            Ok(())
        }

        fn backend_name(&self) -> &str {
            "recorder"
        }
    }

    const REPORT: &str = "      Monthly Consumption January

           --- Consumos JUAN PEREZ ---
FECHA      DESCRIPCIÓN    PESOS
05-Ene-24  SUPERMERCADO   600.00
           TOTAL CONSUMOS DE JUAN PEREZ   600.00

           --- Consumos ANA GOMEZ ---
FECHA      DESCRIPCIÓN    PESOS
           TOTAL CONSUMOS DE ANA GOMEZ      0.00
";

    fn directory() -> Directory {
        Directory::from_json(
            r#"{
                "juan  perez": { "UID": "U001", "send_message": true },
                "Ana Gomez": { "UID": "U002", "send_message": false },
                "Beto": { "send_message": true }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_read_report_blocks() {
        let blocks = read_report_blocks(REPORT, "Consumos");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "JUAN PEREZ");
        assert!(blocks[0].body.starts_with("FECHA"));
        assert!(blocks[0].body.ends_with("TOTAL CONSUMOS DE JUAN PEREZ   600.00"));
        assert_eq!(blocks[1].name, "ANA GOMEZ");
        assert_eq!(blocks[1].body.lines().count(), 2);
    }

    #[test]
    fn test_empty_block_is_skipped() {
        let blocks = read_report_blocks("--- Consumos ---\n--- Consumos ANA\nx", "Consumos");
        assert_eq!(blocks, vec![ReportBlock { name: "ANA".into(), body: "x".into() }]);
    }

    #[test]
    fn test_directory_lookup_ignores_case_and_spacing() {
        let dir = directory();
        assert_eq!(dir.lookup("JUAN PEREZ").and_then(|r| r.uid.as_deref()), Some("U001"));
        assert_eq!(dir.lookup(" ana gomez ").map(|r| r.send_message), Some(false));
        assert!(dir.lookup("NADIE").is_none());
        assert_eq!(dir.len(), 3);
    }

    #[test]
    fn test_deliver_sends_and_skips() {
        let mut blocks = read_report_blocks(REPORT, "Consumos");
        blocks.push(ReportBlock { name: "BETO".into(), body: "x".into() });
        blocks.push(ReportBlock { name: "CARLA".into(), body: "x".into() });

        let sender = Recorder::default();
        let report = deliver(&blocks, &directory(), &sender, Duration::ZERO);

        assert_eq!(report.sent, vec!["JUAN PEREZ".to_string()]);
        assert_eq!(
            report.skipped,
            vec![
                ("ANA GOMEZ".to_string(), SkipReason::ConsentOff),
                ("BETO".to_string(), SkipReason::MissingUid),
                ("CARLA".to_string(), SkipReason::NotInDirectory),
            ]
        );
        let sent = sender.sent.borrow();
        assert_eq!(sent[0].0, "U001");
        assert!(sent[0].1.starts_with("¡Hola Juan Perez! 👋"));
        assert!(sent[0].1.contains("```\nFECHA"));
        assert!(sent[0].1.ends_with("600.00\n```"));
    }

    #[test]
    fn test_failed_send_does_not_stop_batch() {
        let dir = Directory::from_entries([
            ("ANA", Recipient { uid: Some("U1".into()), send_message: true }),
            ("BETO", Recipient { uid: Some("U2".into()), send_message: true }),
        ]);
        let blocks = vec![
            ReportBlock { name: "ANA".into(), body: "a".into() },
            ReportBlock { name: "BETO".into(), body: "b".into() },
        ];
        let sender = Recorder {
            fail_for: Some("U1"),
            ..Default::default()
        };
        let report = deliver(&blocks, &dir, &sender, Duration::ZERO);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ANA");
        assert_eq!(report.sent, vec!["BETO".to_string()]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("JUAN PEREZ"), "Juan Perez");
        assert_eq!(title_case("MARÍA DEL CARMEN"), "María Del Carmen");
        assert_eq!(title_case("J. O'NEIL"), "J. O'Neil");
    }
}
