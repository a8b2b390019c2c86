use consumo_core::delivery::{
    deliver, read_report_blocks, Directory, DryRunSender, MessageSender, SlackSender,
};
use consumo_core::error::ConsumoError;
use std::path::PathBuf;
use std::time::Duration;

use super::resolve_template;

pub fn run(
    txt_file: PathBuf,
    directory_file: PathBuf,
    token: Option<String>,
    dry_run: bool,
    delay_ms: u64,
    template_file: Option<PathBuf>,
) -> Result<(), ConsumoError> {
    let template = resolve_template(template_file.as_deref())?;
    let text = std::fs::read_to_string(&txt_file)?;
    let blocks = read_report_blocks(&text, &template.section_title);
    if blocks.is_empty() {
        eprintln!("No report blocks found in {}", txt_file.display());
        return Ok(());
    }
    let directory = Directory::load(&directory_file)?;

    let sender: Box<dyn MessageSender> = if dry_run {
        Box::new(DryRunSender)
    } else {
        let token = token.ok_or_else(|| {
            ConsumoError::Delivery("no Slack token; set SLACK_BOT_TOKEN or pass --token".into())
        })?;
        Box::new(SlackSender::new(token)?)
    };

    let report = deliver(
        &blocks,
        &directory,
        sender.as_ref(),
        Duration::from_millis(delay_ms),
    );

    eprintln!(
        "Sent {}, skipped {}, failed {}",
        report.sent.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (name, reason) in &report.skipped {
        eprintln!("  skipped {name}: {reason:?}");
    }
    for (name, error) in &report.failed {
        eprintln!("  failed {name}: {error}");
    }

    Ok(())
}
