// Delivery of the rendered digest: SMTP or a sendmail binary, or a file on dry run.

use anyhow::Context;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::{AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::{MailConfig, MailTransport};

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

pub fn subject(hostname: &str) -> String {
    format!("daily puppet(db) run summary for {}", hostname)
}

/// `<user>@<host>` of the invoking account.
pub fn default_sender() -> String {
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    format!("{}@{}", whoami::username(), host)
}

fn mailbox(addr: &str, role: &str) -> anyhow::Result<Mailbox> {
    addr.parse()
        .with_context(|| format!("invalid {} address {:?}", role, addr))
}

/// `multipart/alternative` message with a single `text/html` part. The transfer
/// encoding is picked per body, so long lines are folded.
pub fn build_message(from: &str, to: &[String], subject: &str, html: &str) -> anyhow::Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(from, "sender")?)
        .subject(subject);
    for addr in to {
        builder = builder.to(mailbox(addr, "recipient")?);
    }
    builder
        .multipart(MultiPart::alternative().singlepart(SinglePart::html(html.to_string())))
        .context("building message")
}

/// Outcome of `send_mail`, for logging by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    DryRun(PathBuf),
    Sent { recipients: usize },
}

#[instrument(skip(settings, html), fields(operation = "send_mail", recipients = to.len()))]
pub async fn send_mail(
    settings: &MailConfig,
    to: &[String],
    subject: &str,
    html: &str,
    dry_run: bool,
) -> anyhow::Result<Delivery> {
    if dry_run {
        let path = settings.dry_run_output.clone();
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        warn!("DRY RUN - not sending mail; wrote body to {}", path.display());
        return Ok(Delivery::DryRun(path));
    }

    anyhow::ensure!(!to.is_empty(), "no recipients given");
    let from = settings.from.clone().unwrap_or_else(default_sender);
    let message = build_message(&from, to, subject, html)?;

    match settings.transport {
        MailTransport::Smtp => {
            let mailer =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.smtp_host.as_str())
                    .port(settings.smtp_port)
                    .timeout(Some(SMTP_TIMEOUT))
                    .build();
            mailer.send(message).await.with_context(|| {
                format!("sending via SMTP {}:{}", settings.smtp_host, settings.smtp_port)
            })?;
        }
        MailTransport::Sendmail => {
            let mailer = AsyncSendmailTransport::<Tokio1Executor>::new_with_command(
                settings.sendmail_path.clone(),
            );
            mailer
                .send(message)
                .await
                .with_context(|| format!("sending via {}", settings.sendmail_path.display()))?;
        }
    }
    info!(from = %from, "sent mail to {}", to.join(", "));
    Ok(Delivery::Sent {
        recipients: to.len(),
    })
}
