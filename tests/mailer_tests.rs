// Mailer: dry-run output, message format, SMTP and sendmail delivery

use puppetdb_daily_report::config::{MailConfig, MailTransport};
use puppetdb_daily_report::mailer::{Delivery, build_message, send_mail, subject};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

fn mail_config(dir: &TempDir, transport: MailTransport) -> MailConfig {
    MailConfig {
        transport,
        smtp_host: "127.0.0.1".to_string(),
        smtp_port: 25,
        sendmail_path: PathBuf::from("/nonexistent/sendmail"),
        from: Some("reports@example.com".to_string()),
        dry_run_output: dir.path().join("output.html"),
    }
}

fn formatted(to: &[&str], subject: &str, html: &str) -> String {
    let to: Vec<String> = to.iter().map(|s| s.to_string()).collect();
    let msg = build_message("me@example.com", &to, subject, html).unwrap();
    String::from_utf8(msg.formatted()).unwrap()
}

/// What a fake SMTP relay saw during one session.
#[derive(Debug, Default)]
struct SmtpSession {
    mail_from: String,
    rcpt_to: Vec<String>,
    data: String,
}

/// Accepts one SMTP session on 127.0.0.1 and records the envelope and DATA.
async fn spawn_smtp_relay() -> (u16, tokio::task::JoinHandle<SmtpSession>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read);
        let mut session = SmtpSession::default();
        write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();
        loop {
            let mut line = String::new();
            if lines.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let cmd = line.trim_end().to_string();
            let upper = cmd.to_ascii_uppercase();
            if upper.starts_with("EHLO") || upper.starts_with("HELO") {
                write.write_all(b"250 relay.test\r\n").await.unwrap();
            } else if upper.starts_with("MAIL FROM:") {
                session.mail_from = cmd[10..].trim().to_string();
                write.write_all(b"250 OK\r\n").await.unwrap();
            } else if upper.starts_with("RCPT TO:") {
                session.rcpt_to.push(cmd[8..].trim().to_string());
                write.write_all(b"250 OK\r\n").await.unwrap();
            } else if upper == "DATA" {
                write.write_all(b"354 end with .\r\n").await.unwrap();
                loop {
                    let mut body = String::new();
                    if lines.read_line(&mut body).await.unwrap() == 0 {
                        break;
                    }
                    if body == ".\r\n" {
                        break;
                    }
                    session.data.push_str(&body);
                }
                write.write_all(b"250 queued\r\n").await.unwrap();
            } else if upper == "QUIT" {
                write.write_all(b"221 bye\r\n").await.unwrap();
                break;
            } else {
                write.write_all(b"250 OK\r\n").await.unwrap();
            }
        }
        session
    });
    (port, handle)
}

#[test]
fn mailer_subject() {
    assert_eq!(
        subject("puppetdb.example.com"),
        "daily puppet(db) run summary for puppetdb.example.com"
    );
}

#[test]
fn mailer_message_headers_and_parts() {
    let msg = formatted(&["a@example.com", "b@example.com"], "the subject", "<html></html>");
    assert!(msg.contains("From: me@example.com\r\n"));
    assert!(msg.contains("To: a@example.com, b@example.com\r\n"));
    assert!(msg.contains("Subject: the subject\r\n"));
    assert!(msg.contains("MIME-Version: 1.0\r\n"));
    assert!(msg.contains("multipart/alternative"));
    assert!(msg.contains("text/html"));
    assert!(msg.contains("<html></html>"));
}

#[test]
fn mailer_message_folds_long_lines() {
    let title = "x".repeat(3000);
    let html = format!("<html><td>Exec[{}]</td></html>", title);
    let msg = formatted(&["a@example.com"], "subj", &html);
    assert!(msg.split("\r\n").all(|line| line.len() <= 998));
    assert!(!msg.contains(&title));
}

#[test]
fn mailer_message_encodes_non_ascii_subject() {
    let msg = formatted(&["a@example.com"], "résumé für puppetdb", "<html></html>");
    let subject = msg
        .split("\r\n")
        .find(|l| l.starts_with("Subject:"))
        .unwrap()
        .to_ascii_lowercase();
    assert!(subject.contains("=?utf-8?"));
    assert!(msg.is_ascii());
}

#[test]
fn mailer_rejects_bad_recipient() {
    let err = build_message("me@example.com", &["not an address".to_string()], "s", "<p/>").unwrap_err();
    assert!(err.to_string().contains("recipient"));
}

#[tokio::test]
async fn mailer_dry_run_writes_file_and_sends_nothing() {
    let dir = TempDir::new().unwrap();
    // nothing listens on the relay port and sendmail does not exist
    let config = mail_config(&dir, MailTransport::Sendmail);
    let outcome = send_mail(&config, &[], "subj", "<html></html>", true)
        .await
        .unwrap();
    assert_eq!(outcome, Delivery::DryRun(dir.path().join("output.html")));
    let written = std::fs::read_to_string(dir.path().join("output.html")).unwrap();
    assert_eq!(written, "<html></html>");
}

#[tokio::test]
async fn mailer_sends_over_smtp() {
    let dir = TempDir::new().unwrap();
    let (port, relay) = spawn_smtp_relay().await;
    let mut config = mail_config(&dir, MailTransport::Smtp);
    config.smtp_port = port;

    let to = vec!["ops@example.com".to_string(), "dev@example.com".to_string()];
    let outcome = send_mail(&config, &to, "subj", "<html>report</html>", false)
        .await
        .unwrap();
    assert_eq!(outcome, Delivery::Sent { recipients: 2 });
    assert!(!dir.path().join("output.html").exists());

    let session = relay.await.unwrap();
    assert!(session.mail_from.contains("reports@example.com"));
    assert_eq!(session.rcpt_to.len(), 2);
    assert!(session.rcpt_to[0].contains("ops@example.com"));
    assert!(session.rcpt_to[1].contains("dev@example.com"));
    assert!(session.data.contains("Subject: subj\r\n"));
    assert!(session.data.contains("report"));
}

#[tokio::test]
async fn mailer_smtp_unreachable_is_an_error() {
    let dir = TempDir::new().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let mut config = mail_config(&dir, MailTransport::Smtp);
    config.smtp_port = port;
    let to = vec!["ops@example.com".to_string()];
    let err = send_mail(&config, &to, "subj", "<html></html>", false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sending via SMTP 127.0.0.1"));
}

#[cfg(unix)]
#[tokio::test]
async fn mailer_sends_through_sendmail() {
    let dir = TempDir::new().unwrap();
    let spool = dir.path().join("message.eml");
    let script = dir.path().join("sendmail");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho \"$@\" > {0}.args\ncat > {0}\n", spool.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = mail_config(&dir, MailTransport::Sendmail);
    config.sendmail_path = script;
    let to = vec!["ops@example.com".to_string()];
    let outcome = send_mail(&config, &to, "subj", "<html></html>", false)
        .await
        .unwrap();
    assert_eq!(outcome, Delivery::Sent { recipients: 1 });

    let message = std::fs::read_to_string(&spool).unwrap();
    assert!(message.contains("From: reports@example.com"));
    assert!(message.contains("To: ops@example.com"));
    assert!(message.contains("<html></html>"));
    let args = std::fs::read_to_string(format!("{}.args", spool.display())).unwrap();
    assert!(args.contains("ops@example.com"));
}

#[cfg(unix)]
#[tokio::test]
async fn mailer_sendmail_failure_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut config = mail_config(&dir, MailTransport::Sendmail);
    config.sendmail_path = PathBuf::from("false");
    let to = vec!["ops@example.com".to_string()];
    let err = send_mail(&config, &to, "subj", "<html></html>", false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sending via false"));
}

#[tokio::test]
async fn mailer_send_without_recipients_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = mail_config(&dir, MailTransport::Smtp);
    assert!(send_mail(&config, &[], "subj", "<html></html>", false)
        .await
        .is_err());
}
