//! Subscriber mail.
//!
//! [`Notifier`] is the delivery seam; [`SmtpNotifier`] sends through lettre.
//! [`notify_new_posts`] runs after a reload and mails verified subscribers
//! about public posts the ledger has not seen yet.

use std::sync::Arc;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use quire_core::{AppConfig, ContentSnapshot, Store};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP host or sender address is not set.
    #[error("mail is not configured")]
    NotConfigured,

    #[error("invalid mail configuration: {0}")]
    Config(String),

    #[error("invalid address: {0}")]
    Address(String),

    #[error("smtp: {0}")]
    Smtp(String),
}

/// Outbound mail.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// Whether `send` can succeed at all.
    fn is_configured(&self) -> bool;
}

/// Remove CR and LF so values cannot inject extra headers.
pub fn sanitize_header(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Mail sent via an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build from configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::NotConfigured` when host or sender is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotifyError> {
        let (Some(host), Some(from)) = (config.smtp_host.as_deref(), config.from_email.as_deref()) else {
            return Err(NotifyError::NotConfigured);
        };
        if !config.smtp_configured() {
            return Err(NotifyError::NotConfigured);
        }

        let from: Mailbox = sanitize_header(from)
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        // Port 465 is implicit TLS; everything else upgrades with STARTTLS.
        let relay = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        };
        let mut builder = relay.map_err(|e| NotifyError::Config(e.to_string()))?.port(config.smtp_port);
        if let (Some(username), Some(password)) = (config.smtp_username.clone(), config.smtp_password.clone()) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self { transport: builder.build(), from })
    }
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let to: Mailbox = sanitize_header(to)
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(sanitize_header(subject))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport.send(email).await.map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Notifier used when SMTP is not configured.
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Pick the SMTP notifier when configured, otherwise a disabled one.
pub fn from_config(config: &AppConfig) -> Arc<dyn Notifier> {
    match SmtpNotifier::from_config(config) {
        Ok(notifier) => Arc::new(notifier),
        Err(NotifyError::NotConfigured) => {
            tracing::info!("smtp not configured, subscriber mail disabled");
            Arc::new(DisabledNotifier)
        }
        Err(err) => {
            tracing::warn!(error = %err, "smtp configuration rejected, subscriber mail disabled");
            Arc::new(DisabledNotifier)
        }
    }
}

/// Site details used in mail bodies.
#[derive(Debug, Clone)]
pub struct MailContext {
    pub base_url: String,
    pub site_title: String,
}

impl MailContext {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { base_url: config.base_url().to_string(), site_title: config.site_title.clone() }
    }
}

/// Send the verification mail for a new subscriber.
pub async fn send_verification(
    notifier: &dyn Notifier, ctx: &MailContext, email: &str, verify_token: &str,
) -> Result<(), NotifyError> {
    let link = format!("{}/subscribe/verify?token={verify_token}", ctx.base_url);
    let body = format!(
        "Verify your subscription to {}:\n\n{link}\n\nIf you didn't subscribe, ignore this email.",
        ctx.site_title
    );
    notifier.send(email, "Verify your subscription", &body).await
}

/// Counts from one notification pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyReport {
    pub posts: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Mail verified subscribers about public posts not yet in the ledger.
///
/// Each post is claimed in the ledger before any mail goes out, so a post is
/// announced at most once even when passes overlap. Send failures are logged
/// and do not stop the batch.
pub async fn notify_new_posts(
    store: &Store, notifier: &dyn Notifier, ctx: &MailContext, snapshot: &ContentSnapshot,
) -> Result<NotifyReport, quire_core::Error> {
    let mut report = NotifyReport::default();
    if !notifier.is_configured() {
        tracing::debug!("skipping notification pass, mail not configured");
        return Ok(report);
    }

    for post in snapshot.public_posts() {
        if store.is_notified(&post.slug).await? {
            continue;
        }
        if !store.mark_notified(&post.slug).await? {
            continue;
        }
        report.posts += 1;

        let recipients = store.verified_recipients().await?;
        let subject = format!("New post: {}", post.title);
        for recipient in recipients {
            let link = format!("{}/posts/{}", ctx.base_url, post.slug);
            let unsubscribe = format!("{}/subscribe/remove?token={}", ctx.base_url, recipient.unsubscribe_token);
            let body = format!(
                "New post on {}: {}\n\nRead it here: {link}\n\nUnsubscribe: {unsubscribe}",
                ctx.site_title, post.title
            );
            match notifier.send(&recipient.email, &subject, &body).await {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(slug = %post.slug, error = %err, "notification send failed");
                }
            }
        }
        tracing::info!(slug = %post.slug, sent = report.sent, "announced new post");
    }

    Ok(report)
}

/// Record every public post as announced without sending mail.
pub async fn seed_ledger(store: &Store, snapshot: &ContentSnapshot) -> Result<usize, quire_core::Error> {
    let slugs = snapshot.public_posts().map(|p| p.slug.clone()).collect();
    store.seed_notified(slugs).await
}
