use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{SmtpTransport, Transport};
use tracing::warn;

use crate::config::MailConfig;

use super::{DeliveryError, DeliveryReport, Notifier, OutboundMessage, RecipientFailure};

/// SMTP-backed notifier. Each dispatch call opens one authenticated session
/// over implicit TLS, walks the batch recipient by recipient, and drops the
/// connection when the batch is done whatever the per-recipient outcomes
/// were.
pub struct SmtpNotifier {
    config: MailConfig,
}

impl SmtpNotifier {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<SmtpTransport, DeliveryError> {
        let tls = TlsParameters::new(self.config.smtp_host.clone())
            .map_err(|err| DeliveryError::Session(err.to_string()))?;

        let transport = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|err| DeliveryError::Session(err.to_string()))?
            .port(self.config.smtp_port)
            .tls(Tls::Wrapper(tls))
            .credentials(Credentials::new(
                self.config.sender.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(std::time::Duration::from_secs(30)))
            .build();

        match transport.test_connection() {
            Ok(true) => Ok(transport),
            Ok(false) => Err(DeliveryError::Session(
                "relay refused the connection".to_string(),
            )),
            Err(err) => Err(DeliveryError::Session(err.to_string())),
        }
    }

    fn build_message(
        &self,
        message: &OutboundMessage,
        sender: &Mailbox,
        recipient: &str,
    ) -> Result<Message, String> {
        let to: Mailbox = recipient.parse().map_err(|err| format!("{err}"))?;

        let mut builder = Message::builder()
            .from(sender.clone())
            .to(to)
            .subject(message.subject.clone());

        if let Some(reply_to) = &message.reply_to {
            let mailbox: Mailbox = reply_to.parse().map_err(|err| format!("{err}"))?;
            builder = builder.reply_to(mailbox);
        }

        let body = match &message.body_html {
            Some(html) => MultiPart::alternative_plain_html(
                message.body_text.clone(),
                html.clone(),
            ),
            None => MultiPart::mixed().singlepart(SinglePart::plain(message.body_text.clone())),
        };

        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &message.attachments {
            let content_type = ContentType::parse(attachment.content_type.as_ref())
                .map_err(|err| format!("{err}"))?;
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }

        builder.multipart(mixed).map_err(|err| format!("{err}"))
    }
}

impl Notifier for SmtpNotifier {
    fn dispatch(&self, batch: &[OutboundMessage]) -> Result<DeliveryReport, DeliveryError> {
        let transport = self.connect()?;
        let mut report = DeliveryReport::default();

        for message in batch {
            let sender: Mailbox = format!("\"{}\" <{}>", message.from_name, self.config.sender)
                .parse()
                .map_err(|err| DeliveryError::Sender(format!("{err}")))?;

            for recipient in &message.to {
                let outcome = self
                    .build_message(message, &sender, recipient)
                    .and_then(|email| transport.send(&email).map_err(|err| err.to_string()));

                match outcome {
                    Ok(_) => report.delivered += 1,
                    Err(reason) => {
                        warn!(%recipient, %reason, "recipient refused, continuing batch");
                        report.failures.push(RecipientFailure {
                            recipient: recipient.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        Ok(report)
    }
}
