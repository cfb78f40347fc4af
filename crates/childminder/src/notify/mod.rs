//! Outbound notification dispatch. A message is attempted once per
//! recipient; one recipient failing does not stop the rest of the batch, and
//! nothing here retries. The mail session is scoped to a single `send` call.

mod smtp;

pub use smtp::SmtpNotifier;

use mime::Mime;

/// Binary attachment carried by an [`OutboundMessage`].
#[derive(Debug, Clone, PartialEq)]
pub struct MailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: Mime,
}

impl MailAttachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            content_type: mime::APPLICATION_PDF,
        }
    }
}

/// A composed message ready for dispatch. The sender address comes from the
/// notifier's configuration; the message only chooses the display name.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    pub from_name: String,
    pub to: Vec<String>,
    /// Full reply-to mailbox, e.g. `"Jo Bloggs" <jo@example.com>`.
    pub reply_to: Option<String>,
    pub body_text: String,
    pub body_html: Option<String>,
    pub attachments: Vec<MailAttachment>,
}

impl OutboundMessage {
    pub fn plain(
        subject: impl Into<String>,
        from_name: impl Into<String>,
        to: Vec<String>,
        body_text: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            from_name: from_name.into(),
            to,
            reply_to: None,
            body_text: body_text.into(),
            body_html: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_reply_to(mut self, mailbox: impl Into<String>) -> Self {
        self.reply_to = Some(mailbox.into());
        self
    }

    pub fn with_attachment(mut self, attachment: MailAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Outcome of one dispatch call: how many recipients were handed to the
/// relay, and which ones failed.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures: Vec<RecipientFailure>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single recipient the relay refused, with the transport's reason.
#[derive(Debug, Clone)]
pub struct RecipientFailure {
    pub recipient: String,
    pub reason: String,
}

/// Errors fatal to a whole dispatch call. Per-recipient refusals are not
/// errors; they are reported in [`DeliveryReport::failures`].
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("mail session could not be established: {0}")]
    Session(String),
    #[error("configured sender address is not a valid mailbox: {0}")]
    Sender(String),
}

/// Transport abstraction so workflows can be exercised without a relay.
///
/// `dispatch` covers one workflow step: implementations acquire the mail
/// session once for the whole batch and release it unconditionally afterward.
pub trait Notifier: Send + Sync {
    fn dispatch(&self, batch: &[OutboundMessage]) -> Result<DeliveryReport, DeliveryError>;

    fn send_one(&self, message: &OutboundMessage) -> Result<DeliveryReport, DeliveryError> {
        self.dispatch(std::slice::from_ref(message))
    }
}
