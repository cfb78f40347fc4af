//! Public contact form. Submissions pass a set of consistency traps meant
//! for form-filling bots before a single owner-bound email goes out with the
//! visitor as reply-to.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::config::BusinessConfig;
use crate::notify::{DeliveryError, Notifier, OutboundMessage};
use crate::sanitise;
use crate::workflows::{required_field, ValidationError};

const TRAP_PHRASE: &str = "Go away naughty bots";
const TRAP_LETTER_CODE: &str = "62668977";
const TRAP_PHONE_CODE: &str = "82636683";

/// Inbound contact form. The echo and trap fields are filled by the page
/// script; a bot that autocompletes the visible fields gets them wrong.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_echo: Option<String>,
    #[serde(default)]
    pub trap_phrase: Option<String>,
    #[serde(default)]
    pub letter_code: Option<String>,
    #[serde(default)]
    pub phone_code: Option<String>,
}

/// Service relaying visitor messages to the owner's mailbox.
pub struct ContactService<N> {
    notifier: Arc<N>,
    business: BusinessConfig,
}

impl<N> ContactService<N>
where
    N: Notifier + 'static,
{
    pub fn new(notifier: Arc<N>, business: BusinessConfig) -> Self {
        Self { notifier, business }
    }

    pub fn submit(&self, submission: ContactSubmission) -> Result<(), ContactError> {
        let trap_checks = [
            submission.message_echo == submission.message,
            submission.trap_phrase.as_deref() == Some(TRAP_PHRASE),
            submission.letter_code.as_deref() == Some(TRAP_LETTER_CODE),
            submission.phone_code.as_deref() == Some(TRAP_PHONE_CODE),
        ];
        if trap_checks.contains(&false) {
            return Err(ContactError::BotTrap);
        }

        let name = sanitise::trim_name(&required_field("name", submission.name.as_deref())?);
        let email = sanitise::clean_email(&required_field("email", submission.email.as_deref())?);
        if !sanitise::is_valid_email(&email) {
            return Err(ValidationError::MalformedField {
                field: "email",
                reason: "not a valid email address",
            }
            .into());
        }
        let telephone = sanitise::clean_phone(
            submission.telephone.as_deref().unwrap_or_default(),
        );
        let message = required_field("message", submission.message.as_deref())?;

        let subject = format!(
            "{} sent you a message on {}",
            name, self.business.trading_name
        );
        let body = format!(
            "This message was submitted via {}.\n\n\
             From: {}\n\
             Email: {}\n\
             Telephone: {}\n\n\
             Message:\n\n{}",
            self.business.public_url, name, email, telephone, message
        );

        let outbound = OutboundMessage::plain(
            subject,
            name.clone(),
            vec![self.business.owner_address.clone()],
            body,
        )
        .with_reply_to(format!("\"{name}\" <{email}>"));

        let report = self.notifier.send_one(&outbound)?;
        if !report.all_delivered() {
            return Err(ContactError::Delivery(DeliveryError::Session(
                "owner mailbox refused the message".to_string(),
            )));
        }
        Ok(())
    }
}

/// Error raised by the contact workflow.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("the form data was corrupted")]
    BotTrap,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Router builder for the public contact endpoint.
pub fn contact_router<N>(service: Arc<ContactService<N>>) -> Router
where
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/contact", post(contact_handler::<N>))
        .with_state(service)
}

pub(crate) async fn contact_handler<N>(
    State(service): State<Arc<ContactService<N>>>,
    axum::Json(submission): axum::Json<ContactSubmission>,
) -> Response
where
    N: Notifier + 'static,
{
    match service.submit(submission) {
        Ok(()) => {
            let payload = json!({ "status": "sent" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(ContactError::BotTrap) => {
            // Same wording the form shows for any corrupted submission, so
            // bots learn nothing about which trap they tripped.
            let payload = json!({
                "error": "the form data was corrupted; if you are using autofill, \
                          please try again and manually input your information",
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(error @ ContactError::Validation(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(ContactError::Delivery(_)) => {
            let payload = json!({
                "error": "something went wrong with sending the email, please try again",
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::notify::{DeliveryReport, Notifier, OutboundMessage};

    use super::*;

    #[derive(Default)]
    struct MemoryNotifier {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl Notifier for MemoryNotifier {
        fn dispatch(
            &self,
            batch: &[OutboundMessage],
        ) -> Result<DeliveryReport, crate::notify::DeliveryError> {
            let mut guard = self.sent.lock().expect("notifier mutex poisoned");
            guard.extend(batch.iter().cloned());
            Ok(DeliveryReport {
                delivered: batch.iter().map(|message| message.to.len()).sum(),
                failures: Vec::new(),
            })
        }
    }

    fn business() -> BusinessConfig {
        BusinessConfig {
            trading_name: "Little Ducklings Childminding".to_string(),
            signer_name: "Laura Oldfield".to_string(),
            day_fee_gbp: 45,
            owner_address: "owner@example.com".to_string(),
            public_url: "https://setting.example.com".to_string(),
        }
    }

    fn valid_submission() -> ContactSubmission {
        ContactSubmission {
            name: Some("jo bloggs".to_string()),
            email: Some("Jo@Example.com".to_string()),
            telephone: Some("+44 7700 900123".to_string()),
            message: Some("Do you have a space on Tuesdays?".to_string()),
            message_echo: Some("Do you have a space on Tuesdays?".to_string()),
            trap_phrase: Some(TRAP_PHRASE.to_string()),
            letter_code: Some(TRAP_LETTER_CODE.to_string()),
            phone_code: Some(TRAP_PHONE_CODE.to_string()),
        }
    }

    #[test]
    fn valid_submission_reaches_the_owner() {
        let notifier = Arc::new(MemoryNotifier::default());
        let service = ContactService::new(notifier.clone(), business());

        service.submit(valid_submission()).expect("message sent");

        let sent = notifier.sent.lock().expect("notifier mutex poisoned");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["owner@example.com".to_string()]);
        assert_eq!(sent[0].from_name, "Jo Bloggs");
        assert_eq!(
            sent[0].reply_to.as_deref(),
            Some("\"Jo Bloggs\" <jo@example.com>")
        );
        assert!(sent[0].body_text.contains("+447700900123"));
    }

    #[test]
    fn tripped_trap_sends_nothing() {
        let notifier = Arc::new(MemoryNotifier::default());
        let service = ContactService::new(notifier.clone(), business());

        let mut submission = valid_submission();
        submission.message_echo = Some("different".to_string());

        match service.submit(submission) {
            Err(ContactError::BotTrap) => {}
            other => panic!("expected BotTrap, got {other:?}"),
        }
        assert!(notifier
            .sent
            .lock()
            .expect("notifier mutex poisoned")
            .is_empty());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let notifier = Arc::new(MemoryNotifier::default());
        let service = ContactService::new(notifier, business());

        let mut submission = valid_submission();
        submission.email = Some("not-an-email".to_string());

        match service.submit(submission) {
            Err(ContactError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
