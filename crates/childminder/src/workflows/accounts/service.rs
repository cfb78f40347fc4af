use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::config::BusinessConfig;
use crate::notify::{DeliveryError, Notifier, OutboundMessage};
use crate::sanitise;
use crate::workflows::{required_field, StoreError, ValidationError};

use super::domain::{Child, ChildId, Guardian, GuardianId};
use super::repository::{ChildRepository, GuardianRepository};

/// Token collaborator for activation and password-reset links. Token
/// generation and expiry policy live outside this crate.
pub trait ActivationTokens: Send + Sync {
    fn issue(&self, guardian: &Guardian) -> String;
    fn verify(&self, guardian: &Guardian, token: &str) -> bool;
}

/// Inbound payload for provisioning a guardian account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGuardian {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
}

/// Inbound payload for enrolling a child under an existing guardian.
#[derive(Debug, Clone, Deserialize)]
pub struct NewChild {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub guardian: GuardianId,
    #[serde(default)]
    pub contracted_days: Vec<u8>,
    pub contract_start_date: NaiveDate,
}

static GUARDIAN_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CHILD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_guardian_id() -> GuardianId {
    GuardianId(GUARDIAN_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_child_id() -> ChildId {
    ChildId(CHILD_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Service owning guardian/child enrolment and the activation lifecycle.
pub struct AccountsService<G, C, N> {
    guardians: Arc<G>,
    children: Arc<C>,
    notifier: Arc<N>,
    tokens: Arc<dyn ActivationTokens>,
    business: BusinessConfig,
}

impl<G, C, N> AccountsService<G, C, N>
where
    G: GuardianRepository + 'static,
    C: ChildRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        guardians: Arc<G>,
        children: Arc<C>,
        notifier: Arc<N>,
        tokens: Arc<dyn ActivationTokens>,
        business: BusinessConfig,
    ) -> Self {
        Self {
            guardians,
            children,
            notifier,
            tokens,
            business,
        }
    }

    /// Provision a guardian account and send the activation link. The email
    /// goes out before the account is persisted; a dead mail session aborts
    /// provisioning so no account exists without its activation link.
    pub fn provision_guardian(&self, new: NewGuardian) -> Result<Guardian, AccountsError> {
        let email = sanitise::clean_email(&new.email);
        if !sanitise::is_valid_email(&email) {
            return Err(ValidationError::MalformedField {
                field: "email",
                reason: "not a valid email address",
            }
            .into());
        }

        let telephone = sanitise::clean_phone(&new.telephone);
        if !sanitise::is_valid_phone(&telephone) {
            return Err(ValidationError::MalformedField {
                field: "telephone",
                reason: "not an international phone number",
            }
            .into());
        }

        let guardian = Guardian {
            id: next_guardian_id(),
            first_name: sanitise::trim_name(&required_field("first_name", Some(&new.first_name))?),
            last_name: sanitise::trim_name(&required_field("last_name", Some(&new.last_name))?),
            email,
            telephone,
            ipv4_on_activation: None,
            time_on_activation: None,
        };

        let report = self
            .notifier
            .send_one(&self.activation_message(&guardian))?;
        for failure in &report.failures {
            warn!(
                recipient = %failure.recipient,
                reason = %failure.reason,
                "activation link was refused by the relay"
            );
        }

        Ok(self.guardians.insert(guardian)?)
    }

    /// Stamp activation provenance exactly once. A second activation attempt
    /// fails: the fields are write-once.
    pub fn activate_guardian(
        &self,
        id: GuardianId,
        token: &str,
        source_ip: Option<IpAddr>,
    ) -> Result<Guardian, AccountsError> {
        let mut guardian = self
            .guardians
            .fetch(id)?
            .ok_or(AccountsError::NotFound)?;

        if !self.tokens.verify(&guardian, token) {
            return Err(AccountsError::InvalidToken);
        }
        if guardian.is_active() {
            return Err(AccountsError::AlreadyActive);
        }

        guardian.ipv4_on_activation = source_ip;
        guardian.time_on_activation = Some(Utc::now());
        self.guardians.update(guardian.clone())?;

        Ok(guardian)
    }

    /// Send a password-reset link if the mailbox matches an account. Reports
    /// success either way so callers cannot enumerate accounts.
    pub fn request_password_reset(&self, email: &str) -> Result<(), AccountsError> {
        let cleaned = sanitise::clean_email(email);
        let Some(guardian) = self.guardians.find_by_email(&cleaned)? else {
            return Ok(());
        };

        let report = self.notifier.send_one(&self.reset_message(&guardian))?;
        for failure in &report.failures {
            warn!(
                recipient = %failure.recipient,
                reason = %failure.reason,
                "password reset link was refused by the relay"
            );
        }
        Ok(())
    }

    /// Enrol a child under an existing guardian.
    pub fn add_child(&self, new: NewChild) -> Result<Child, AccountsError> {
        self.guardians
            .fetch(new.guardian)?
            .ok_or(AccountsError::NotFound)?;

        let child = Child {
            id: next_child_id(),
            first_name: sanitise::trim_name(&required_field("first_name", Some(&new.first_name))?),
            last_name: sanitise::trim_name(&required_field("last_name", Some(&new.last_name))?),
            dob: new.dob,
            guardian: new.guardian,
            contracted_days: new.contracted_days,
            contract_start_date: new.contract_start_date,
        };

        Ok(self.children.insert(child)?)
    }

    /// Resolve a child for the calling guardian: `NotFound` when the child
    /// does not exist, `Forbidden` when it belongs to someone else.
    pub fn child_for_guardian(
        &self,
        guardian: GuardianId,
        child: ChildId,
    ) -> Result<Child, AccountsError> {
        let child = self.children.fetch(child)?.ok_or(AccountsError::NotFound)?;
        if child.guardian != guardian {
            return Err(AccountsError::Forbidden);
        }
        Ok(child)
    }

    pub fn guardian(&self, id: GuardianId) -> Result<Guardian, AccountsError> {
        self.guardians.fetch(id)?.ok_or(AccountsError::NotFound)
    }

    fn activation_message(&self, guardian: &Guardian) -> OutboundMessage {
        let link = format!(
            "{}/activate-account/{}/{}/",
            self.business.public_url,
            guardian.id.0,
            self.tokens.issue(guardian)
        );
        let body = format!(
            "Thank you for signing up to {}! Please click on this link to activate your account:\n\n\
             {}\n\n\
             DO NOT share or forward this link to anybody, not even us. Doing so could compromise \
             your account and your children's safety.",
            self.business.trading_name, link
        );
        OutboundMessage::plain(
            "Account Activation Link",
            self.business.trading_name.clone(),
            vec![guardian.email.clone()],
            body,
        )
    }

    fn reset_message(&self, guardian: &Guardian) -> OutboundMessage {
        let link = format!(
            "{}/password-verify/{}/{}/",
            self.business.public_url,
            guardian.id.0,
            self.tokens.issue(guardian)
        );
        let body = format!(
            "Hello {},\n\n\
             Please reset your password by clicking the below link:\n\n\
             {}\n\n\
             DO NOT share or forward this link to anybody, not even us. Doing so could compromise \
             your account and your children's safety.",
            guardian.first_name, link
        );
        OutboundMessage::plain(
            "Password Reset Link",
            self.business.trading_name.clone(),
            vec![guardian.email.clone()],
            body,
        )
    }
}

/// Error raised by the accounts service.
#[derive(Debug, thiserror::Error)]
pub enum AccountsError {
    #[error("guardian or child not found")]
    NotFound,
    #[error("the requested child does not belong to this guardian")]
    Forbidden,
    #[error("account is already activated")]
    AlreadyActive,
    #[error("activation token is not valid")]
    InvalidToken,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
