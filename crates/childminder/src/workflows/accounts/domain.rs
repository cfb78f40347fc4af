use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for account-holding guardians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardianId(pub u64);

/// Identifier wrapper for minded children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildId(pub u64);

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Account-holding parent or carer. The activation fields stay null until
/// the account's first successful activation and are never written again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: GuardianId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    pub ipv4_on_activation: Option<IpAddr>,
    pub time_on_activation: Option<DateTime<Utc>>,
}

impl Guardian {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Mailbox string suitable for a `To`/`Reply-To` header.
    pub fn mailbox(&self) -> String {
        format!("\"{}\" <{}>", self.full_name(), self.email)
    }

    pub fn is_active(&self) -> bool {
        self.time_on_activation.is_some()
    }
}

/// A minded child. Identity is immutable for the lifetime of the
/// relationship with the setting; one guardian owns each child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub guardian: GuardianId,
    /// Weekday indices, 0 = Monday .. 6 = Sunday. Duplicates and
    /// out-of-range values are tolerated here and filtered at display time.
    pub contracted_days: Vec<u8>,
    pub contract_start_date: NaiveDate,
}

impl Child {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Contracted days as a human-readable string.
    pub fn contracted_days_display(&self) -> String {
        let names: Vec<&str> = self
            .contracted_days
            .iter()
            .filter(|&&day| day < 7)
            .map(|&day| WEEKDAY_NAMES[day as usize])
            .collect();

        if names.is_empty() {
            "No contracted days".to_string()
        } else {
            names.join(", ")
        }
    }

    pub fn contract_start_date_display(&self) -> String {
        self.contract_start_date.format("%d/%m/%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(days: Vec<u8>) -> Child {
        Child {
            id: ChildId(1),
            first_name: "Maya".to_string(),
            last_name: "Bloggs".to_string(),
            dob: NaiveDate::from_ymd_opt(2021, 4, 12).expect("valid date"),
            guardian: GuardianId(1),
            contracted_days: days,
            contract_start_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        }
    }

    #[test]
    fn contracted_days_filters_out_of_range() {
        assert_eq!(child(vec![0, 2, 9]).contracted_days_display(), "Monday, Wednesday");
        assert_eq!(child(vec![0, 0]).contracted_days_display(), "Monday, Monday");
        assert_eq!(child(Vec::new()).contracted_days_display(), "No contracted days");
    }

    #[test]
    fn start_date_renders_uk_style() {
        assert_eq!(child(Vec::new()).contract_start_date_display(), "01/09/2025");
    }
}
