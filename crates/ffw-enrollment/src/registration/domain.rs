use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Form payload exactly as the browser client posts it.
///
/// Every field is optional here so that missing values surface as field-level
/// violations from [`super::RegistrationGuard`] instead of an opaque decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub whatsapp_group: Option<ChoiceAnswer>,
    pub previous_fire_department: Option<String>,
    pub entry_date: Option<String>,
    pub active_member: Option<ChoiceAnswer>,
    pub account_holder: Option<String>,
    pub bic: Option<String>,
    pub iban: Option<String>,
    pub place: Option<String>,
    pub signature_date: Option<String>,
    pub signature: Option<String>,
    pub parent_signature: Option<String>,
    /// Sent by the client, re-derived from `active_member` on the server.
    #[serde(skip_serializing)]
    pub department: Option<String>,
    /// Sent by the client, re-derived from `active_member` on the server.
    #[serde(skip_serializing)]
    pub membership_type: Option<String>,
}

/// A yes/no radio answer. The client sends a boolean, older form builds sent "ja"/"nein".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceAnswer {
    Flag(bool),
    Word(String),
}

impl ChoiceAnswer {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ChoiceAnswer::Flag(flag) => Some(*flag),
            ChoiceAnswer::Word(word) => match word.trim().to_ascii_lowercase().as_str() {
                "ja" | "true" => Some(true),
                "nein" | "false" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<bool> for ChoiceAnswer {
    fn from(value: bool) -> Self {
        ChoiceAnswer::Flag(value)
    }
}

/// Five-digit German postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 5 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Syntactically valid mailbox address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        trimmed
            .parse::<lettre::Address>()
            .ok()
            .map(|_| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a signature was captured on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SignatureMark {
    /// Typed name.
    Name(String),
    /// Canvas drawing as a `data:image/...` URI. Decoding happens at render time.
    Image { data_uri: String },
}

impl SignatureMark {
    pub const IMAGE_MARKER: &'static str = "data:image";

    pub fn classify(raw: &str) -> Self {
        if raw.starts_with(Self::IMAGE_MARKER) {
            SignatureMark::Image {
                data_uri: raw.to_string(),
            }
        } else {
            SignatureMark::Name(raw.to_string())
        }
    }

    /// The raw submitted value.
    pub fn literal(&self) -> &str {
        match self {
            SignatureMark::Name(name) => name,
            SignatureMark::Image { data_uri } => data_uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

impl PersonalDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostalAddress {
    pub street: String,
    pub postal_code: PostalCode,
    pub city: String,
}

impl PostalAddress {
    /// "Street, 12345 City" as printed in the personal-data grid.
    pub fn single_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub phone: String,
    pub mobile: Option<String>,
    pub email: EmailAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub whatsapp_group: bool,
    pub previous_department: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub active_member: bool,
}

impl Membership {
    pub fn category(&self) -> &'static str {
        if self.active_member {
            "Aktives Mitglied"
        } else {
            "Förderndes Mitglied"
        }
    }

    pub fn department(&self) -> &'static str {
        if self.active_member {
            "Aktive Abteilung"
        } else {
            "Förderndes Mitglied"
        }
    }
}

/// SEPA mandate details. All optional; blanks print as underscores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BankingDetails {
    pub account_holder: Option<String>,
    pub bic: Option<String>,
    pub iban: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingDetails {
    pub place: String,
    pub signed_on: NaiveDate,
    pub signature: SignatureMark,
    pub guardian_signature: Option<SignatureMark>,
}

/// One validated registrant. Built once by the guard, consumed once by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRecord {
    pub person: PersonalDetails,
    pub address: PostalAddress,
    pub contact: ContactDetails,
    pub membership: Membership,
    pub banking: BankingDetails,
    pub closing: ClosingDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_code_requires_exactly_five_digits() {
        assert!(PostalCode::parse("87674").is_some());
        assert!(PostalCode::parse(" 87674 ").is_some());
        assert!(PostalCode::parse("8767").is_none());
        assert!(PostalCode::parse("876745").is_none());
        assert!(PostalCode::parse("8767a").is_none());
    }

    #[test]
    fn email_syntax_is_checked() {
        assert!(EmailAddress::parse("anna@example.com").is_some());
        assert!(EmailAddress::parse("anna.example.com").is_none());
        assert!(EmailAddress::parse("anna@").is_none());
    }

    #[test]
    fn choice_answer_accepts_flags_and_words() {
        assert_eq!(ChoiceAnswer::Flag(true).as_bool(), Some(true));
        assert_eq!(ChoiceAnswer::Word("nein".to_string()).as_bool(), Some(false));
        assert_eq!(ChoiceAnswer::Word("Ja".to_string()).as_bool(), Some(true));
        assert_eq!(ChoiceAnswer::Word("vielleicht".to_string()).as_bool(), None);
    }

    #[test]
    fn signature_marker_selects_image() {
        let drawn = SignatureMark::classify("data:image/png;base64,AAAA");
        assert!(matches!(drawn, SignatureMark::Image { .. }));
        let typed = SignatureMark::classify("Anna Muster");
        assert_eq!(typed, SignatureMark::Name("Anna Muster".to_string()));
    }

    #[test]
    fn membership_labels_follow_active_flag() {
        let mut membership = Membership {
            whatsapp_group: false,
            previous_department: None,
            entry_date: None,
            active_member: true,
        };
        assert_eq!(membership.category(), "Aktives Mitglied");
        assert_eq!(membership.department(), "Aktive Abteilung");
        membership.active_member = false;
        assert_eq!(membership.category(), "Förderndes Mitglied");
        assert_eq!(membership.department(), "Förderndes Mitglied");
    }

    #[test]
    fn submission_reads_client_json() {
        let json = r#"{
            "firstName": "Anna",
            "whatsappGroup": false,
            "activeMember": "ja",
            "department": "Aktive Abteilung",
            "unknownField": 1
        }"#;
        let submission: RegistrationSubmission = serde_json::from_str(json).expect("decodes");
        assert_eq!(submission.first_name.as_deref(), Some("Anna"));
        assert_eq!(submission.whatsapp_group, Some(ChoiceAnswer::Flag(false)));
        assert_eq!(
            submission.active_member.and_then(|answer| answer.as_bool()),
            Some(true)
        );
        assert!(submission.last_name.is_none());
    }
}
