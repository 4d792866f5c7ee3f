use std::fmt;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use super::domain::{
    BankingDetails, ChoiceAnswer, ClosingDetails, ContactDetails, EmailAddress, Membership,
    PersonalDetails, PostalAddress, PostalCode, RegistrationRecord, RegistrationSubmission,
    SignatureMark,
};

/// One rejected form field, keyed by the client's field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

/// All field violations of a rejected submission, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.violations
            .iter()
            .find(|violation| violation.field == field)
            .map(|violation| violation.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "submission rejected: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

const CHOICE_REQUIRED: &str = "Bitte wählen Sie Ja oder Nein";

/// Turns a raw form submission into a [`RegistrationRecord`].
#[derive(Debug, Clone, Default)]
pub struct RegistrationGuard;

impl RegistrationGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn record_from_submission(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<RegistrationRecord, ValidationError> {
        let first_name = required(
            "firstName",
            submission.first_name,
            "Vorname ist erforderlich",
        );
        let last_name = required(
            "lastName",
            submission.last_name,
            "Nachname ist erforderlich",
        );
        let birth_date = date(
            "birthDate",
            submission.birth_date,
            "Geburtsdatum ist erforderlich",
        );
        let street = required("street", submission.street, "Straße ist erforderlich");
        let postal_code = match optional(submission.postal_code) {
            None => Err(violation("postalCode", "Postleitzahl ist erforderlich")),
            Some(raw) => PostalCode::parse(&raw)
                .ok_or_else(|| violation("postalCode", "Postleitzahl muss 5-stellig sein")),
        };
        let city = required("city", submission.city, "Ort ist erforderlich");
        let phone = required(
            "phone",
            submission.phone,
            "Telefonnummer ist erforderlich",
        );
        let email = match optional(submission.email) {
            None => Err(violation("email", "E-Mail ist erforderlich")),
            Some(raw) => EmailAddress::parse(&raw)
                .ok_or_else(|| violation("email", "Ungültige E-Mail-Adresse")),
        };
        let whatsapp_group = choice("whatsappGroup", submission.whatsapp_group);
        let entry_date = optional(submission.entry_date)
            .map(|raw| {
                parse_form_date(&raw)
                    .ok_or_else(|| violation("entryDate", "Ungültiges Eintrittsdatum"))
            })
            .transpose();
        let active_member = choice("activeMember", submission.active_member);
        let place = required("place", submission.place, "Ort ist erforderlich");
        let signed_on = date(
            "signatureDate",
            submission.signature_date,
            "Datum ist erforderlich",
        );
        let signature = required(
            "signature",
            submission.signature,
            "Unterschrift ist erforderlich",
        );

        // Form order.
        let violations: Vec<FieldViolation> = [
            first_name.as_ref().err(),
            last_name.as_ref().err(),
            birth_date.as_ref().err(),
            street.as_ref().err(),
            postal_code.as_ref().err(),
            city.as_ref().err(),
            phone.as_ref().err(),
            email.as_ref().err(),
            whatsapp_group.as_ref().err(),
            entry_date.as_ref().err(),
            active_member.as_ref().err(),
            place.as_ref().err(),
            signed_on.as_ref().err(),
            signature.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        Ok(RegistrationRecord {
            person: PersonalDetails {
                first_name: first_name?,
                last_name: last_name?,
                birth_date: birth_date?,
            },
            address: PostalAddress {
                street: street?,
                postal_code: postal_code?,
                city: city?,
            },
            contact: ContactDetails {
                phone: phone?,
                mobile: optional(submission.mobile),
                email: email?,
            },
            membership: Membership {
                whatsapp_group: whatsapp_group?,
                previous_department: optional(submission.previous_fire_department),
                entry_date: entry_date?,
                active_member: active_member?,
            },
            banking: BankingDetails {
                account_holder: optional(submission.account_holder),
                bic: optional(submission.bic),
                iban: optional(submission.iban),
            },
            closing: ClosingDetails {
                place: place?,
                signed_on: signed_on?,
                signature: SignatureMark::classify(&signature?),
                guardian_signature: optional(submission.parent_signature)
                    .map(|raw| SignatureMark::classify(&raw)),
            },
        })
    }
}

impl From<FieldViolation> for ValidationError {
    fn from(violation: FieldViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

type Checked<T> = Result<T, FieldViolation>;

fn violation(field: &'static str, message: &'static str) -> FieldViolation {
    FieldViolation { field, message }
}

fn required(field: &'static str, value: Option<String>, message: &'static str) -> Checked<String> {
    optional(value).ok_or_else(|| violation(field, message))
}

fn date(field: &'static str, value: Option<String>, message: &'static str) -> Checked<NaiveDate> {
    optional(value)
        .and_then(|raw| parse_form_date(&raw))
        .ok_or_else(|| violation(field, message))
}

fn choice(field: &'static str, value: Option<ChoiceAnswer>) -> Checked<bool> {
    value
        .and_then(|answer| answer.as_bool())
        .ok_or_else(|| violation(field, CHOICE_REQUIRED))
}

/// Trims a value and treats blank input as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Accepts `YYYY-MM-DD`, `DD.MM.YYYY`, or an RFC 3339 timestamp.
///
/// The date picker serializes local midnight as UTC, so timestamps are read back in the
/// server's local time zone.
pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|timestamp| timestamp.with_timezone(&Local).date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> RegistrationSubmission {
        RegistrationSubmission {
            first_name: Some("Anna".to_string()),
            last_name: Some("Muster".to_string()),
            birth_date: Some("1990-04-12".to_string()),
            street: Some("Hauptstraße 3".to_string()),
            postal_code: Some("87674".to_string()),
            city: Some("Ruderatshofen".to_string()),
            phone: Some("08343 1234".to_string()),
            email: Some("anna@example.com".to_string()),
            whatsapp_group: Some(ChoiceAnswer::Flag(false)),
            active_member: Some(ChoiceAnswer::Flag(true)),
            place: Some("Apfeltrang".to_string()),
            signature_date: Some("2025-03-01".to_string()),
            signature: Some("Anna Muster".to_string()),
            ..RegistrationSubmission::default()
        }
    }

    #[test]
    fn accepts_complete_submission() {
        let record = RegistrationGuard::new()
            .record_from_submission(submission())
            .expect("valid submission");
        assert_eq!(record.person.full_name(), "Anna Muster");
        assert_eq!(record.address.postal_code.as_str(), "87674");
        assert!(record.membership.active_member);
        assert!(!record.membership.whatsapp_group);
        assert_eq!(
            record.closing.signature,
            SignatureMark::Name("Anna Muster".to_string())
        );
        assert!(record.closing.guardian_signature.is_none());
        assert_eq!(record.banking, BankingDetails::default());
    }

    #[test]
    fn rejects_malformed_postal_code_with_field_message() {
        let mut input = submission();
        input.postal_code = Some("8767".to_string());
        let err = RegistrationGuard::new()
            .record_from_submission(input)
            .expect_err("postal code rejected");
        assert_eq!(
            err.message_for("postalCode"),
            Some("Postleitzahl muss 5-stellig sein")
        );
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn rejects_invalid_email_with_field_message() {
        let mut input = submission();
        input.email = Some("anna(at)example.com".to_string());
        let err = RegistrationGuard::new()
            .record_from_submission(input)
            .expect_err("email rejected");
        assert_eq!(err.message_for("email"), Some("Ungültige E-Mail-Adresse"));
    }

    #[test]
    fn collects_every_missing_field() {
        let err = RegistrationGuard::new()
            .record_from_submission(RegistrationSubmission::default())
            .expect_err("empty submission rejected");
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            vec![
                "firstName",
                "lastName",
                "birthDate",
                "street",
                "postalCode",
                "city",
                "phone",
                "email",
                "whatsappGroup",
                "activeMember",
                "place",
                "signatureDate",
                "signature",
            ]
        );
        assert_eq!(
            err.message_for("postalCode"),
            Some("Postleitzahl ist erforderlich")
        );
    }

    #[test]
    fn blank_optional_fields_become_absent() {
        let mut input = submission();
        input.mobile = Some("   ".to_string());
        input.iban = Some(String::new());
        input.parent_signature = Some(" ".to_string());
        input.previous_fire_department = Some("FF Ruderatshofen ".to_string());
        let record = RegistrationGuard::new()
            .record_from_submission(input)
            .expect("valid submission");
        assert!(record.contact.mobile.is_none());
        assert!(record.banking.iban.is_none());
        assert!(record.closing.guardian_signature.is_none());
        assert_eq!(
            record.membership.previous_department.as_deref(),
            Some("FF Ruderatshofen")
        );
    }

    #[test]
    fn whitespace_only_signature_is_missing() {
        let mut input = submission();
        input.signature = Some("  ".to_string());
        let err = RegistrationGuard::new()
            .record_from_submission(input)
            .expect_err("signature required");
        assert_eq!(
            err.message_for("signature"),
            Some("Unterschrift ist erforderlich")
        );
    }

    #[test]
    fn rejects_impossible_calendar_date() {
        let mut input = submission();
        input.birth_date = Some("1990-02-30".to_string());
        let err = RegistrationGuard::new()
            .record_from_submission(input)
            .expect_err("birth date rejected");
        assert_eq!(
            err.message_for("birthDate"),
            Some("Geburtsdatum ist erforderlich")
        );
    }

    #[test]
    fn reports_bad_entry_date_and_missing_choice() {
        let mut input = submission();
        input.entry_date = Some("31.02.2001".to_string());
        input.active_member = None;
        let err = RegistrationGuard::new()
            .record_from_submission(input)
            .expect_err("entry date and choice rejected");
        assert_eq!(
            err.violations,
            vec![
                FieldViolation {
                    field: "entryDate",
                    message: "Ungültiges Eintrittsdatum",
                },
                FieldViolation {
                    field: "activeMember",
                    message: "Bitte wählen Sie Ja oder Nein",
                },
            ]
        );
    }

    #[test]
    fn accepts_valid_entry_date() {
        let mut input = submission();
        input.entry_date = Some("03.05.2001".to_string());
        let record = RegistrationGuard::new()
            .record_from_submission(input)
            .expect("valid submission");
        assert_eq!(
            record.membership.entry_date,
            NaiveDate::from_ymd_opt(2001, 5, 3)
        );
    }

    #[test]
    fn parses_supported_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid");
        assert_eq!(parse_form_date("2025-03-01"), Some(expected));
        assert_eq!(parse_form_date("01.03.2025"), Some(expected));
        assert!(parse_form_date("2025-03-01T12:00:00+01:00").is_some());
        assert_eq!(parse_form_date("März 2025"), None);
    }
}
