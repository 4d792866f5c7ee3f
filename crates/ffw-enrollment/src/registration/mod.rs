//! Registration record model and the guard that builds it from a raw form submission.

pub mod domain;
mod validation;

pub use domain::{
    BankingDetails, ChoiceAnswer, ClosingDetails, ContactDetails, EmailAddress, Membership,
    PersonalDetails, PostalAddress, PostalCode, RegistrationRecord, RegistrationSubmission,
    SignatureMark,
};
pub use validation::{parse_form_date, FieldViolation, RegistrationGuard, ValidationError};
