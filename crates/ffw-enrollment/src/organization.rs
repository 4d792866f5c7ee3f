//! Fixed organizational identity printed on every enrollment form.
//!
//! None of these values come from the submitted record. They are kept together so the
//! renderer only deals with layout.

/// A labelled officer entry, optionally with a postal address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Officer {
    pub role: &'static str,
    pub name: &'static str,
    pub address: Option<&'static str>,
}

/// Bank account the association collects membership fees into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankAccount {
    pub bank_name: &'static str,
    pub iban: &'static str,
}

/// Terms of the SEPA direct-debit mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MandateTerms {
    pub creditor_id: &'static str,
    pub reference_pattern: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationProfile {
    /// Two header lines, printed large on the upper left.
    pub name_lines: [&'static str; 2],
    /// Name used in running text ("Beitritt zur ...").
    pub short_name: &'static str,
    /// Officers listed in the header contact block.
    pub header_contacts: [Officer; 2],
    /// Mailbox as printed in the header. Delivery uses it lowercased.
    pub mailbox: &'static str,
    pub mandate: MandateTerms,
    pub fee_policy: [&'static str; 3],
    pub consent: &'static str,
    /// Left footer column.
    pub deputy_commander: Officer,
    /// Middle footer column, top to bottom.
    pub board: [Officer; 3],
    /// Right footer column.
    pub bank: BankAccount,
}

static APFELTRANG: OrganizationProfile = OrganizationProfile {
    name_lines: ["Freiwillige Feuerwehr", "Apfeltrang e.V."],
    short_name: "FFW Apfeltrang e.V.",
    header_contacts: [
        Officer {
            role: "1. Vorsitzender:",
            name: "Michael Stich",
            address: Some("Im Obstgarten 29\n87674 Ruderatshofen"),
        },
        Officer {
            role: "1. Kommandant:",
            name: "Pascal Reimann",
            address: Some("Apfeltranger Dorfstr. 15\n87674 Ruderatshofen"),
        },
    ],
    mailbox: "Vorstand@ff-apfeltrang.de",
    mandate: MandateTerms {
        creditor_id: "DE04ZZZ00001520663",
        reference_pattern: "Name_Vorname_1",
    },
    fee_policy: [
        "Jährlicher Mitgliedsbeitrag für Männer und Frauen: je 5,00 Euro",
        "Beitragspflicht besteht ab Vollendung des 18. Lebensjahres",
        "Mitglieder ab Vollendung des 60. Lebensjahres und mindestens 10 jähriger Mitgliedschaft können auf Antrag von der Beitragspflicht befreit werden",
    ],
    consent: "Ich bin damit einverstanden, dass meine Daten aus Vereinszwecken elektronisch gespeichert werden.",
    deputy_commander: Officer {
        role: "Stellvertretender Kommandant:",
        name: "Simon Wintergerst",
        address: None,
    },
    board: [
        Officer {
            role: "2. Vorsitzender:",
            name: "Matthias Heimrich",
            address: None,
        },
        Officer {
            role: "Kassenwart:",
            name: "Andreas Schneider",
            address: None,
        },
        Officer {
            role: "Schriftführer:",
            name: "Wolfgang Haberlitter",
            address: None,
        },
    ],
    bank: BankAccount {
        bank_name: "VR Bank Augsburg-Ostallgäu",
        iban: "DE28720900000100303291",
    },
};

impl OrganizationProfile {
    pub fn apfeltrang() -> &'static OrganizationProfile {
        &APFELTRANG
    }

    /// "Name, street" on the first line and the town on the second, as printed in the header.
    pub fn contact_lines(officer: &Officer) -> Vec<String> {
        match officer.address {
            Some(address) => {
                let mut lines = address.lines();
                let mut out = vec![match lines.next() {
                    Some(street) => format!("{}, {}", officer.name, street),
                    None => officer.name.to_string(),
                }];
                out.extend(lines.map(str::to_string));
                out
            }
            None => vec![officer.name.to_string()],
        }
    }

    /// Running text of the SEPA mandate, split into regular and bold spans.
    pub fn mandate_spans(&self) -> [(String, bool); 4] {
        [
            ("Der Mitgliedsbeitrag wird durch ein ".to_string(), false),
            ("SEPA-Lastschriftmandat".to_string(), true),
            (
                format!(
                    " jährlich eingezogen. (Unsere Gläubiger-ID: {}. Als Mandatsreferenz verwenden {} (Bei Namensgleichheit ist die Nummer fortlaufend). ",
                    self.mandate.creditor_id, self.mandate.reference_pattern
                ),
                false,
            ),
            (
                format!(
                    "Ich gebe hierzu mein Einverständnis und ermächtige die {} den jeweils fälligen Beitrag einzuziehen.",
                    self.short_name
                ),
                true,
            ),
        ]
    }

    pub fn bank_lines(&self) -> [String; 2] {
        [
            self.bank.bank_name.to_string(),
            format!("IBAN: {}", self.bank.iban),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_contact_joins_name_and_street() {
        let profile = OrganizationProfile::apfeltrang();
        let lines = OrganizationProfile::contact_lines(&profile.header_contacts[0]);
        assert_eq!(
            lines,
            vec![
                "Michael Stich, Im Obstgarten 29".to_string(),
                "87674 Ruderatshofen".to_string()
            ]
        );
    }

    #[test]
    fn mandate_text_carries_creditor_id() {
        let profile = OrganizationProfile::apfeltrang();
        let spans = profile.mandate_spans();
        assert!(spans[1].1, "mandate keyword is bold");
        assert!(spans[2].0.contains("DE04ZZZ00001520663"));
        assert!(spans[3].0.contains("FFW Apfeltrang e.V."));
    }
}
