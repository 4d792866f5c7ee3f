use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::assets::{LogoAsset, LogoResolver};
use super::layout::{ChoiceOption, ChoiceSection, Element, ImageRole, PageLayout, Span, TextRun};
use super::metrics::{fit_to_width, FontFace};
use super::pdf::{write_pdf, DocumentInfo};
use super::raster::RasterImage;
use super::RenderError;
use crate::organization::{Officer, OrganizationProfile};
use crate::registration::{RegistrationRecord, SignatureMark};

const VALUE_SIZE: f32 = 11.0;
const MIN_VALUE_SIZE: f32 = 8.0;
const CAPTION_SIZE: f32 = 9.0;
const BODY_LEADING: f32 = 13.0;
const CONTACT_SIZE: f32 = 10.0;
const CONTACT_LEADING: f32 = 11.0;
const LOGO_WIDTH: f32 = 80.0;
const LOGO_MAX_HEIGHT: f32 = 50.0;
const SIGNATURE_WIDTH: f32 = 150.0;
const SIGNATURE_MAX_HEIGHT: f32 = 38.0;
const CHECKBOX_SIZE: f32 = 12.0;
const CELL_GAP: f32 = 6.0;

const BLANK_DEPARTMENT: &str = "________________________";
const BLANK_ENTRY_DATE: &str = "________________";
const BLANK_ACCOUNT_HOLDER: &str = "_______________________________________________";
const BLANK_BIC: &str = "__ __ __ __ __ __ __ __ __ __ __";
const BLANK_IBAN: &str = "__ __ / __ __ __ __ / __ __ __ __ / __ __ __ __ / __ __ __ __ / __ __";

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Builds the one-page membership form for a validated record.
#[derive(Debug, Clone)]
pub struct RegistrationRenderer {
    organization: &'static OrganizationProfile,
    logo: LogoResolver,
}

impl RegistrationRenderer {
    pub fn new(organization: &'static OrganizationProfile, logo: LogoResolver) -> Self {
        Self { organization, logo }
    }

    /// Lays out the page. The logo is looked up on every call.
    pub fn compose(&self, record: &RegistrationRecord) -> PageLayout {
        let logo = self.logo.load();
        let mut composer = Composer::new(self.organization);
        composer.header(logo);
        composer.title();
        composer.personal_grid(record);
        composer.choices(record);
        composer.mandate(record);
        composer.fee_policy();
        composer.consent();
        composer.signatures(record);
        composer.footer();

        let layout = composer.page;
        if layout.overflows() {
            warn!(
                lowest = layout.lowest_point(),
                margin = layout.margin,
                "form content runs past the bottom margin"
            );
        }
        layout
    }

    pub fn render(&self, record: &RegistrationRecord) -> Result<RenderedDocument, RenderError> {
        let layout = self.compose(record);
        let bytes = write_pdf(&layout, &self.document_info(record))?;
        info!(
            first_name = %record.person.first_name,
            last_name = %record.person.last_name,
            bytes = bytes.len(),
            "registration form rendered"
        );
        Ok(RenderedDocument { bytes })
    }

    fn document_info(&self, record: &RegistrationRecord) -> DocumentInfo {
        DocumentInfo {
            title: format!("Beitrittserklärung {}", record.person.full_name()),
            subject: format!(
                "{}, {}",
                record.membership.category(),
                record.membership.department()
            ),
            creator: self.organization.short_name.to_string(),
        }
    }
}

/// `Beitrittserklärung_<Nachname>_<Vorname>_<yyyyMMdd>.pdf`
pub fn document_file_name(record: &RegistrationRecord, date: NaiveDate) -> String {
    format!(
        "Beitrittserklärung_{}_{}_{}.pdf",
        file_name_part(&record.person.last_name),
        file_name_part(&record.person.first_name),
        date.format("%Y%m%d")
    )
}

/// ASCII rendition of a file name for HTTP headers. German letters are transliterated.
pub fn ascii_file_name(file_name: &str) -> String {
    let mut out = String::with_capacity(file_name.len());
    for ch in file_name.chars() {
        match ch {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            '"' | '\\' => out.push('_'),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('_'),
        }
    }
    out
}

fn file_name_part(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

struct Composer {
    org: &'static OrganizationProfile,
    page: PageLayout,
    /// Top edge of the next block.
    y: f32,
}

impl Composer {
    fn new(org: &'static OrganizationProfile) -> Self {
        let page = PageLayout::a4();
        let y = page.content_top();
        Self { org, page, y }
    }

    fn left(&self) -> f32 {
        self.page.content_left()
    }

    fn right(&self) -> f32 {
        self.page.content_right()
    }

    fn width(&self) -> f32 {
        self.page.content_width()
    }

    /// Column origins and widths for a row split by percentages.
    fn columns(&self, percents: &[f32]) -> Vec<(f32, f32)> {
        let mut x = self.left();
        percents
            .iter()
            .map(|percent| {
                let width = self.width() * percent / 100.0;
                let column = (x, width);
                x += width;
                column
            })
            .collect()
    }

    fn header(&mut self, logo: LogoAsset) {
        let org = self.org;
        let top = self.y;
        let left = self.left();
        let right = self.right();

        let mut baseline = top - 20.0;
        for line in org.name_lines {
            self.page.text(left, baseline, 22.0, FontFace::Bold, line);
            baseline -= 24.0;
        }
        let name_bottom = baseline + 24.0 - 6.0;

        let slot_bottom = match logo {
            LogoAsset::Image(image) => {
                let (width, height) = image.fit(LOGO_WIDTH, LOGO_MAX_HEIGHT);
                let y = top - height;
                self.page.push(Element::Image {
                    role: ImageRole::Logo,
                    x: right - width,
                    y,
                    width,
                    height,
                    image,
                });
                y
            }
            LogoAsset::Placeholder => {
                self.page
                    .text_right(right, top - 14.0, 14.0, FontFace::Bold, "Logo");
                top - 18.0
            }
        };

        let mut baseline = slot_bottom - CELL_GAP - CONTACT_SIZE;
        for officer in &org.header_contacts {
            baseline = self.contact_entry(officer, baseline);
        }
        self.page
            .text_right(right, baseline, CONTACT_SIZE, FontFace::Bold, "Mail:");
        baseline -= CONTACT_LEADING;
        self.page
            .text_right(right, baseline, CONTACT_SIZE, FontFace::Regular, org.mailbox);

        self.y = name_bottom.min(baseline - 3.0);
    }

    /// Writes one officer right-aligned and returns the next free baseline.
    fn contact_entry(&mut self, officer: &Officer, mut baseline: f32) -> f32 {
        let right = self.right();
        self.page
            .text_right(right, baseline, CONTACT_SIZE, FontFace::Bold, officer.role);
        baseline -= CONTACT_LEADING;
        for line in OrganizationProfile::contact_lines(officer) {
            self.page
                .text_right(right, baseline, CONTACT_SIZE, FontFace::Regular, &line);
            baseline -= CONTACT_LEADING;
        }
        baseline
    }

    fn title(&mut self) {
        let left = self.left();
        let baseline = self.y - 30.0;
        self.page
            .text(left, baseline, 20.0, FontFace::Bold, "Beitrittserklärung");
        let baseline = baseline - 24.0;
        self.page
            .text(left, baseline, 12.0, FontFace::Regular, "hiermit erkläre ich,");
        self.y = baseline - 8.0;
    }

    fn personal_grid(&mut self, record: &RegistrationRecord) {
        let rows = [
            [
                (record.person.full_name(), "Vorname, Name"),
                (record.address.single_line(), "Straße, Wohnort"),
                (
                    record.person.birth_date.format("%d.%m.%Y").to_string(),
                    "Geburtsdatum",
                ),
            ],
            [
                (record.contact.phone.clone(), "Telefon"),
                (record.contact.mobile.clone().unwrap_or_default(), "Mobil"),
                (record.contact.email.to_string(), "E-Mail"),
            ],
        ];

        for row in rows {
            let value_baseline = self.y - VALUE_SIZE;
            let rule_y = value_baseline - 3.0;
            let caption_baseline = rule_y - 10.0;
            for ((x, width), (value, caption)) in self.columns(&[33.0, 33.0, 34.0]).into_iter().zip(row)
            {
                let inner = width - CELL_GAP;
                self.page.text_shrunk(
                    x,
                    value_baseline,
                    inner,
                    VALUE_SIZE,
                    MIN_VALUE_SIZE,
                    FontFace::Regular,
                    &value,
                );
                self.page.rule(x, x + inner, rule_y);
                self.page
                    .text(x, caption_baseline, CAPTION_SIZE, FontFace::Regular, caption);
            }
            self.y = caption_baseline - 6.0;
        }

        let baseline = self.y - 18.0;
        let left = self.left();
        self.page.text(
            left,
            baseline,
            12.0,
            FontFace::Bold,
            format!("meinen Beitritt zur {}", self.org.short_name),
        );
        self.y = baseline - 8.0;
    }

    fn choices(&mut self, record: &RegistrationRecord) {
        self.choice_row(
            ChoiceSection::WhatsappGroup,
            "Interesse an der Vereins-WhatsApp-Gruppe:",
            record.membership.whatsapp_group,
            &[60.0, 10.0, 10.0, 20.0],
        );

        // Previous service: label, department, entry date.
        let columns = self.columns(&[40.0, 30.0, 30.0]);
        let baseline = self.y - 12.0;
        let (label_x, label_width) = columns[0];
        let label_bottom = self.page.paragraph(
            label_x,
            baseline,
            label_width - CELL_GAP,
            VALUE_SIZE,
            BODY_LEADING,
            &[Span::bold("Wann erfolgte der Ersteintritt in die Feuerwehr?")],
        );
        let department = record
            .membership
            .previous_department
            .clone()
            .unwrap_or_else(|| BLANK_DEPARTMENT.to_string());
        let entry_date = record
            .membership
            .entry_date
            .map(|date| date.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| BLANK_ENTRY_DATE.to_string());
        let caption_baseline = baseline - 11.0;
        for ((x, width), (value, caption)) in columns[1..].iter().zip([
            (department, "Name der vorherigen Feuerwehr"),
            (entry_date, "Eintrittsdatum"),
        ]) {
            let inner = width - CELL_GAP;
            self.page.text_shrunk(
                *x,
                baseline,
                inner,
                VALUE_SIZE,
                MIN_VALUE_SIZE,
                FontFace::Regular,
                &value,
            );
            self.page
                .text(*x, caption_baseline, CAPTION_SIZE, FontFace::Regular, caption);
        }
        self.y = label_bottom.min(caption_baseline) - 10.0;

        self.choice_row(
            ChoiceSection::ActiveService,
            "Interesse am aktiven Dienst:",
            record.membership.active_member,
            &[40.0, 10.0, 10.0, 40.0],
        );
    }

    /// Label cell, then a "ja" and a "nein" box. Exactly one box carries the mark.
    fn choice_row(&mut self, section: ChoiceSection, label: &str, answer: bool, percents: &[f32]) {
        let columns = self.columns(percents);
        let baseline = self.y - 12.0;
        let (label_x, label_width) = columns[0];
        self.page.text_fitted(
            label_x,
            baseline,
            label_width - CELL_GAP,
            VALUE_SIZE,
            FontFace::Bold,
            label,
        );

        let marked = ChoiceOption::for_answer(answer);
        for ((x, _), option) in columns[1..3]
            .iter()
            .zip([ChoiceOption::Yes, ChoiceOption::No])
        {
            self.page.push(Element::CheckBox {
                section,
                option,
                marked: option == marked,
                x: *x,
                y: baseline - 2.0,
                size: CHECKBOX_SIZE,
            });
            self.page.text(
                x + CHECKBOX_SIZE + 2.0,
                baseline,
                VALUE_SIZE,
                FontFace::Regular,
                option.label(),
            );
        }
        self.y = baseline - 10.0;
    }

    fn mandate(&mut self, record: &RegistrationRecord) {
        let left = self.left();
        let width = self.width();
        let spans: Vec<Span> = self
            .org
            .mandate_spans()
            .into_iter()
            .map(|(text, bold)| if bold { Span::bold(text) } else { Span::regular(text) })
            .collect();
        let last = self.page.paragraph(
            left,
            self.y - 14.0,
            width,
            VALUE_SIZE,
            BODY_LEADING,
            &spans,
        );

        let columns = self.columns(&[20.0, 80.0]);
        let baseline = last - 20.0;
        self.page.text(
            columns[0].0,
            baseline,
            VALUE_SIZE,
            FontFace::Regular,
            "Konto-Inhaber:",
        );
        let holder = record
            .banking
            .account_holder
            .as_deref()
            .unwrap_or(BLANK_ACCOUNT_HOLDER);
        let (value_x, value_width) = columns[1];
        self.page.push(Element::Text(TextRun {
            x: value_x,
            y: baseline,
            size: VALUE_SIZE,
            face: FontFace::Regular,
            text: fit_to_width(holder, FontFace::Regular, VALUE_SIZE, value_width),
            underline: true,
        }));

        // A value too long for its line wraps onto a line of its own and is cut there.
        let bic = fit_to_width(
            record.banking.bic.as_deref().unwrap_or(BLANK_BIC),
            FontFace::Regular,
            VALUE_SIZE,
            width,
        );
        let iban = fit_to_width(
            record
                .banking
                .iban
                .as_deref()
                .map(national_iban_part)
                .unwrap_or(BLANK_IBAN),
            FontFace::Regular,
            VALUE_SIZE,
            width,
        );
        let last = self.page.paragraph(
            left,
            baseline - BODY_LEADING - 1.0,
            width,
            VALUE_SIZE,
            BODY_LEADING,
            &[
                Span::regular("BIC: "),
                Span::underlined(bic),
                Span::regular("    IBAN: DE "),
                Span::underlined(iban),
            ],
        );
        self.y = last - 10.0;
    }

    fn fee_policy(&mut self) {
        let left = self.left();
        let baseline = self.y - 14.0;
        self.page.text(
            left,
            baseline,
            VALUE_SIZE,
            FontFace::Bold,
            "Es gilt derzeit folgende Beitragsregelung:",
        );

        let indent = 12.0;
        let mut baseline = baseline - 16.0;
        for item in self.org.fee_policy {
            self.page
                .text(left + 2.0, baseline, VALUE_SIZE, FontFace::Regular, "-");
            let last = self.page.paragraph(
                left + indent,
                baseline,
                self.width() - indent,
                VALUE_SIZE,
                BODY_LEADING,
                &[Span::regular(item)],
            );
            baseline = last - BODY_LEADING;
        }
        self.y = baseline + BODY_LEADING - 6.0;
    }

    fn consent(&mut self) {
        let left = self.left();
        let width = self.width();
        let last = self.page.paragraph(
            left,
            self.y - 14.0,
            width,
            VALUE_SIZE,
            BODY_LEADING,
            &[Span::regular(self.org.consent)],
        );
        self.y = last - 8.0;
    }

    fn signatures(&mut self, record: &RegistrationRecord) {
        let columns = self.columns(&[33.0, 33.0, 34.0]);
        let rule_y = self.y - 4.0 - SIGNATURE_MAX_HEIGHT - 4.0;
        let value_baseline = rule_y + 4.0;
        let caption_baseline = rule_y - 10.0;

        let closing = &record.closing;
        let place_and_date = format!(
            "{}, {}",
            closing.place,
            closing.signed_on.format("%d.%m.%Y")
        );
        let cells: [(Option<(&SignatureMark, ImageRole)>, Option<String>, &str); 3] = [
            (None, Some(place_and_date), "Ort, Datum"),
            (
                Some((&closing.signature, ImageRole::MemberSignature)),
                None,
                "Unterschrift des Neumitgliedes",
            ),
            (
                closing
                    .guardian_signature
                    .as_ref()
                    .map(|mark| (mark, ImageRole::GuardianSignature)),
                None,
                "Unterschrift der Eltern bei Minderjährigen",
            ),
        ];

        for ((x, width), (mark, text, caption)) in columns.into_iter().zip(cells) {
            let inner = width - CELL_GAP;
            if let Some(text) = text {
                self.page.text_shrunk(
                    x,
                    value_baseline,
                    inner,
                    VALUE_SIZE,
                    MIN_VALUE_SIZE,
                    FontFace::Regular,
                    &text,
                );
            }
            if let Some((mark, role)) = mark {
                self.signature(mark, role, x, rule_y + 2.0, value_baseline, inner);
            }
            self.page.rule(x, x + inner, rule_y);
            self.page.text_fitted(
                x,
                caption_baseline,
                width,
                CAPTION_SIZE,
                FontFace::Regular,
                caption,
            );
        }

        self.y = caption_baseline - 8.0;
    }

    /// Places a drawn signature as an image, or prints the raw value when it is a typed
    /// name or an image that does not decode.
    fn signature(
        &mut self,
        mark: &SignatureMark,
        role: ImageRole,
        x: f32,
        image_bottom: f32,
        baseline: f32,
        width: f32,
    ) {
        if let SignatureMark::Image { data_uri } = mark {
            match RasterImage::from_data_uri(data_uri) {
                Ok(image) => {
                    let (image_width, image_height) =
                        image.fit(SIGNATURE_WIDTH.min(width), SIGNATURE_MAX_HEIGHT);
                    debug!(?role, image_width, image_height, "placing signature image");
                    self.page.push(Element::Image {
                        role,
                        x,
                        y: image_bottom,
                        width: image_width,
                        height: image_height,
                        image,
                    });
                    return;
                }
                Err(err) => {
                    warn!(?role, error = %err, "signature image could not be decoded, printing raw value");
                }
            }
        }

        self.page.text_shrunk(
            x,
            baseline,
            width,
            VALUE_SIZE,
            MIN_VALUE_SIZE,
            FontFace::Regular,
            mark.literal(),
        );
    }

    fn footer(&mut self) {
        let columns = self.columns(&[33.0, 33.0, 34.0]);
        let top = self.y - 14.0;

        let deputy = self.org.deputy_commander;
        let bank_lines = self.org.bank_lines();
        let mut blocks: Vec<Vec<(&str, FontFace, f32)>> = vec![
            vec![(deputy.role, FontFace::Bold, 0.0), (deputy.name, FontFace::Regular, 0.0)],
            Vec::new(),
            vec![("Bankverbindung:", FontFace::Bold, 0.0)],
        ];
        for (index, officer) in self.org.board.iter().enumerate() {
            let gap = if index == 0 { 0.0 } else { 2.0 };
            blocks[1].push((officer.role, FontFace::Bold, gap));
            blocks[1].push((officer.name, FontFace::Regular, 0.0));
        }
        for line in &bank_lines {
            blocks[2].push((line.as_str(), FontFace::Regular, 0.0));
        }

        let mut lowest = top;
        for ((x, width), lines) in columns.into_iter().zip(blocks) {
            let mut baseline = top;
            for (text, face, gap) in lines {
                baseline -= gap;
                self.page
                    .text_fitted(x, baseline, width - CELL_GAP, CONTACT_SIZE, face, text);
                baseline -= CONTACT_LEADING;
            }
            lowest = lowest.min(baseline);
        }
        self.y = lowest;
    }
}

/// The form prints the "DE" country prefix itself, so a leading "DE" is dropped.
fn national_iban_part(iban: &str) -> &str {
    let trimmed = iban.trim();
    match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("DE") => trimmed[2..].trim_start(),
        _ => trimmed,
    }
}
