//! Declarative page composition.
//!
//! A [`PageLayout`] is a flat list of positioned elements in PDF user space (origin bottom
//! left, y grows upwards). Composition and PDF emission are separate so that the structure
//! of a rendered form can be inspected without parsing PDF bytes.

use super::metrics::{fit_to_width, text_width, FontFace};
use super::raster::RasterImage;

pub const A4_WIDTH: f32 = 595.0;
pub const A4_HEIGHT: f32 = 842.0;
pub const PAGE_MARGIN: f32 = 50.0;

/// Which yes/no block a checkbox belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceSection {
    WhatsappGroup,
    ActiveService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceOption {
    Yes,
    No,
}

impl ChoiceOption {
    pub fn label(self) -> &'static str {
        match self {
            ChoiceOption::Yes => " ja",
            ChoiceOption::No => " nein",
        }
    }

    /// The option that carries the mark for a given answer.
    pub fn for_answer(answer: bool) -> Self {
        if answer {
            ChoiceOption::Yes
        } else {
            ChoiceOption::No
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Logo,
    MemberSignature,
    GuardianSignature,
}

/// A single run of text in one face, positioned at its baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub face: FontFace,
    pub text: String,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextRun),
    /// Horizontal line, used for signature and value underlines.
    Rule { x1: f32, x2: f32, y: f32, width: f32 },
    /// Square box with its lower-left corner at `(x, y)`.
    CheckBox {
        section: ChoiceSection,
        option: ChoiceOption,
        marked: bool,
        x: f32,
        y: f32,
        size: f32,
    },
    /// Image with its lower-left corner at `(x, y)`.
    Image {
        role: ImageRole,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: RasterImage,
    },
}

/// A styled fragment of running text.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub face: FontFace,
    pub underline: bool,
}

impl Span {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            face: FontFace::Regular,
            underline: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            face: FontFace::Bold,
            underline: false,
        }
    }

    pub fn underlined(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            face: FontFace::Regular,
            underline: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub elements: Vec<Element>,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageLayout {
    pub fn a4() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: PAGE_MARGIN,
            elements: Vec::new(),
        }
    }

    pub fn content_left(&self) -> f32 {
        self.margin
    }

    pub fn content_right(&self) -> f32 {
        self.width - self.margin
    }

    pub fn content_top(&self) -> f32 {
        self.height - self.margin
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn text(&mut self, x: f32, y: f32, size: f32, face: FontFace, text: impl Into<String>) {
        self.push(Element::Text(TextRun {
            x,
            y,
            size,
            face,
            text: text.into(),
            underline: false,
        }));
    }

    /// Places text so that it ends at `right`.
    pub fn text_right(&mut self, right: f32, y: f32, size: f32, face: FontFace, text: &str) {
        let x = right - text_width(text, face, size);
        self.text(x, y, size, face, text);
    }

    /// Single-line cell: the text is shortened with an ellipsis when wider than the cell.
    pub fn text_fitted(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        size: f32,
        face: FontFace,
        text: &str,
    ) {
        self.text(x, y, size, face, fit_to_width(text, face, size, width));
    }

    /// Single-line cell for submitted values: the font shrinks down to `min_size` before the
    /// text is cut.
    #[allow(clippy::too_many_arguments)]
    pub fn text_shrunk(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        size: f32,
        min_size: f32,
        face: FontFace,
        text: &str,
    ) {
        let natural = text_width(text, face, size);
        let size = if natural > width {
            (size * width / natural * 0.999).max(min_size)
        } else {
            size
        };
        self.text_fitted(x, y, width, size, face, text);
    }

    pub fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.push(Element::Rule {
            x1,
            x2,
            y,
            width: 0.5,
        });
    }

    /// Lays out wrapped spans starting with the first baseline at `y`.
    /// Returns the baseline of the last line written.
    #[allow(clippy::too_many_arguments)]
    pub fn paragraph(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        size: f32,
        leading: f32,
        spans: &[Span],
    ) -> f32 {
        let lines = wrap_spans(spans, size, width);
        let mut baseline = y;
        for (index, line) in lines.iter().enumerate() {
            baseline = y - index as f32 * leading;
            let mut cursor = x;
            for run in line {
                self.push(Element::Text(TextRun {
                    x: cursor,
                    y: baseline,
                    size,
                    face: run.face,
                    text: run.text.clone(),
                    underline: run.underline,
                }));
                cursor += run.width;
            }
        }
        baseline
    }

    /// Every marked checkbox of a section.
    pub fn marked_options(&self, section: ChoiceSection) -> Vec<ChoiceOption> {
        self.elements
            .iter()
            .filter_map(|element| match element {
                Element::CheckBox {
                    section: s,
                    option,
                    marked: true,
                    ..
                } if *s == section => Some(*option),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self, role: ImageRole) -> impl Iterator<Item = &Element> + '_ {
        self.elements
            .iter()
            .filter(move |element| matches!(element, Element::Image { role: r, .. } if *r == role))
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|run| run.text.contains(needle))
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextRun> + '_ {
        self.elements.iter().filter_map(|element| match element {
            Element::Text(run) => Some(run),
            _ => None,
        })
    }

    /// Lowest point any element reaches, used to detect overflow past the bottom margin.
    pub fn lowest_point(&self) -> f32 {
        self.elements
            .iter()
            .map(|element| match element {
                // Descenders reach roughly a fifth of the font size below the baseline.
                Element::Text(run) => run.y - run.size * 0.21,
                Element::Rule { y, .. } => *y,
                Element::CheckBox { y, .. } | Element::Image { y, .. } => *y,
            })
            .fold(self.height, f32::min)
    }

    pub fn overflows(&self) -> bool {
        self.lowest_point() < self.margin
    }
}

/// One line of wrapped output: consecutive words of the same style merged into runs.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRun {
    pub text: String,
    pub face: FontFace,
    pub underline: bool,
    pub width: f32,
}

struct Word {
    text: String,
    face: FontFace,
    underline: bool,
    /// Whether whitespace separates this word from the previous one.
    spaced: bool,
}

/// Greedy word wrap over mixed-style spans.
///
/// Words are split on whitespace; a word that does not fit an empty line is placed anyway.
/// Underlined spans keep their inner spacing so that placeholder blanks stay intact.
pub fn wrap_spans(spans: &[Span], size: f32, max_width: f32) -> Vec<Vec<LineRun>> {
    let words = split_words(spans);
    let mut lines: Vec<Vec<LineRun>> = Vec::new();
    let mut current: Vec<LineRun> = Vec::new();
    let mut used = 0.0;

    for word in words {
        let space = if word.spaced && !current.is_empty() {
            text_width(" ", word.face, size)
        } else {
            0.0
        };
        let word_width = text_width(&word.text, word.face, size);

        if !current.is_empty() && used + space + word_width > max_width {
            lines.push(std::mem::take(&mut current));
            used = 0.0;
            append(&mut current, &word, false, word_width, size);
            used += word_width;
            continue;
        }

        append(&mut current, &word, space > 0.0, word_width, size);
        used += space + word_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn append(line: &mut Vec<LineRun>, word: &Word, leading_space: bool, width: f32, size: f32) {
    let space_width = text_width(" ", word.face, size);
    let mut text = word.text.clone();
    let mut run_width = width;
    if let Some(last) = line.last_mut() {
        if last.face == word.face && last.underline == word.underline {
            if leading_space {
                last.text.push(' ');
                last.width += space_width;
            }
            last.text.push_str(&word.text);
            last.width += width;
            return;
        }
        if leading_space {
            // The gap goes to whichever side is not underlined.
            if last.underline {
                text.insert(0, ' ');
                run_width += space_width;
            } else {
                last.text.push(' ');
                last.width += text_width(" ", last.face, size);
            }
        }
    }
    line.push(LineRun {
        text,
        face: word.face,
        underline: word.underline,
        width: run_width,
    });
}

fn split_words(spans: &[Span]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut pending_space = false;

    for span in spans {
        if span.underline {
            // Underlined fields are kept whole; they are short and their blanks are
            // placeholder patterns such as "__ __ / __ __".
            let text = span.text.trim();
            if !text.is_empty() {
                words.push(Word {
                    text: text.to_string(),
                    face: span.face,
                    underline: true,
                    spaced: pending_space || span.text.starts_with(char::is_whitespace),
                });
            }
            pending_space = span.text.ends_with(char::is_whitespace);
            continue;
        }

        let mut first = true;
        for piece in span.text.split_whitespace() {
            let spaced = if first {
                pending_space || span.text.starts_with(char::is_whitespace)
            } else {
                true
            };
            words.push(Word {
                text: piece.to_string(),
                face: span.face,
                underline: false,
                spaced,
            });
            first = false;
        }
        if first {
            // Whitespace-only span.
            pending_space = pending_space || !span.text.is_empty();
        } else {
            pending_space = span.text.ends_with(char::is_whitespace);
        }
    }

    words
}
