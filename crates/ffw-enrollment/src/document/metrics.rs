//! Advance widths and WinAnsi encoding for the two standard Type1 faces the form uses.
//!
//! Widths are in thousandths of an em, taken from the Adobe core font metrics. Characters
//! outside the tables fall back to the width of their base letter or of the byte they
//! encode to, then to a digit width.

/// The two faces printed on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    pub fn base_font(self) -> &'static [u8] {
        match self {
            FontFace::Regular => b"Helvetica",
            FontFace::Bold => b"Helvetica-Bold",
        }
    }

    /// Resource name used in the page content stream.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            FontFace::Regular => b"F1",
            FontFace::Bold => b"F2",
        }
    }
}

const DEFAULT_WIDTH: u16 = 556;

// ASCII 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn ascii_width(face: FontFace, byte: u8) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    table[(byte - 0x20) as usize]
}

/// Glyph width in em thousandths.
pub fn glyph_width(face: FontFace, ch: char) -> u16 {
    if (' '..='~').contains(&ch) {
        return ascii_width(face, ch as u8);
    }

    match ch {
        'ß' => 611,
        '€' | '–' | '§' => 556,
        '…' | '—' => 1000,
        '°' => 400,
        '„' | '“' | '”' => match face {
            FontFace::Regular => 333,
            FontFace::Bold => 500,
        },
        '‚' | '‘' | '’' => match face {
            FontFace::Regular => 222,
            FontFace::Bold => 278,
        },
        '•' => 350,
        '\u{a0}' => 278,
        other => match (base_letter(other), win_ansi_byte(other)) {
            (Some(base), _) => ascii_width(face, base as u8),
            // Control characters print as spaces and unmapped ones as `?`.
            (None, byte @ 0x20..=0x7e) => ascii_width(face, byte),
            (None, _) => DEFAULT_WIDTH,
        },
    }
}

/// Maps accented Latin-1 letters onto the unaccented letter of equal width.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| glyph_width(face, ch) as u32).sum();
    units as f32 * size / 1000.0
}

/// Encodes text for a simple font using WinAnsiEncoding.
///
/// Control characters become spaces and anything the encoding cannot represent becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        ' '..='~' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        c if c.is_control() => b' ',
        _ => b'?',
    }
}

/// Shortens `text` so it fits `max_width`, marking the cut with an ellipsis.
pub fn fit_to_width(text: &str, face: FontFace, size: f32, max_width: f32) -> String {
    if text_width(text, face, size) <= max_width {
        return text.to_string();
    }

    let budget = max_width - text_width("…", face, size);
    let mut used = 0.0;
    let mut out = String::new();
    for ch in text.chars() {
        let advance = glyph_width(face, ch) as f32 * size / 1000.0;
        if used + advance > budget {
            break;
        }
        used += advance;
        out.push(ch);
    }
    let mut out = out.trim_end().to_string();
    out.push('…');
    out
}
