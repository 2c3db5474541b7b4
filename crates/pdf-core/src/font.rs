//! Standard Type1 fonts for PDF documents
//!
//! The Helvetica family is one of the 14 fonts every PDF viewer ships, so no
//! font program is embedded. Widths come from the Adobe AFM metrics and are
//! expressed in 1/1000 em.

use lopdf::{Dictionary, Object};

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Helvetica widths for the printable ASCII range (0x20..=0x7E)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold widths for the printable ASCII range (0x20..=0x7E)
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// One of the four Helvetica variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl StandardFont {
    /// All variants, in resource-name order
    pub const ALL: [StandardFont; 4] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
        StandardFont::HelveticaBoldOblique,
    ];

    /// Pick the variant for a weight/style combination
    pub fn variant(weight: FontWeight, style: FontStyle) -> Self {
        match (weight, style) {
            (FontWeight::Regular, FontStyle::Normal) => StandardFont::Helvetica,
            (FontWeight::Bold, FontStyle::Normal) => StandardFont::HelveticaBold,
            (FontWeight::Regular, FontStyle::Italic) => StandardFont::HelveticaOblique,
            (FontWeight::Bold, FontStyle::Italic) => StandardFont::HelveticaBoldOblique,
        }
    }

    /// PostScript name written to /BaseFont
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Page resource name used by the Tf operator
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::HelveticaOblique => "F3",
            StandardFont::HelveticaBoldOblique => "F4",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(
            self,
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique
        )
    }

    /// Advance width of one character in 1/1000 em
    ///
    /// Obliques share the metrics of their upright counterpart. Accented
    /// Latin-1 letters use the width of their base letter.
    pub fn char_width(&self, c: char) -> u16 {
        let table = if self.is_bold() {
            &HELVETICA_BOLD_WIDTHS
        } else {
            &HELVETICA_WIDTHS
        };

        let c = latin1_base_letter(c).unwrap_or(c);
        match c {
            ' '..='~' => table[c as usize - 0x20],
            '\u{A0}' => table[0],
            '°' => 400,
            'º' => 365,
            'ª' => 370,
            '¡' => 333,
            '¿' => 611,
            '•' => 350,
            '…' | '—' => 1000,
            '‘' | '’' => if self.is_bold() { 278 } else { 222 },
            '“' | '”' => if self.is_bold() { 500 } else { 333 },
            // Unencodable characters are written as '?'
            _ if encode_char(c) == b'?' => table['?' as usize - 0x20],
            _ => 556,
        }
    }

    /// Text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 / 1000.0 * font_size as f64
    }

    /// Font dictionary for the page resources
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

fn latin1_base_letter(c: char) -> Option<char> {
    let base = match c {
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

fn encode_char(c: char) -> u8 {
    match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u32 as u8,
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
        _ => b'?',
    }
}

/// Encode text as WinAnsi bytes
///
/// Latin-1 maps one to one; a few typographic characters live in the
/// 0x80..0x9F block. Anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}
