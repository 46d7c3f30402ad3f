use crate::refs::{ObjectReferences, RefType};
use pdf_writer::{Name, Pdf};

/// One of the PDF standard fonts that every viewer carries, so nothing has to
/// be embedded. Text set in these fonts is encoded as WinAnsi (Windows-1252).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum BuiltinFont {
    #[default]
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
}

impl BuiltinFont {
    pub const ALL: [BuiltinFont; 5] = [
        BuiltinFont::Helvetica,
        BuiltinFont::HelveticaBold,
        BuiltinFont::TimesRoman,
        BuiltinFont::TimesBold,
        BuiltinFont::Courier,
    ];

    /// The PostScript name the font is known by in PDF files
    pub fn base_font(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::TimesRoman => "Times-Roman",
            BuiltinFont::TimesBold => "Times-Bold",
            BuiltinFont::Courier => "Courier",
        }
    }

    /// Look a font up by its PostScript name or one of the short aliases
    /// (`helv`, `hebo`, `tiro`, `tibo`, `cour`), ignoring case
    pub fn from_name(name: &str) -> Option<BuiltinFont> {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "helv" | "helvetica" => Some(BuiltinFont::Helvetica),
            "hebo" | "helvetica-bold" => Some(BuiltinFont::HelveticaBold),
            "tiro" | "times" | "times-roman" => Some(BuiltinFont::TimesRoman),
            "tibo" | "times-bold" => Some(BuiltinFont::TimesBold),
            "cour" | "courier" => Some(BuiltinFont::Courier),
            _ => None,
        }
    }

    /// Resource name of the font within a page
    pub(crate) fn resource_name(&self) -> String {
        format!("F{}", self.index())
    }

    pub(crate) fn index(&self) -> usize {
        BuiltinFont::ALL
            .iter()
            .position(|f| f == self)
            .unwrap_or_default()
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, writer: &mut Pdf) {
        let id = refs.gen(RefType::Font(self.index()));
        writer
            .type1_font(id)
            .base_font(Name(self.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }
}

/// Transcode text to WinAnsi bytes for the standard fonts. Characters outside
/// the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => ch as u8,
            '\t' => b' ',
            '\u{20ac}' => 0x80,
            '\u{201a}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201e}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02c6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8a,
            '\u{2039}' => 0x8b,
            '\u{0152}' => 0x8c,
            '\u{017d}' => 0x8e,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02dc}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9a,
            '\u{203a}' => 0x9b,
            '\u{0153}' => 0x9c,
            '\u{017e}' => 0x9e,
            '\u{0178}' => 0x9f,
            _ => b'?',
        })
        .collect()
}
