//! Built-in font set
//!
//! Only standard Type1 fonts are used, so nothing is embedded. Each variant
//! owns a fixed resource name, which keeps generated content streams stable
//! across renders.

use lopdf::{dictionary, Dictionary};

/// Fonts available to templates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinFont {
    #[default]
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl BuiltinFont {
    /// Resolve a family name and weight to a built-in font.
    ///
    /// Family names are matched case-insensitively; common aliases of the
    /// standard families are accepted and anything else falls back to
    /// Helvetica.
    pub fn resolve(family: &str, bold: bool) -> Self {
        let family = family.trim().to_ascii_lowercase();
        match (family.as_str(), bold) {
            ("times" | "times-roman" | "times new roman" | "serif", false) => Self::TimesRoman,
            ("times" | "times-roman" | "times new roman" | "serif", true) => Self::TimesBold,
            ("courier" | "courier new" | "monospace", false) => Self::Courier,
            ("courier" | "courier new" | "monospace", true) => Self::CourierBold,
            (_, false) => Self::Helvetica,
            (_, true) => Self::HelveticaBold,
        }
    }

    /// PostScript name used as `/BaseFont`
    pub fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    /// Resource name used in content streams (e.g. `/Helv`)
    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helv",
            Self::HelveticaBold => "HeBo",
            Self::TimesRoman => "TiRo",
            Self::TimesBold => "TiBo",
            Self::Courier => "Cour",
            Self::CourierBold => "CoBo",
        }
    }

    /// Font dictionary for embedding in a page's `/Resources /Font`
    pub fn to_dictionary(self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}
