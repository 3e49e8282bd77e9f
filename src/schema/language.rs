use serde::{Deserialize, Serialize};
use std::fmt;

/// A NewGRF language id.
///
/// Ordering follows the numeric id, so a sorted name table always starts
/// with American English (0x00) when present. The engine reads the first
/// language byte of a name table unconditionally and stops at the next zero
/// byte, so 0x00 is only legal in first position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(u8);

impl Language {
    pub const ENGLISH: Language = Language(0x00);
    pub const ENGLISH_GB: Language = Language(0x01);
    pub const GERMAN: Language = Language(0x02);
    pub const FRENCH: Language = Language(0x03);
    pub const SPANISH: Language = Language(0x04);
    /// Fallback for strings that are not translated.
    pub const ANY: Language = Language(0x7F);

    const TAGS: [(&'static str, Language); 6] = [
        ("en", Self::ENGLISH),
        ("en_GB", Self::ENGLISH_GB),
        ("de", Self::GERMAN),
        ("fr", Self::FRENCH),
        ("es", Self::SPANISH),
        ("any", Self::ANY),
    ];

    /// The language the Action 8 header strings are written in.
    pub const DEFAULT: Language = Self::ENGLISH;

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn from_code(code: u8) -> Language {
        Language(code & 0x7F)
    }

    pub fn from_tag(tag: &str) -> Option<Language> {
        Self::TAGS
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, lang)| *lang)
    }

    pub fn tag(self) -> Option<&'static str> {
        Self::TAGS
            .iter()
            .find(|(_, lang)| *lang == self)
            .map(|(t, _)| *t)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Some(tag) => f.write_str(tag),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        if let Some(lang) = Language::from_tag(&tag) {
            return Ok(lang);
        }
        if let Some(hex) = tag.strip_prefix("0x") {
            if let Ok(code) = u8::from_str_radix(hex, 16) {
                if code < 0x80 {
                    return Ok(Language(code));
                }
            }
        }
        Err(format!("unknown language tag '{}'", tag))
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> String {
        lang.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_map_to_newgrf_codes() {
        assert_eq!(Language::from_tag("en").unwrap().code(), 0x00);
        assert_eq!(Language::from_tag("fr").unwrap().code(), 0x03);
        assert_eq!(Language::from_tag("any").unwrap().code(), 0x7F);
        assert!(Language::from_tag("xx").is_none());
    }

    #[test]
    fn hex_codes_parse() {
        let lang = Language::try_from("0x1F".to_string()).unwrap();
        assert_eq!(lang.code(), 0x1F);
        assert_eq!(lang.to_string(), "0x1F");
        assert!(Language::try_from("0x80".to_string()).is_err());
    }

    #[test]
    fn english_sorts_first() {
        let mut langs = vec![Language::FRENCH, Language::ANY, Language::ENGLISH];
        langs.sort();
        assert_eq!(langs[0], Language::ENGLISH);
    }
}
