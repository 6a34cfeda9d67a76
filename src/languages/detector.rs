use anyhow::Result;

use super::normalize_code;

/// Classifies the language of short text. `Ok(None)` means no confident
/// classification and is not an error.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<Option<String>>;
}

const LATIN_LANGUAGES: [&str; 2] = ["en", "de"];

const GERMAN_MARKERS: [&str; 24] = [
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "und", "ist", "nicht", "mit",
    "ich", "sie", "wir", "ihr", "zu", "auf", "bei", "von", "sich", "auch", "oder",
];

/// Script based detector restricted to a fixed set of candidate languages.
#[derive(Debug, Clone)]
pub struct ScriptDetector {
    languages: Vec<String>,
}

impl ScriptDetector {
    pub fn new(languages: &[String]) -> Self {
        Self {
            languages: languages.iter().map(|code| normalize_code(code)).collect(),
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    fn accepts(&self, code: &str) -> bool {
        self.languages.iter().any(|candidate| candidate == code)
    }

    fn classify(&self, text: &str) -> Option<String> {
        let script = ScriptCounts::from_text(text);
        if script.cyrillic == 0 && script.latin == 0 {
            return None;
        }
        if script.cyrillic > script.latin {
            return self.accepts("ru").then(|| "ru".to_string());
        }
        if script.other > script.latin {
            return None;
        }

        let guess = if script.german_letters > 0 || has_german_marker(text) {
            "de"
        } else {
            "en"
        };
        if self.accepts(guess) {
            return Some(guess.to_string());
        }
        LATIN_LANGUAGES
            .into_iter()
            .find(|code| self.accepts(code))
            .map(str::to_string)
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Result<Option<String>> {
        Ok(self.classify(text))
    }
}

#[derive(Debug, Default)]
struct ScriptCounts {
    latin: usize,
    cyrillic: usize,
    german_letters: usize,
    other: usize,
}

impl ScriptCounts {
    fn from_text(text: &str) -> Self {
        let mut counts = ScriptCounts::default();
        for ch in text.chars() {
            if !ch.is_alphabetic() {
                continue;
            }
            let code = ch as u32;
            if (0x0400..=0x04FF).contains(&code) {
                counts.cyrillic += 1;
            } else if ch.is_ascii_alphabetic() {
                counts.latin += 1;
            } else if matches!(ch, 'ä' | 'ö' | 'ü' | 'ß' | 'Ä' | 'Ö' | 'Ü' | 'ẞ') {
                counts.latin += 1;
                counts.german_letters += 1;
            } else if (0x00C0..=0x024F).contains(&code) {
                counts.latin += 1;
            } else {
                counts.other += 1;
            }
        }
        counts
    }
}

fn has_german_marker(text: &str) -> bool {
    text.split(|ch: char| !ch.is_alphabetic())
        .filter(|word| !word.is_empty())
        .any(|word| GERMAN_MARKERS.contains(&word.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(codes: &[&str]) -> ScriptDetector {
        let codes = codes.iter().map(|code| code.to_string()).collect::<Vec<_>>();
        ScriptDetector::new(&codes)
    }

    #[test]
    fn cyrillic_text_is_russian() {
        let detector = detector(&["en", "ru"]);
        assert_eq!(detector.detect("собака").unwrap().as_deref(), Some("ru"));
        assert_eq!(
            detector.detect("большая собака (dog)").unwrap().as_deref(),
            Some("ru")
        );
    }

    #[test]
    fn plain_latin_text_is_english() {
        let detector = detector(&["en", "ru", "de"]);
        assert_eq!(detector.detect("dog").unwrap().as_deref(), Some("en"));
        assert_eq!(detector.detect("a big dog").unwrap().as_deref(), Some("en"));
    }

    #[test]
    fn german_markers_win_over_english() {
        let detector = detector(&["en", "ru", "de"]);
        assert_eq!(detector.detect("Hündin").unwrap().as_deref(), Some("de"));
        assert_eq!(detector.detect("der Hund").unwrap().as_deref(), Some("de"));
        assert_eq!(detector.detect("Straße").unwrap().as_deref(), Some("de"));
    }

    #[test]
    fn latin_text_falls_back_to_configured_latin_language() {
        let detector = detector(&["de", "ru"]);
        assert_eq!(detector.detect("Hund").unwrap().as_deref(), Some("de"));
    }

    #[test]
    fn unsupported_or_empty_text_has_no_classification() {
        let detector = detector(&["en", "ru"]);
        assert_eq!(detector.detect("").unwrap(), None);
        assert_eq!(detector.detect("42 !?").unwrap(), None);
        assert_eq!(detector.detect("犬").unwrap(), None);
    }

    #[test]
    fn cyrillic_without_russian_candidate_is_absent() {
        let detector = detector(&["en", "de"]);
        assert_eq!(detector.detect("собака").unwrap(), None);
    }
}
