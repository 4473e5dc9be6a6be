//! Voice resolution for a narration job.

use bridge_traits::Voice;

/// Pick the voice for `locale`.
///
/// Preference order:
/// 1. a voice whose tag equals `locale` and whose name carries a quality marker
/// 2. any voice whose tag equals `locale`
/// 3. any voice whose primary language subtag equals `language_code`
///
/// Tags compare case-insensitively with `_` treated as `-`. `None` leaves the
/// choice to the platform.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    locale: &str,
    language_code: &str,
    quality_markers: &[String],
) -> Option<&'a Voice> {
    let wanted = normalize_tag(locale);
    let exact: Vec<&Voice> = voices
        .iter()
        .filter(|voice| normalize_tag(&voice.lang) == wanted)
        .collect();

    let preferred = exact.iter().copied().find(|voice| {
        let name = voice.name.to_lowercase();
        quality_markers
            .iter()
            .any(|marker| !marker.is_empty() && name.contains(&marker.to_lowercase()))
    });

    if let Some(voice) = preferred.or_else(|| exact.first().copied()) {
        return Some(voice);
    }

    let language = language_code.trim().to_ascii_lowercase();
    if language.is_empty() {
        return None;
    }

    voices
        .iter()
        .find(|voice| primary_subtag(&normalize_tag(&voice.lang)) == language)
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["Google".into(), "Enhanced".into(), "Premium".into()]
    }

    #[test]
    fn quality_voice_wins_over_basic() {
        let voices = vec![Voice::new("Basic", "hi-IN"), Voice::new("Google Hindi", "hi-IN")];
        let selected = select_voice(&voices, "hi-IN", "hi", &markers()).unwrap();
        assert_eq!(selected.name, "Google Hindi");
    }

    #[test]
    fn exact_match_without_marker() {
        let voices = vec![
            Voice::new("Google US English", "en-US"),
            Voice::new("Lekha", "hi_IN"),
        ];
        let selected = select_voice(&voices, "hi-IN", "hi", &markers()).unwrap();
        assert_eq!(selected.name, "Lekha");
    }

    #[test]
    fn falls_back_to_language_prefix() {
        let voices = vec![
            Voice::new("Microsoft Heera", "en-IN"),
            Voice::new("Vani", "ta-LK"),
        ];
        let selected = select_voice(&voices, "ta-IN", "ta", &markers()).unwrap();
        assert_eq!(selected.name, "Vani");
    }

    #[test]
    fn no_match_leaves_platform_default() {
        let voices = vec![Voice::new("Thomas", "fr-FR")];
        assert!(select_voice(&voices, "kn-IN", "kn", &markers()).is_none());
        assert!(select_voice(&[], "en-US", "en", &markers()).is_none());
    }

    #[test]
    fn tag_comparison_ignores_case() {
        let voices = vec![Voice::new("Samantha (Enhanced)", "EN-us")];
        assert!(select_voice(&voices, "en-US", "en", &markers()).is_some());
    }
}
