//! Preference tags inferred from what the caller said.
//!
//! Lightweight keyword matching over user turns only. Best-effort: a tag is
//! a hint for whoever reads the summary, not an extracted fact.

use brain_core::Turn;

/// Keyword table: tag, then the phrases that imply it. Phrases match on
/// word boundaries.
const PREFERENCE_KEYWORDS: &[(&str, &[&str])] = &[
    ("prefers_morning", &["morning", "early", "before noon"]),
    ("prefers_afternoon", &["afternoon", "after lunch", "midday"]),
    ("prefers_evening", &["evening", "after work", "late", "tonight"]),
    ("prefers_weekend", &["weekend", "saturday", "sunday"]),
    (
        "urgent",
        &["urgent", "asap", "as soon as possible", "emergency", "right away", "today"],
    ),
    ("prefers_email", &["email me", "by email", "send an email"]),
];

/// Normalize one turn to ` word word ... ` for boundary-safe phrase lookup.
fn padded_words(content: &str) -> String {
    let words = content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>();
    format!(" {} ", words.join(" "))
}

/// Tags implied by the user turns of `transcript`, in table order.
///
/// Each turn is matched on its own, so a phrase never spans two turns.
pub fn extract_preferences(transcript: &[Turn]) -> Vec<String> {
    let turns = transcript
        .iter()
        .filter(|turn| turn.is_user())
        .map(|turn| padded_words(&turn.content))
        .collect::<Vec<_>>();

    PREFERENCE_KEYWORDS
        .iter()
        .filter(|(_, phrases)| {
            phrases.iter().any(|phrase| {
                let needle = format!(" {} ", phrase);
                turns.iter().any(|text| text.contains(&needle))
            })
        })
        .map(|(tag, _)| tag.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_user_turns() {
        let transcript = vec![
            Turn::user("I need something ASAP, ideally in the morning"),
            Turn::assistant("We have evening and weekend slots too"),
            Turn::user("Morning works."),
        ];

        let tags = extract_preferences(&transcript);
        assert_eq!(tags, vec!["prefers_morning", "urgent"]);
    }

    #[test]
    fn test_matches_whole_words_only() {
        let transcript = vec![Turn::user("I'll be there later, it's for my chocolate shop")];
        assert!(extract_preferences(&transcript).is_empty());

        let transcript = vec![Turn::user("Something after work on Saturday?")];
        assert_eq!(
            extract_preferences(&transcript),
            vec!["prefers_evening", "prefers_weekend"]
        );
    }

    #[test]
    fn test_phrases_do_not_span_turns() {
        let transcript = vec![Turn::user("Can we do it before"), Turn::user("noon is lunch")];
        assert!(extract_preferences(&transcript).is_empty());

        let transcript = vec![Turn::user("Anything before noon?")];
        assert_eq!(extract_preferences(&transcript), vec!["prefers_morning"]);
    }

    #[test]
    fn test_ignores_non_user_turns() {
        let transcript = vec![
            Turn::system("Offer afternoon slots first"),
            Turn::tool_result("fetch_slots", r#"{"slots": "evening"}"#),
            Turn::user("Hi there"),
        ];
        assert!(extract_preferences(&transcript).is_empty());
        assert!(extract_preferences(&[]).is_empty());
    }
}
