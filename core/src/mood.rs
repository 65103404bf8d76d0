use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::AsRefStr;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;

/// Moods a user can pick. Doubles as the response cache key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mood {
    Happy,
    Calm,
    Motivated,
    Creative,
}

impl Mood {
    pub fn all() -> Vec<Mood> {
        Mood::iter().collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Motivated => "Motivated",
            Mood::Creative => "Creative",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Calm => "😌",
            Mood::Motivated => "💪",
            Mood::Creative => "🎨",
        }
    }

    /// Prompt sent to the model for this mood.
    pub fn prompt(self) -> &'static str {
        match self {
            Mood::Happy => "Generate an inspiring message for someone feeling happy",
            Mood::Calm => "Generate a peaceful message for someone feeling calm",
            Mood::Motivated => "Generate an energizing message for someone feeling motivated",
            Mood::Creative => "Generate an imaginative message for someone feeling creative",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Mood::from_str("happy").unwrap(), Mood::Happy);
        assert_eq!(Mood::from_str("CALM").unwrap(), Mood::Calm);
        assert_eq!("Motivated".parse::<Mood>().unwrap(), Mood::Motivated);
        assert!(Mood::from_str("sleepy").is_err());
    }

    #[test]
    fn displays_lowercase_key() {
        assert_eq!(Mood::Creative.to_string(), "creative");
        assert_eq!(Mood::Calm.as_ref(), "calm");
    }

    #[test]
    fn catalogue_is_complete() {
        assert_eq!(
            Mood::all(),
            vec![Mood::Happy, Mood::Calm, Mood::Motivated, Mood::Creative]
        );
        for mood in Mood::all() {
            assert!(mood.prompt().ends_with(&format!("feeling {mood}")));
        }
    }
}
