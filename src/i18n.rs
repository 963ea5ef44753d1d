//! Supported UI languages and their strings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Language shown to the user and forwarded to the chat endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// French.
    Fr,
}

impl Language {
    /// Two-letter code sent to the chat endpoint.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// UI strings for this language.
    #[must_use]
    pub const fn translations(self) -> &'static Translations {
        match self {
            Self::En => &EN,
            Self::Fr => &FR,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            other => Err(ConfigError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Static UI strings for one language.
#[derive(Debug)]
pub struct Translations {
    /// First assistant message of every conversation.
    pub welcome_msg: &'static str,
    /// Quick action asking for accommodation.
    pub quick_action_airbnb: &'static str,
    /// Quick action asking for things to do.
    pub quick_action_activities: &'static str,
    /// Label of the "new conversation" action.
    pub new_flight: &'static str,
    /// Heading of the conversation list.
    pub flight_logs: &'static str,
    /// Shown when the conversation list has nothing to display.
    pub no_logs: &'static str,
    /// Input prompt hint.
    pub placeholder: &'static str,
    /// Label of the exit action.
    pub quit: &'static str,
}

const EN: Translations = Translations {
    welcome_msg: "Welcome aboard! I'm Wingman. I can find Airbnbs, activities, or help with your flight. Where to?",
    quick_action_airbnb: "Find Airbnbs 🏠",
    quick_action_activities: "Things to do 🎡",
    new_flight: "+ NEW FLIGHT",
    flight_logs: "FLIGHT LOGS",
    no_logs: "No recent logs",
    placeholder: "Ask about flights, Airbnbs or activities...",
    quit: "← Leave Terminal",
};

const FR: Translations = Translations {
    welcome_msg: "Bienvenue à bord ! Je suis Wingman. Je peux trouver des Airbnbs ou gérer votre vol. On va où ?",
    quick_action_airbnb: "Trouver un Airbnb 🏠",
    quick_action_activities: "Activités à faire 🎡",
    new_flight: "+ NOUVEAU VOL",
    flight_logs: "LOGS DE VOL",
    no_logs: "Aucun log récent",
    placeholder: "Vols, Airbnbs ou activités...",
    quit: "← Quitter le terminal",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("en".parse::<Language>().ok(), Some(Language::En));
        assert_eq!(" FR ".parse::<Language>().ok(), Some(Language::Fr));
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde_lowercase() {
        let json = serde_json::to_string(&Language::Fr).unwrap_or_default();
        assert_eq!(json, "\"fr\"");
    }

    #[test]
    fn test_translations_differ() {
        assert_ne!(
            Language::En.translations().welcome_msg,
            Language::Fr.translations().welcome_msg
        );
        assert_eq!(Language::default(), Language::En);
    }
}
