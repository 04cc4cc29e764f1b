use gow_common::Intent;

use crate::context::ContextSnapshot;

/// Maps a raw message to exactly one [`Intent`].
///
/// The context is passed for classifiers that need to disambiguate; the
/// keyword table ignores it.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, message: &str, context: &ContextSnapshot) -> Intent;
}

/// Keyword rules in priority order. "proyecto" appears in proposal requests as
/// well, so `Proposal` must be checked before `Recommendations`.
pub const DEFAULT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Profile,
        &[
            "perfil",
            "profile",
            "optimizar",
            "biografía",
            "biografia",
            "habilidades",
            "portafolio",
        ],
    ),
    (
        Intent::Proposal,
        &[
            "propuesta",
            "proposal",
            "postular",
            "postulación",
            "postulacion",
            "carta de presentación",
        ],
    ),
    (
        Intent::Recommendations,
        &[
            "recomienda",
            "recomiénd",
            "recomiend",
            "recomendación",
            "recomendacion",
            "recommend",
            "proyecto",
            "freelancer",
            "encontrar",
            "buscar",
        ],
    ),
    (
        Intent::Pricing,
        &[
            "precio",
            "tarifa",
            "cobrar",
            "cobro",
            "presupuesto",
            "pricing",
            "price",
            "cuánto",
            "cuanto",
        ],
    ),
    (
        Intent::Support,
        &[
            "ayuda",
            "soporte",
            "problema",
            "error",
            "support",
            "help",
            "no funciona",
        ],
    ),
];

/// Deterministic first-match keyword classifier.
pub struct KeywordClassifier {
    rules: &'static [(Intent, &'static [&'static str])],
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }

    pub fn with_rules(rules: &'static [(Intent, &'static [&'static str])]) -> Self {
        Self { rules }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, message: &str, _context: &ContextSnapshot) -> Intent {
        let normalized = message.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| normalized.contains(kw)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::General)
    }
}
