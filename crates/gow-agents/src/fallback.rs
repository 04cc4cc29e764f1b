use gow_common::Intent;

use crate::response::{GowAction, GowResponse};

pub const FALLBACK_MESSAGE: &str = "Lo siento, estoy teniendo problemas para procesar tu solicitud \
en este momento. Por favor, intenta de nuevo en unos momentos.";

pub const FALLBACK_CONFIDENCE: u8 = 50;

const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Revisa y completa tu perfil",
    "Explora los servicios disponibles",
    "Visita el centro de IA para más herramientas",
];

/// Canned response returned whenever generation (or anything after it) fails.
/// Identical for every intent and every user.
pub fn fallback_response() -> GowResponse {
    GowResponse::new(FALLBACK_MESSAGE, Intent::General)
        .with_confidence(FALLBACK_CONFIDENCE)
        .with_suggestions(FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect())
        .with_actions(vec![
            GowAction::link("profile", "Ver mi perfil", "/profile"),
            GowAction::link("explore-services", "Explorar servicios", "/services"),
            GowAction::link("ai-center", "Centro de IA", "/ai-center"),
        ])
}
