//! Turns raw generated text plus the classified intent into a [`GowResponse`].
//!
//! Each intent has its own generator for suggestions, actions and payload.
//! Generators may consult the store or a second generation call; any failure
//! there falls back to static content so the turn still succeeds.

use gow_common::{Intent, MatchCandidate, UserProfile, UserRole};
use gow_db::ContextStore;
use tracing::debug;

use crate::best_effort::best_effort;
use crate::context::ContextSnapshot;
use crate::generation::GenerationClient;
use crate::prompt::build_proposal_prompt;
use crate::response::{
    GowAction, GowResponse, MAX_OPTIMIZATIONS, MAX_RECOMMENDATIONS, Priority,
    ProfileOptimization, Recommendation, RecommendationKind, ResponsePayload,
};

const MIN_SKILLS: usize = 3;
const MIN_BIO_CHARS: usize = 100;
const MIN_COMPLETENESS: u8 = 70;

pub struct ResponseSynthesizer<'a> {
    store: Option<&'a dyn ContextStore>,
    generator: &'a dyn GenerationClient,
    match_limit: usize,
}

impl<'a> ResponseSynthesizer<'a> {
    pub fn new(
        store: Option<&'a dyn ContextStore>,
        generator: &'a dyn GenerationClient,
        match_limit: usize,
    ) -> Self {
        Self {
            store,
            generator,
            match_limit,
        }
    }

    /// Build the final response. Confidence is left at 0 for the scorer.
    pub async fn synthesize(
        &self,
        raw: &str,
        intent: Intent,
        snapshot: &ContextSnapshot,
        message: &str,
    ) -> GowResponse {
        let response = GowResponse::new(raw.trim(), intent);
        match intent {
            Intent::Profile => response
                .with_suggestions(strings(&[
                    "Agrega al menos 5 habilidades relevantes a tu perfil",
                    "Escribe una descripción profesional clara y concreta",
                    "Incluye ejemplos de trabajos anteriores en tu portafolio",
                ]))
                .with_actions(vec![
                    GowAction::link("edit-profile", "Editar perfil", "/profile/edit"),
                    GowAction::action("analyze-profile", "Analizar mi perfil"),
                    GowAction::link("ai-center", "Centro de IA", "/ai-center"),
                ])
                .with_payload(ResponsePayload::ProfileOptimizations(
                    profile_optimizations(snapshot),
                )),
            Intent::Proposal => {
                let template = self.proposal_template(snapshot, message).await;
                response
                    .with_suggestions(strings(&[
                        "Personaliza el saludo con el nombre del cliente",
                        "Menciona un proyecto similar que hayas completado",
                        "Propón un cronograma con entregables claros",
                    ]))
                    .with_actions(vec![
                        GowAction::template("use-template", "Usar plantilla", template.clone()),
                        GowAction::link("browse-projects", "Ver proyectos", "/projects"),
                    ])
                    .with_payload(ResponsePayload::ProposalTemplate(template))
            }
            Intent::Recommendations => {
                let (recommendations, personalized) = self.recommendations(snapshot).await;
                let actions = if personalized {
                    recommendations.iter().map(recommendation_link).collect()
                } else if snapshot.role == UserRole::Client {
                    vec![GowAction::link(
                        "explore-freelancers",
                        "Explorar freelancers",
                        "/freelancers",
                    )]
                } else {
                    vec![GowAction::link(
                        "explore-projects",
                        "Explorar proyectos",
                        "/projects",
                    )]
                };
                response
                    .with_suggestions(strings(&[
                        "Completa tus habilidades para mejorar las coincidencias",
                        "Revisa las recomendaciones a diario",
                        "Guarda los resultados que te interesen",
                    ]))
                    .with_actions(actions)
                    .with_payload(ResponsePayload::Recommendations(recommendations))
            }
            Intent::Pricing => response
                .with_suggestions(strings(&[
                    "Investiga las tarifas de freelancers con experiencia similar",
                    "Considera la complejidad y el plazo del proyecto",
                    "Ofrece paquetes con distintos niveles de servicio",
                ]))
                .with_actions(vec![
                    GowAction::link("pricing-guide", "Guía de precios", "/ai-center/pricing"),
                    GowAction::action("calculate-rate", "Calcular mi tarifa"),
                ]),
            Intent::Support => response
                .with_suggestions(strings(&[
                    "Consulta las preguntas frecuentes",
                    "Describe el problema con el mayor detalle posible",
                    "Contacta a soporte si el problema persiste",
                ]))
                .with_actions(vec![
                    GowAction::link("help-center", "Centro de ayuda", "/help"),
                    GowAction::link("contact-support", "Contactar soporte", "/support"),
                ]),
            Intent::General => response
                .with_suggestions(self.general_suggestions(snapshot).await)
                .with_actions(vec![
                    GowAction::link("profile", "Ver mi perfil", "/profile"),
                    GowAction::link("explore-services", "Explorar servicios", "/services"),
                    GowAction::link("ai-center", "Centro de IA", "/ai-center"),
                ]),
        }
    }

    async fn proposal_template(&self, snapshot: &ContextSnapshot, message: &str) -> String {
        let prompt = build_proposal_prompt(snapshot, message);
        match best_effort("proposal generation", self.generator.generate(&prompt)).await {
            Some(text) => text.trim().to_string(),
            None => static_proposal_template(snapshot),
        }
    }

    /// Returns the list and whether it came from a real lookup.
    async fn recommendations(&self, snapshot: &ContextSnapshot) -> (Vec<Recommendation>, bool) {
        let matches = match (self.store, snapshot.user_id.as_ref()) {
            (Some(store), Some(user_id)) if snapshot.role.offers_services() => best_effort(
                "matching projects lookup",
                store.fetch_matching_projects(user_id, self.match_limit),
            )
            .await
            .map(|found| (found, RecommendationKind::Project)),
            (Some(store), _) if snapshot.role.hires() => match &snapshot.active_project {
                Some(project) => best_effort(
                    "matching freelancers lookup",
                    store.fetch_matching_freelancers(project, self.match_limit),
                )
                .await
                .map(|found| (found, RecommendationKind::Freelancer)),
                None => None,
            },
            _ => None,
        };

        match matches {
            Some((found, kind)) if !found.is_empty() => {
                debug!(count = found.len(), "personalized recommendations");
                let mut items: Vec<_> = found
                    .into_iter()
                    .map(|candidate| from_candidate(candidate, kind))
                    .collect();
                items.truncate(MAX_RECOMMENDATIONS);
                (items, true)
            }
            _ => (illustrative_recommendations(snapshot.role), false),
        }
    }

    async fn general_suggestions(&self, snapshot: &ContextSnapshot) -> Vec<String> {
        let mut suggestions = Vec::new();

        if snapshot.role.offers_services() {
            if let (Some(store), Some(user_id)) = (self.store, snapshot.user_id.as_ref()) {
                let top = best_effort(
                    "matching projects lookup",
                    store.fetch_matching_projects(user_id, 1),
                )
                .await
                .and_then(|found| found.into_iter().next());
                if let Some(candidate) = top {
                    suggestions.push(format!(
                        "Revisa el proyecto \"{}\": coincide en un {}% con tu perfil",
                        candidate.title, candidate.score
                    ));
                }
            }
        }

        if snapshot.profile_completeness < MIN_COMPLETENESS {
            suggestions.push("Completa tu perfil para recibir mejores recomendaciones".into());
        }
        suggestions.extend(strings(match snapshot.role {
            UserRole::Client => &[
                "Publica un proyecto para recibir propuestas",
                "Explora freelancers por categoría",
            ],
            UserRole::Provider | UserRole::Both => &[
                "Busca proyectos que coincidan con tus habilidades",
                "Pide ayuda para redactar una propuesta",
            ],
            UserRole::New => &[
                "Cuéntame si quieres contratar o ofrecer servicios",
                "Explora los servicios más populares",
            ],
        }));
        suggestions
    }
}

/// Gap analysis of the user's profile, highest priority first, at most four.
pub fn profile_optimizations(snapshot: &ContextSnapshot) -> Vec<ProfileOptimization> {
    let mut items = match &snapshot.profile {
        Some(profile) => persisted_profile_gaps(profile),
        None => snapshot_gaps(snapshot),
    };
    items.sort_by_key(|item| item.priority);
    items.truncate(MAX_OPTIMIZATIONS);
    items
}

fn persisted_profile_gaps(profile: &UserProfile) -> Vec<ProfileOptimization> {
    let mut items = Vec::new();
    if profile.skills.len() < MIN_SKILLS {
        items.push(ProfileOptimization::new(
            "Habilidades",
            "Agrega al menos 3 habilidades relevantes para aparecer en más búsquedas",
            Priority::High,
        ));
    }
    if profile.bio_len() < MIN_BIO_CHARS {
        items.push(ProfileOptimization::new(
            "Descripción profesional",
            "Escribe una descripción de al menos 100 caracteres sobre tu experiencia y lo que ofreces",
            Priority::High,
        ));
    }
    if is_blank(profile.avatar_url.as_deref()) {
        items.push(ProfileOptimization::new(
            "Foto de perfil",
            "Sube una foto profesional para generar confianza",
            Priority::High,
        ));
    }
    if profile.role.offers_services() && profile.hourly_rate.is_none_or(|rate| rate <= 0.0) {
        items.push(ProfileOptimization::new(
            "Tarifa por hora",
            "Define tu tarifa por hora para que los clientes puedan estimar costos",
            Priority::Medium,
        ));
    }
    if is_blank(profile.location.as_deref()) {
        items.push(ProfileOptimization::new(
            "Ubicación",
            "Indica tu ubicación para conectar con clientes cercanos",
            Priority::Low,
        ));
    }
    items
}

fn snapshot_gaps(snapshot: &ContextSnapshot) -> Vec<ProfileOptimization> {
    let mut items = Vec::new();
    if snapshot.profile_completeness < MIN_COMPLETENESS {
        items.push(ProfileOptimization::new(
            "Completitud del perfil",
            "Completa la información de tu perfil hasta superar el 70%",
            Priority::High,
        ));
    }
    if snapshot.skills.len() < MIN_SKILLS {
        items.push(ProfileOptimization::new(
            "Habilidades",
            "Agrega al menos 3 habilidades relevantes para aparecer en más búsquedas",
            Priority::High,
        ));
    }
    if is_blank(snapshot.experience.as_deref()) {
        items.push(ProfileOptimization::new(
            "Experiencia",
            "Describe tu experiencia y proyectos anteriores",
            Priority::Medium,
        ));
    }
    items
}

fn static_proposal_template(snapshot: &ContextSnapshot) -> String {
    let project = snapshot
        .active_project
        .as_ref()
        .map(|p| p.title.as_str())
        .unwrap_or("[PROYECTO]");
    let budget = snapshot
        .active_project
        .as_ref()
        .and_then(|p| p.budget_label())
        .unwrap_or_else(|| "[PRESUPUESTO]".to_string());

    format!(
        "Hola [CLIENTE],\n\n\
Leí con atención tu proyecto \"{project}\" y entiendo que buscas [OBJETIVO DEL CLIENTE].\n\n\
Mi propuesta: [DESCRIBE TU SOLUCIÓN]\n\n\
Experiencia relevante: [PROYECTOS SIMILARES Y RESULTADOS]\n\n\
Cronograma y entregables: [FASES, FECHAS Y ENTREGABLES]\n\n\
Presupuesto: {budget}\n\n\
¿Te parece si conversamos para afinar los detalles? Quedo atento a tu respuesta.\n\n\
Saludos,\n[TU NOMBRE]"
    )
}

fn illustrative_recommendations(role: UserRole) -> Vec<Recommendation> {
    let (kind, items): (RecommendationKind, [(&str, &str, u8, &str); 3]) = match role {
        UserRole::Client => (
            RecommendationKind::Freelancer,
            [
                ("demo-freelancer-1", "Diseñadora UX/UI", 90, "Perfil muy valorado en proyectos similares"),
                ("demo-freelancer-2", "Desarrollador full stack", 85, "Amplia experiencia en proyectos web"),
                ("demo-freelancer-3", "Especialista en marketing digital", 80, "Resultados comprobados en campañas"),
            ],
        ),
        _ => (
            RecommendationKind::Project,
            [
                ("demo-project-1", "Rediseño de sitio web corporativo", 88, "Proyecto popular en la plataforma"),
                ("demo-project-2", "Aplicación móvil de reservas", 82, "Alta demanda de este tipo de servicio"),
                ("demo-project-3", "Campaña en redes sociales", 78, "Ideal para construir tu reputación"),
            ],
        ),
    };
    items
        .into_iter()
        .map(|(id, title, match_score, reason)| Recommendation {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            match_score,
            reason: reason.to_string(),
        })
        .collect()
}

fn from_candidate(candidate: MatchCandidate, kind: RecommendationKind) -> Recommendation {
    Recommendation {
        id: candidate.id,
        title: candidate.title,
        kind,
        match_score: candidate.score.min(100),
        reason: candidate.reason,
    }
}

fn recommendation_link(recommendation: &Recommendation) -> GowAction {
    let (prefix, label) = match recommendation.kind {
        RecommendationKind::Project => ("projects", "Ver proyecto"),
        RecommendationKind::Freelancer => ("freelancers", "Ver freelancer"),
    };
    GowAction::link(
        format!("view-{}", recommendation.id),
        format!("{label}: {}", recommendation.title),
        format!("/{prefix}/{}", recommendation.id),
    )
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
