use std::fmt::Write as _;

use gow_common::Intent;

use crate::context::ContextSnapshot;

const PERSONA: &str = "Eres Gow, el asistente inteligente de un marketplace de servicios profesionales \
que conecta clientes con freelancers.";

const MISSION: &str = "Tu misión es ayudar a cada usuario a tener éxito en la plataforma: optimizar su \
perfil, escribir propuestas ganadoras, encontrar proyectos o talento adecuado y fijar precios justos. \
Responde siempre en español, con un tono cercano y profesional, en respuestas concretas y accionables.";

const NO_HISTORY: &str = "(sin interacciones previas)";

/// Render the main turn prompt. Pure string assembly; the intent is only
/// informational for the model.
pub fn build_turn_prompt(snapshot: &ContextSnapshot, intent: Intent, message: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{PERSONA}");
    let _ = writeln!(prompt, "{MISSION}");

    prompt.push_str("\n## Contexto del usuario\n");
    write_context(&mut prompt, snapshot);

    prompt.push_str("\n## Interacciones previas\n");
    if snapshot.previous_interactions.is_empty() {
        let _ = writeln!(prompt, "{NO_HISTORY}");
    } else {
        for turn in &snapshot.previous_interactions {
            let _ = writeln!(prompt, "- Usuario: {}", turn.message.trim());
            let _ = writeln!(prompt, "  Gow: {}", turn.response.trim());
        }
    }

    let _ = writeln!(prompt, "\n## Intención detectada\n{intent}");
    let _ = write!(prompt, "\n## Mensaje del usuario\n{}", message.trim());
    prompt
}

/// Render the prompt for the second, proposal-only generation call.
pub fn build_proposal_prompt(snapshot: &ContextSnapshot, message: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{PERSONA}");
    prompt.push_str(
        "Redacta una plantilla de propuesta profesional que el freelancer pueda adaptar y enviar. \
Incluye, en este orden: saludo personalizado, reformulación del problema del cliente, solución \
propuesta, experiencia relevante, cronograma y entregables, presupuesto (usa el marcador \
[PRESUPUESTO] si no se conoce) y un llamado a la acción.\n",
    );

    prompt.push_str("\n## Freelancer\n");
    if snapshot.skills.is_empty() {
        prompt.push_str("Habilidades: [TUS HABILIDADES]\n");
    } else {
        let _ = writeln!(prompt, "Habilidades: {}", snapshot.skills.join(", "));
    }
    if let Some(experience) = &snapshot.experience {
        let _ = writeln!(prompt, "Experiencia: {experience}");
    }

    prompt.push_str("\n## Proyecto\n");
    match &snapshot.active_project {
        Some(project) => {
            let _ = writeln!(prompt, "Título: {}", project.title);
            if let Some(category) = &project.category {
                let _ = writeln!(prompt, "Categoría: {category}");
            }
            if let Some(budget) = project.budget_label() {
                let _ = writeln!(prompt, "Presupuesto: {budget}");
            }
            if let Some(description) = &project.description {
                let _ = writeln!(prompt, "Descripción: {description}");
            }
        }
        None => prompt.push_str("No hay un proyecto activo; usa marcadores como [PROYECTO] y [CLIENTE].\n"),
    }

    let _ = write!(prompt, "\n## Solicitud\n{}", message.trim());
    prompt
}

fn write_context(prompt: &mut String, snapshot: &ContextSnapshot) {
    let _ = writeln!(prompt, "- Tipo de usuario: {}", snapshot.role);
    if let Some(page) = &snapshot.current_page {
        let _ = writeln!(prompt, "- Página actual: {page}");
    }
    let _ = writeln!(
        prompt,
        "- Completitud del perfil: {}%",
        snapshot.profile_completeness
    );
    if snapshot.skills.is_empty() {
        prompt.push_str("- Habilidades: no especificadas\n");
    } else {
        let _ = writeln!(prompt, "- Habilidades: {}", snapshot.skills.join(", "));
    }
    if let Some(experience) = &snapshot.experience {
        let _ = writeln!(prompt, "- Experiencia: {experience}");
    }
    if let Some(location) = &snapshot.location {
        let _ = writeln!(prompt, "- Ubicación: {location}");
    }
    if let Some(project) = &snapshot.active_project {
        let _ = write!(prompt, "- Proyecto activo: {}", project.title);
        if let Some(category) = &project.category {
            let _ = write!(prompt, " ({category})");
        }
        if let Some(budget) = project.budget_label() {
            let _ = write!(prompt, ", presupuesto {budget}");
        }
        prompt.push('\n');
    }
}
