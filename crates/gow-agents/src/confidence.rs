use crate::context::ContextSnapshot;

const BASE: u8 = 90;
const CEILING: u8 = 98;

/// Heuristic confidence for a generated turn: richer context and a longer
/// answer score higher. Never exceeds 98.
pub fn score(snapshot: &ContextSnapshot, text: &str) -> u8 {
    let mut confidence = BASE;
    if snapshot.profile_completeness > 70 {
        confidence += 3;
    }
    if snapshot.skills.len() > 3 {
        confidence += 2;
    }
    if text.chars().count() > 200 {
        confidence += 3;
    }
    confidence.min(CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_context_scores_base() {
        assert_eq!(score(&ContextSnapshot::default(), "ok"), 90);
    }

    #[test]
    fn rich_context_hits_the_ceiling() {
        let snapshot = ContextSnapshot {
            profile_completeness: 85,
            skills: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..Default::default()
        };
        assert_eq!(score(&snapshot, &"x".repeat(201)), 98);
    }

    #[test]
    fn thresholds_are_strict() {
        let snapshot = ContextSnapshot {
            profile_completeness: 70,
            skills: vec!["a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        assert_eq!(score(&snapshot, &"x".repeat(200)), 90);
    }
}
