use gow_common::Intent;
use serde::{Deserialize, Serialize};

pub const MAX_SUGGESTIONS: usize = 3;
pub const MAX_ACTIONS: usize = 3;
pub const MAX_OPTIMIZATIONS: usize = 4;
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Composite result of one turn.
///
/// List bounds are enforced by the builder methods, and the payload enum makes
/// "at most one of optimizations / template / recommendations" a type-level fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GowResponse {
    pub message: String,
    pub confidence: u8,
    pub intent: Intent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<GowAction>>,
    #[serde(flatten)]
    pub payload: Option<ResponsePayload>,
}

impl GowResponse {
    pub fn new(message: impl Into<String>, intent: Intent) -> Self {
        Self {
            message: message.into(),
            confidence: 0,
            intent,
            suggestions: None,
            actions: None,
            payload: None,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_suggestions(mut self, mut suggestions: Vec<String>) -> Self {
        suggestions.truncate(MAX_SUGGESTIONS);
        self.suggestions = (!suggestions.is_empty()).then_some(suggestions);
        self
    }

    pub fn with_actions(mut self, mut actions: Vec<GowAction>) -> Self {
        actions.truncate(MAX_ACTIONS);
        self.actions = (!actions.is_empty()).then_some(actions);
        self
    }

    pub fn with_payload(mut self, payload: ResponsePayload) -> Self {
        self.payload = payload.bounded();
        self
    }

    pub fn profile_optimizations(&self) -> Option<&[ProfileOptimization]> {
        match &self.payload {
            Some(ResponsePayload::ProfileOptimizations(items)) => Some(items),
            _ => None,
        }
    }

    pub fn proposal_template(&self) -> Option<&str> {
        match &self.payload {
            Some(ResponsePayload::ProposalTemplate(template)) => Some(template),
            _ => None,
        }
    }

    pub fn recommendations(&self) -> Option<&[Recommendation]> {
        match &self.payload {
            Some(ResponsePayload::Recommendations(items)) => Some(items),
            _ => None,
        }
    }
}

/// Intent-specific extra section. Serialized flattened into the response as
/// `profileOptimizations`, `proposalTemplate` or `recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponsePayload {
    ProfileOptimizations(Vec<ProfileOptimization>),
    ProposalTemplate(String),
    Recommendations(Vec<Recommendation>),
}

impl ResponsePayload {
    /// Truncate lists to their bounds; an empty payload collapses to `None`.
    fn bounded(self) -> Option<Self> {
        match self {
            Self::ProfileOptimizations(mut items) => {
                items.truncate(MAX_OPTIMIZATIONS);
                (!items.is_empty()).then_some(Self::ProfileOptimizations(items))
            }
            Self::Recommendations(mut items) => {
                items.truncate(MAX_RECOMMENDATIONS);
                (!items.is_empty()).then_some(Self::Recommendations(items))
            }
            Self::ProposalTemplate(template) => {
                (!template.trim().is_empty()).then_some(Self::ProposalTemplate(template))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GowAction {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl GowAction {
    pub fn link(id: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ActionKind::Link,
            url: Some(url.into()),
            template: None,
        }
    }

    pub fn action(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ActionKind::Action,
            url: None,
            template: None,
        }
    }

    pub fn template(
        id: impl Into<String>,
        label: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ActionKind::Template,
            url: None,
            template: Some(template.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Link,
    Action,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOptimization {
    pub field: String,
    pub suggestion: String,
    pub priority: Priority,
}

impl ProfileOptimization {
    pub fn new(field: &str, suggestion: &str, priority: Priority) -> Self {
        Self {
            field: field.to_string(),
            suggestion: suggestion.to_string(),
            priority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub match_score: u8,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Project,
    Freelancer,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            title: id.to_string(),
            kind: RecommendationKind::Project,
            match_score: 80,
            reason: "r".to_string(),
        }
    }

    #[test]
    fn builders_truncate_lists() {
        let response = GowResponse::new("hola", Intent::Recommendations)
            .with_suggestions((0..5).map(|i| i.to_string()).collect())
            .with_actions((0..5).map(|i| GowAction::action(i.to_string(), "x")).collect())
            .with_payload(ResponsePayload::Recommendations(
                (0..6).map(|i| rec(&i.to_string())).collect(),
            ));

        assert_eq!(response.suggestions.as_ref().unwrap().len(), 3);
        assert_eq!(response.actions.as_ref().unwrap().len(), 3);
        assert_eq!(response.recommendations().unwrap().len(), 3);
    }

    #[test]
    fn empty_lists_are_omitted() {
        let response = GowResponse::new("hola", Intent::General)
            .with_suggestions(Vec::new())
            .with_payload(ResponsePayload::ProfileOptimizations(Vec::new()));
        assert!(response.suggestions.is_none());
        assert!(response.payload.is_none());
    }

    #[test]
    fn payload_serializes_as_camel_case_field() {
        let response = GowResponse::new("hola", Intent::Proposal)
            .with_confidence(92)
            .with_payload(ResponsePayload::ProposalTemplate("Hola [Cliente]".to_string()));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["proposalTemplate"], "Hola [Cliente]");
        assert_eq!(json["intent"], "proposal");
        assert_eq!(json["confidence"], 92);
        assert!(json.get("recommendations").is_none());
        assert!(json.get("suggestions").is_none());
    }

    #[test]
    fn recommendation_fields_use_wire_names() {
        let json = serde_json::to_value(rec("p1")).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["matchScore"], 80);
    }
}
