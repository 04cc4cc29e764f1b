use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::UserId;

/// Marketplace role of a user. `freelancer` is accepted as an alias of `provider`
/// and anything unrecognised reads as `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    #[default]
    New,
    Client,
    Provider,
    Both,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Client => "client",
            Self::Provider => "provider",
            Self::Both => "both",
        }
    }

    /// Whether this role offers services (and so should have a rate and be matched to projects).
    pub fn offers_services(&self) -> bool {
        matches!(self, Self::Provider | Self::Both)
    }

    /// Whether this role posts projects.
    pub fn hires(&self) -> bool {
        matches!(self, Self::Client | Self::Both)
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Self::Client,
            "provider" | "freelancer" => Self::Provider,
            "both" => Self::Both,
            _ => Self::New,
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified category of a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Profile,
    Proposal,
    Recommendations,
    Pricing,
    Support,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Proposal => "proposal",
            Self::Recommendations => "recommendations",
            Self::Pricing => "pricing",
            Self::Support => "support",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Self::Profile),
            "proposal" => Ok(Self::Proposal),
            "recommendations" => Ok(Self::Recommendations),
            "pricing" => Ok(Self::Pricing),
            "support" => Ok(Self::Support),
            "general" => Ok(Self::General),
            other => Err(crate::Error::NotFound(format!("unknown intent '{other}'"))),
        }
    }
}

/// Persisted profile row as read by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub experience: Option<String>,
}

impl UserProfile {
    /// Percentage (0-100) of completeness-relevant fields that are filled in.
    /// The hourly rate only counts for roles that offer services.
    pub fn completeness(&self) -> u8 {
        let mut checks = vec![
            is_filled(&self.full_name),
            is_filled(&self.bio),
            !self.skills.is_empty(),
            is_filled(&self.location),
            is_filled(&self.avatar_url),
            is_filled(&self.experience),
        ];
        if self.role.offers_services() {
            checks.push(self.hourly_rate.is_some_and(|rate| rate > 0.0));
        }

        let filled = checks.iter().filter(|filled| **filled).count();
        ((filled * 100) / checks.len()) as u8
    }

    pub fn bio_len(&self) -> usize {
        self.bio.as_deref().map(|b| b.trim().chars().count()).unwrap_or(0)
    }
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// A project a client is working on, as seen by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub budget_min: Option<f64>,
    #[serde(default)]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ProjectDescriptor {
    /// Human-readable budget range, if any bound is known.
    pub fn budget_label(&self) -> Option<String> {
        match (self.budget_min, self.budget_max) {
            (Some(min), Some(max)) => Some(format!("${min:.0} - ${max:.0}")),
            (Some(min), None) => Some(format!("desde ${min:.0}")),
            (None, Some(max)) => Some(format!("hasta ${max:.0}")),
            (None, None) => None,
        }
    }
}

/// Condensed prior turn used as conversational memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSummary {
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Append-only log row written once per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub id: String,
    pub user_id: UserId,
    pub message: String,
    pub response: String,
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn new(
        user_id: UserId,
        message: impl Into<String>,
        response: impl Into<String>,
        intent: Intent,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            message: message.into(),
            response: response.into(),
            intent,
            timestamp: Utc::now(),
        }
    }
}

/// Ranked result of a matching lookup (projects for a provider, or providers for a project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub id: String,
    pub title: String,
    pub score: u8,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_freelancer_alias() {
        let role: UserRole = serde_json::from_str("\"freelancer\"").unwrap();
        assert_eq!(role, UserRole::Provider);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"provider\"");
    }

    #[test]
    fn unknown_role_reads_as_new() {
        assert_eq!(UserRole::from("visitor"), UserRole::New);
    }

    #[test]
    fn intent_round_trips_through_label() {
        for intent in [
            Intent::Profile,
            Intent::Proposal,
            Intent::Recommendations,
            Intent::Pricing,
            Intent::Support,
            Intent::General,
        ] {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert!("chitchat".parse::<Intent>().is_err());
    }

    #[test]
    fn empty_profile_is_zero_percent_complete() {
        let profile = UserProfile::default();
        assert_eq!(profile.completeness(), 0);
    }

    #[test]
    fn provider_completeness_counts_hourly_rate() {
        let mut profile = UserProfile {
            full_name: Some("Ana".into()),
            bio: Some("Diseñadora".into()),
            skills: vec!["figma".into()],
            location: Some("Lima".into()),
            avatar_url: Some("https://cdn/ana.png".into()),
            experience: Some("5 años".into()),
            role: UserRole::Client,
            ..Default::default()
        };
        assert_eq!(profile.completeness(), 100);

        profile.role = UserRole::Provider;
        assert_eq!(profile.completeness(), 85);

        profile.hourly_rate = Some(25.0);
        assert_eq!(profile.completeness(), 100);
    }

    #[test]
    fn budget_label_formats_known_bounds() {
        let project = ProjectDescriptor {
            title: "Tienda online".into(),
            budget_min: Some(500.0),
            budget_max: Some(1200.0),
            ..Default::default()
        };
        assert_eq!(project.budget_label().as_deref(), Some("$500 - $1200"));
        assert_eq!(ProjectDescriptor::default().budget_label(), None);
    }
}
