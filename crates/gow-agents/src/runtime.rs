use std::sync::Arc;
use std::time::Duration;

use gow_common::{Intent, UserId};
use gow_db::ContextStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::confidence;
use crate::context::{ContextEnricher, ContextSnapshot, UserContext};
use crate::fallback::fallback_response;
use crate::generation::{GenerationClient, GenerationError, WithTimeout};
use crate::intent::{IntentClassifier, KeywordClassifier};
use crate::logger::InteractionLogger;
use crate::prompt::build_turn_prompt;
use crate::response::GowResponse;
use crate::synth::ResponseSynthesizer;

const DEFAULT_HISTORY_LIMIT: usize = 5;
const DEFAULT_MATCH_LIMIT: usize = 5;
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// One inbound user message with whatever context the caller already has.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub context: UserContext,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_context(mut self, context: UserContext) -> Self {
        self.context = context;
        self
    }
}

/// The assistant pipeline. Holds no per-turn state, so one instance is shared
/// across concurrent turns behind an `Arc`.
pub struct GowAgent {
    store: Option<Arc<dyn ContextStore>>,
    classifier: Arc<dyn IntentClassifier>,
    generator: WithTimeout,
    history_limit: usize,
    match_limit: usize,
}

impl GowAgent {
    pub fn new(generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            store: None,
            classifier: Arc::new(KeywordClassifier::new()),
            generator: WithTimeout::new(generator, DEFAULT_GENERATION_TIMEOUT),
            history_limit: DEFAULT_HISTORY_LIMIT,
            match_limit: DEFAULT_MATCH_LIMIT,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_match_limit(mut self, limit: usize) -> Self {
        self.match_limit = limit;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generator.set_timeout(timeout);
        self
    }

    pub fn generation_timeout(&self) -> Duration {
        self.generator.timeout()
    }

    /// Answer one turn. Always returns a well-formed response: any failure from
    /// generation onward yields the fallback response.
    #[instrument(skip(self, request), fields(user_id = request.user_id.as_ref().map(|u| u.as_str())))]
    pub async fn respond(&self, request: &TurnRequest) -> GowResponse {
        match self.run_turn(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("turn failed, returning fallback response: {e}");
                fallback_response()
            }
        }
    }

    async fn run_turn(&self, request: &TurnRequest) -> Result<GowResponse, GenerationError> {
        let store = self.store.as_deref();
        let user_id = request.user_id.as_ref();

        let snapshot = ContextEnricher::new(store, self.history_limit)
            .enrich(user_id, request.context.clone())
            .await;

        let intent = self.classifier.classify(&request.message, &snapshot);
        debug!(%intent, role = %snapshot.role, "message classified");

        let prompt = build_turn_prompt(&snapshot, intent, &request.message);
        let raw = self.generator.generate(&prompt).await?;
        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let response = self.finish_turn(&snapshot, intent, &request.message, &raw).await;

        InteractionLogger::new(store)
            .log(user_id, &request.message, &raw, intent)
            .await;

        info!(%intent, confidence = response.confidence, "turn answered");
        Ok(response)
    }

    async fn finish_turn(
        &self,
        snapshot: &ContextSnapshot,
        intent: Intent,
        message: &str,
        raw: &str,
    ) -> GowResponse {
        let response = ResponseSynthesizer::new(
            self.store.as_deref(),
            &self.generator,
            self.match_limit,
        )
        .synthesize(raw, intent, snapshot, message)
        .await;
        let confidence = confidence::score(snapshot, &response.message);
        response.with_confidence(confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FALLBACK_MESSAGE;
    use async_trait::async_trait;
    use gow_common::UserRole;
    use gow_db::SqliteContextStore;
    use std::sync::Mutex;

    struct RecordingGenerator {
        output: Result<&'static str, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingGenerator {
        fn ok(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                output: Ok(text),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                output: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerationClient for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.output
                .map(str::to_string)
                .map_err(|_| GenerationError::Provider {
                    provider: "test".to_string(),
                    message: "status=500".to_string(),
                })
        }
    }

    #[tokio::test]
    async fn generated_turn_is_scored_and_logged() {
        let store = Arc::new(SqliteContextStore::in_memory().unwrap());
        let generator = RecordingGenerator::ok("Puedes empezar publicando tu primer servicio.");
        let agent = GowAgent::new(generator.clone()).with_store(store.clone());

        let request = TurnRequest::new("hola").with_user("u1");
        let response = agent.respond(&request).await;

        assert_eq!(response.intent, Intent::General);
        assert_eq!(response.confidence, 90);
        assert_eq!(response.message, "Puedes empezar publicando tu primer servicio.");
        assert_eq!(store.count_interactions(&UserId::from("u1")).unwrap(), 1);
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generation_failure_returns_fallback() {
        let agent = GowAgent::new(RecordingGenerator::failing());
        let response = agent.respond(&TurnRequest::new("optimiza mi perfil")).await;
        assert_eq!(response, fallback_response());
        assert_eq!(response.message, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn fallback_turns_are_not_logged() {
        let store = Arc::new(SqliteContextStore::in_memory().unwrap());
        let agent = GowAgent::new(RecordingGenerator::failing()).with_store(store.clone());
        agent.respond(&TurnRequest::new("hola").with_user("u1")).await;
        assert_eq!(store.count_interactions(&UserId::from("u1")).unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_generation_returns_fallback() {
        let agent = GowAgent::new(RecordingGenerator::ok("   "));
        assert_eq!(
            agent.respond(&TurnRequest::new("hola")).await,
            fallback_response()
        );
    }

    #[tokio::test]
    async fn proposal_makes_a_second_generation_call() {
        let generator = RecordingGenerator::ok("Plantilla generada");
        let agent = GowAgent::new(generator.clone());
        let response = agent
            .respond(&TurnRequest::new("necesito una propuesta para este proyecto"))
            .await;

        assert_eq!(response.intent, Intent::Proposal);
        assert_eq!(response.proposal_template(), Some("Plantilla generada"));
        assert_eq!(generator.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn caller_context_reaches_the_prompt() {
        let generator = RecordingGenerator::ok("ok");
        let agent = GowAgent::new(generator.clone());
        let request = TurnRequest::new("¿cuánto cobrar?").with_context(UserContext {
            user_type: Some(UserRole::Provider),
            location: Some("Medellín".into()),
            ..Default::default()
        });

        let response = agent.respond(&request).await;
        assert_eq!(response.intent, Intent::Pricing);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("- Ubicación: Medellín"));
        assert!(prompts[0].contains("- Tipo de usuario: provider"));
    }

    #[test]
    fn builder_overrides_timeout() {
        let agent = GowAgent::new(RecordingGenerator::ok("ok"))
            .with_generation_timeout(Duration::from_secs(5));
        assert_eq!(agent.generation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn turn_request_reads_wire_format() {
        let request: TurnRequest = serde_json::from_value(serde_json::json!({
            "message": "hola",
            "userId": "u1",
            "context": { "userType": "client" }
        }))
        .unwrap();
        assert_eq!(request.user_id, Some(UserId::from("u1")));
        assert_eq!(request.context.user_type, Some(UserRole::Client));
    }
}
