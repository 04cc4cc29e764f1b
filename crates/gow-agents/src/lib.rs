pub mod best_effort;
pub mod confidence;
pub mod context;
pub mod fallback;
pub mod generation;
pub mod intent;
pub mod logger;
pub mod prompt;
pub mod providers;
pub mod response;
pub mod runtime;
pub mod synth;

pub use context::{ContextEnricher, ContextSnapshot, UserContext};
pub use generation::{GenerationClient, GenerationError, ProviderGenerationClient, WithTimeout};
pub use intent::{IntentClassifier, KeywordClassifier};
pub use providers::{
    AnthropicProvider, ChatMessage, ChatRole, ContentBlock, LlmProvider, LlmRequest, LlmResponse,
    OpenAiProvider, Usage,
};
pub use response::{
    ActionKind, GowAction, GowResponse, Priority, ProfileOptimization, Recommendation,
    RecommendationKind, ResponsePayload,
};
pub use runtime::{GowAgent, TurnRequest};
