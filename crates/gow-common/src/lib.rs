pub mod error;
pub mod records;
pub mod types;

pub use error::{Error, Result};
pub use records::{
    Intent, InteractionRecord, InteractionSummary, MatchCandidate, ProjectDescriptor, UserProfile,
    UserRole,
};
pub use types::UserId;
