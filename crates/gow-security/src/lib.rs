pub mod redaction;

pub use redaction::{RedactingWriter, redact_secrets};
