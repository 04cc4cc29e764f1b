pub mod bootstrap;
pub mod router;
pub mod server;
pub mod state;

pub use bootstrap::{build_agent, build_provider, open_store, open_store_or_degrade};
pub use router::build_router;
pub use server::GatewayServer;
pub use state::{AppState, SharedState};
