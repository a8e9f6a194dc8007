pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod models;
pub mod normalize;
pub mod store;

pub use auth::{bearer_token, AuthError, IdentityProvider, SupabaseIdentity};
pub use config::PitchConfig;
pub use error::PitchError;
pub use generation::{
    create_generator, GenerationError, PitchGenerator, StaticGenerator, WebhookGenerator,
};
pub use models::{PitchContent, PitchRecord, NOT_SPECIFIED};
pub use normalize::{normalize, RawPayload};
pub use store::{MemoryPitchStore, PgPitchStore, PitchStore, StoreError};
