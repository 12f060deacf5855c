//! authwire-core - Core types and traits for the authwire HTTP client.
//!
//! This crate defines the data model shared by the pipeline and its
//! collaborators: bearer [`Token`]s, per-endpoint
//! [`AuthorizationRequirement`]s, the [`Router`] endpoint descriptor,
//! transport-level request/response values, the collaborator traits
//! ([`Transport`], [`TokenStore`], [`TokenRefresher`], [`EventObserver`])
//! and the unified [`Error`].

pub mod error;
pub mod router;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::Error;
pub use router::{RequestBody, Router};
pub use tokens::{AccessToken, ExpiryPolicy, RefreshToken, Token};
pub use traits::{
    EventObserver, MemoryTokenStore, NoopObserver, TokenRefresher, TokenStore, Transport,
};
pub use types::{
    AuthorizationRequirement, FromHeaders, Headers, HttpRequest, HttpResponse, Method, TokenKind,
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
