//! authwire - typed HTTP client with bearer token management.
//!
//! Requests are described by [`Router`]s and executed through a [`Client`].
//! Each request is signed with the credential its
//! [`AuthorizationRequirement`] names, sent through a pluggable
//! [`Transport`], classified, and retried at most once:
//!
//! - timeouts and server errors are resent once;
//! - a `401` forces a token refresh and is replayed once, and a second
//!   failure logs the session out.
//!
//! Token refresh is single-flight: however many requests find the token
//! stale at the same time, one refresh call is made and every request
//! receives its result. See [`TokenProvider`].

pub mod client;
pub mod config;
pub mod executor;
pub mod observer;
pub mod provider;
pub mod refresh;
pub mod signer;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use executor::{RequestExecutor, ResponseClass, classify_status};
pub use observer::TracingObserver;
pub use provider::{SessionState, TokenProvider};
pub use refresh::HttpTokenRefresher;
pub use signer::RequestSigner;

pub use authwire_core::error::{
    AuthError, DecodeError, InvalidInputError, ResponseError, ResponseErrorKind, StorageError,
    TransportError,
};
pub use authwire_core::{
    AccessToken, AuthorizationRequirement, Error, EventObserver, ExpiryPolicy, FromHeaders,
    Headers, HttpRequest, HttpResponse, MemoryTokenStore, Method, NoopObserver, RefreshToken,
    RequestBody, Result, Router, Token, TokenKind, TokenRefresher, TokenStore, Transport,
};
