//! Request and response value types.

mod authorization;
mod headers;
mod http;

pub use authorization::{AuthorizationRequirement, TokenKind};
pub use headers::{FromHeaders, Headers};
pub use http::{AUTHORIZATION, HttpRequest, HttpResponse, Method};
