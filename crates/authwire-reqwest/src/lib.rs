//! authwire-reqwest - reqwest-backed transport for authwire.

mod transport;

pub use transport::{ReqwestTransport, ReqwestTransportBuilder};
