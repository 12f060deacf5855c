//! Collaborator traits consumed by the request pipeline.

mod observer;
mod refresher;
mod store;
mod transport;

pub use observer::{EventObserver, NoopObserver};
pub use refresher::TokenRefresher;
pub use store::{MemoryTokenStore, TokenStore};
pub use transport::Transport;
