//! authwire-file - persist authwire sessions to disk.
//!
//! [`FileTokenStore`] keeps the current [`Token`](authwire_core::Token) in a
//! JSON file so that a session survives process restarts. Writes are atomic
//! and serialized across processes with an advisory lock.
//!
//! ```no_run
//! use authwire_file::FileTokenStore;
//!
//! # fn main() -> authwire_core::Result<()> {
//! let store = FileTokenStore::open("/tmp/session.json")?;
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::FileTokenStore;
