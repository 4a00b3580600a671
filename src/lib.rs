//! # Fleet Profile
//!
//! Loads fleet configuration profiles: JSON policy documents identified by a
//! required top-level `"uid"` string. A [`Profile`] is parsed from any
//! [`std::io::Read`] stream, compares and hashes by its uid alone, and can be
//! serialized back to compact or pretty-printed JSON.
//!
//! Loading comes in three flavours sharing one read-and-parse routine:
//!
//! - [`Profile::load_sync`] blocks the calling thread on a borrowed stream,
//! - [`Profile::load`] is an `async fn` running the same routine on tokio's
//!   blocking pool,
//! - [`Profile::load_with_callback`] runs it on a worker thread and reports
//!   through a callback.
//!
//! All of them observe a [`Cancellable`] between reads.
//!
//! ```
//! use std::io::Cursor;
//! use fleet_profile::Profile;
//!
//! let data = br#"{"uid":"desktop-lockdown","settings":{"wallpaper":"off"}}"#;
//! let profile = Profile::load_sync(&mut Cursor::new(&data[..]), None).unwrap();
//!
//! assert_eq!(profile.uid(), "desktop-lockdown");
//! assert_eq!(profile.to_data(false).unwrap(), data.to_vec());
//! ```

mod cancel;
pub mod errors;
mod loader;
pub mod options;
mod profile;

pub use cancel::Cancellable;
pub use errors::{ProfileError, Result, SchemaViolation};
pub use loader::PendingLoad;
pub use options::LoadOptions;
pub use profile::{Profile, UID_MEMBER};
