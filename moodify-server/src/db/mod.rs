//! Account and session persistence for moodify-server
//!
//! Schema creation lives in `moodify_common::db`; this module only reads and
//! writes rows.

pub mod sessions;
pub mod users;

pub use sessions::{create_session, delete_session, lookup_session};
pub use users::{authenticate, create_user, find_by_id, update_profile, ProfileChanges, User};
