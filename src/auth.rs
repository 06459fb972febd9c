//! App identities, credential kinds, and redacted secrets.

pub mod id;
pub mod identity;
pub mod kind;
pub mod secret;

pub use id::*;
pub use identity::*;
pub use kind::*;
pub use secret::*;
