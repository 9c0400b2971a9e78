//! Credential models, redacted secrets, and the credentials-cleared observer hook.

pub mod observer;
pub mod secret;
pub mod session;

pub use observer::*;
pub use secret::*;
pub use session::*;
