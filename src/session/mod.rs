// Session lifecycle: opaque tokens, soft revocation, sliding last_used

pub mod store;
pub mod types;

pub use store::SessionStore;
pub use types::{CreateSessionRequest, SessionRecord};
