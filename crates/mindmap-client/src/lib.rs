//! Client side of MindMap: the identity-provider session client and the
//! authenticated gateway that calls the mind-map router.

pub mod gateway;
pub mod identity;
pub mod session;

pub use gateway::{Gateway, GatewayBuilder, Operation};
pub use identity::IdentityClient;
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionSource, SessionStore, StaticToken, User,
};
