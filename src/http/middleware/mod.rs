pub mod authorize;

pub use authorize::{authorize, AuthorizeState};
