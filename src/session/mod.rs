// src/session/mod.rs

pub mod clock;
pub mod combo;
pub mod ledger;
pub mod machine;
pub mod registry;
pub mod runtime;

pub use registry::SessionRegistry;
pub use runtime::{SessionHandle, start_session};
