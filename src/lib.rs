pub mod config;
pub mod core;
pub mod destruction;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod input;
pub mod material;
pub mod mode;
pub mod placement;
pub mod sandbox;
pub mod session;
pub mod task;

pub use error::{Result, SandboxError};
pub use sandbox::{ClickOutcome, Sandbox};
