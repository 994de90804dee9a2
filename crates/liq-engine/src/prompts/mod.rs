//! Prompts for the AI analysis provider
//!
//! - `system`: one system prompt per task, each pinning the JSON reply shape
//! - `user`: user messages carrying the task input as JSON

mod system;
mod user;

pub use system::*;
pub use user::*;
