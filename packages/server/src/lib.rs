// Groops - API Core
//
// Backend for activity groups: group lifecycle, the membership approval
// workflow, notifications, email delivery and group chat.
//
// Architecture follows domain-driven design: domains/* hold models, pure
// decision logic and actions; kernel/ holds infrastructure behind traits.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
