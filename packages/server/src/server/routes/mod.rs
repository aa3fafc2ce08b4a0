// HTTP routes
pub mod accounts;
pub mod groups;
pub mod health;
pub mod memberships;
pub mod messages;
pub mod notifications;

pub use accounts::*;
pub use groups::*;
pub use health::*;
pub use memberships::*;
pub use messages::*;
pub use notifications::*;
