//! Business logic services
//!
//! This module contains the service layer: conversation policy, messaging
//! and event fan-out on top of the repository traits.

pub mod context;
pub mod conversation;
pub mod error;
pub mod events;
pub mod message;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use conversation::ConversationService;
pub use error::{ServiceError, ServiceResult};
pub use events::{FanoutPublisher, NoopPublisher};
pub use message::MessageService;
