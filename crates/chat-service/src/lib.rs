//! # chat-service
//!
//! Application layer: conversation policy, messaging and DTOs.

pub mod dto;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use services::{
    ConversationService, FanoutPublisher, MessageService, NoopPublisher, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult,
};
