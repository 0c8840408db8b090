//! Request handlers

pub mod chat;
pub mod conversations;
pub mod escalations;
pub mod events;
pub mod messages;
pub mod summaries;
