//! Conversations domain logic

pub mod context;
pub mod entities;
pub mod escalation;
pub mod pickup;
pub mod session;
pub mod state;
