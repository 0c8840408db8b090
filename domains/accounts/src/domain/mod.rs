//! Accounts domain logic

pub mod entities;
pub mod profiles;
