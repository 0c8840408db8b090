//! Request handlers

pub mod profile;
