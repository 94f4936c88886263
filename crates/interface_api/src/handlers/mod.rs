//! Request handlers

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod enquiry;
pub mod health;
