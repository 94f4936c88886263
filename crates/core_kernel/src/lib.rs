//! Core Kernel - Foundational types for the checkout service
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money and rates with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Port error and health-check vocabulary for adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{SessionId, PolicyRecordId, ContactMessageId, InquiryId, OrderId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
};
