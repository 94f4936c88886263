//! HTTP adapters for the external checkout services
//!
//! | client | port | endpoint |
//! |--------|------|----------|
//! | [`GatewayClient`] | `PaymentGatewayPort` | `POST {base}/initiate` |
//! | [`PaymentVerificationClient`] | `PaymentVerificationPort` | `POST {base}/verify` |
//! | [`InsurerClient`] | `PolicyIssuancePort` | `POST {base}/policies` |
//!
//! Every call is a single attempt bounded by the configured timeout.
//! Transport failures become `PortError`; a well-formed "not successful"
//! answer is returned as a reply so the caller can show the service's own
//! message.

pub mod config;
pub mod error;
pub mod gateway;
pub mod insurer;
pub mod verification;
mod transport;

pub use config::HttpServiceConfig;
pub use error::ClientError;
pub use gateway::GatewayClient;
pub use insurer::InsurerClient;
pub use verification::PaymentVerificationClient;
