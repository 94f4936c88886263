//! Store adapters
//!
//! Each adapter implements one of the checkout domain's store ports, maps
//! rows to domain values and turns `DatabaseError` into `PortError`.

pub mod policy_records;
pub mod enquiries;

pub use policy_records::PostgresPolicyRecordStore;
pub use enquiries::PostgresEnquiryStore;
