//! Shared domain types for Forohtoo: the vocabulary every other
//! `forohtoo_*` crate builds on. Kept free of I/O so it can be depended on
//! by the storage, oracle, workflow, and HTTP layers alike without pulling
//! in their respective backends.

pub mod address;
pub mod asset;
pub mod ata;
pub mod invoice;
pub mod network;
pub mod registration;
pub mod schedule_id;
pub mod transaction;
pub mod workflow;

pub use address::{validate_address, AddressError};
pub use asset::AssetType;
pub use ata::derive_associated_token_account;
pub use invoice::{Invoice, InvoiceParams};
pub use network::Network;
pub use registration::{
    Registration, RegistrationError, RegistrationKey, RegistrationStatus, MAX_POLL_INTERVAL,
    MIN_POLL_INTERVAL,
};
pub use schedule_id::{decode_schedule_id, encode_schedule_id, ScheduleIdError};
pub use transaction::{ConfirmationStatus, Transaction, TransactionKey};
pub use workflow::{payment_workflow_id, PaymentWorkflow, PaymentWorkflowStatus};
