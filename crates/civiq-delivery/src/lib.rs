//! # civiq-delivery
//!
//! Submission lifecycle and fan-out delivery. A submission arrives as a
//! sealed envelope plus a recipient list, is opened exactly once by the
//! witness key holder, has its nullifier recorded, and is then delivered
//! to every recipient in independent failure domains. Submissions are
//! never deleted; the attempt records are the audit trail.

pub mod coordinator;
pub mod error;
pub mod submission;
pub mod transport;

pub use coordinator::{DeliveryCoordinator, DeliveryPayload};
pub use error::DeliveryError;
pub use submission::{
    AttemptOutcome, DeliveryAttempt, DeliveryErrorClass, DeliveryStatus, SecurityRejection,
    Submission,
};
pub use transport::{DeliveryReceipt, DeliveryTransport, HttpIntakeTransport, TransportError};
