//! Custody ledger for serialised devices.
//!
//! A device is created by its manufacturer and then handed from role to role
//! (warehouse, store, retailer, customer care) along a fixed transition table.
//! Each hand-over is authorized against the device's status, its recorded owner
//! and the affiliations of both parties before anything is written.

pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod index;
pub mod ledger;
pub mod router;
pub mod store;
pub mod telemetry;
pub mod transition;
pub mod utils;

pub use device::{Device, Participant, Role, Status, TimeStamp};
pub use engine::{DeviceField, DeviceListing, LifecycleEngine, Transfer};
pub use error::{CustodyError, DenialReason, LedgerError};
pub use ledger::{Ledger, MemoryLedger, SledLedger};
pub use router::{FixedInvocation, InvocationContext, Router};
pub use transition::Transition;
