//! Device records in and out of the ledger
use super::device::Device;
use super::error::{CustodyError, LedgerError, Result};
use super::ledger::Ledger;
use tracing::debug;

pub struct DeviceStore<'a, L: ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> DeviceStore<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Load the device stored under `identifier`
    pub fn retrieve(&self, identifier: &str) -> Result<Device> {
        let bytes = self
            .ledger
            .get(identifier)
            .map_err(|source| CustodyError::PersistenceError {
                key: identifier.to_string(),
                source,
            })?
            .ok_or_else(|| CustodyError::NotFound {
                identifier: identifier.to_string(),
            })?;

        minicbor::decode(&bytes).map_err(|err| CustodyError::CorruptRecord {
            identifier: identifier.to_string(),
            reason: err.to_string(),
        })
    }

    /// Presence probe; a record that fails to decode still exists.
    pub fn exists(&self, identifier: &str) -> Result<bool> {
        let record = self
            .ledger
            .get(identifier)
            .map_err(|source| CustodyError::PersistenceError {
                key: identifier.to_string(),
                source,
            })?;
        Ok(record.is_some())
    }

    /// Write the device under its identifier and return the sha256 digest of
    /// the stored bytes. A failed write leaves the previous record in place.
    pub fn save(&self, device: &Device) -> Result<String> {
        let persistence = |source: LedgerError| CustodyError::PersistenceError {
            key: device.identifier.clone(),
            source,
        };

        let cbor = minicbor::to_vec(device)
            .map_err(|err| persistence(LedgerError::Encode(err.to_string())))?;
        let digest = sha256::digest(&cbor);

        self.ledger
            .put(&device.identifier, cbor)
            .map_err(persistence)?;

        debug!(identifier = %device.identifier, %digest, "saved device record");

        Ok(digest)
    }
}
