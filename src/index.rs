//! Registry of every device identifier ever created
//!
//! The registry is one ledger record, rewritten in full on every append. It is
//! used for enumeration only: the per-device record decides existence. Two
//! creates racing outside the substrate's total order can lose an append,
//! which leaves a device that exists but is not listed.
use super::error::{CustodyError, LedgerError, Result};
use super::ledger::Ledger;
use tracing::debug;

pub const INDEX_KEY: &str = "device_index";

#[derive(minicbor::Encode, minicbor::Decode, Debug, Default, PartialEq, Eq)]
struct IndexRecord {
    #[n(0)]
    identifiers: Vec<String>,
}

pub struct DeviceIndex<'a, L: ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> DeviceIndex<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    fn load(&self) -> Result<IndexRecord> {
        let bytes = self.ledger.get(INDEX_KEY).map_err(|source| {
            CustodyError::PersistenceError {
                key: INDEX_KEY.to_string(),
                source,
            }
        })?;

        // a ledger that never saw a create has no index yet
        let Some(bytes) = bytes else {
            return Ok(IndexRecord::default());
        };

        minicbor::decode(&bytes).map_err(|err| CustodyError::CorruptRecord {
            identifier: INDEX_KEY.to_string(),
            reason: err.to_string(),
        })
    }

    /// Append `identifier`. Uniqueness is the caller's concern.
    pub fn append(&self, identifier: &str) -> Result<()> {
        let mut record = self.load()?;
        record.identifiers.push(identifier.to_string());

        let persistence = |source: LedgerError| CustodyError::PersistenceError {
            key: INDEX_KEY.to_string(),
            source,
        };
        let cbor = minicbor::to_vec(&record)
            .map_err(|err| persistence(LedgerError::Encode(err.to_string())))?;
        self.ledger.put(INDEX_KEY, cbor).map_err(persistence)?;

        debug!(identifier, entries = record.identifiers.len(), "indexed device");
        Ok(())
    }

    /// Every indexed identifier in creation order.
    pub fn all(&self) -> Result<Vec<String>> {
        Ok(self.load()?.identifiers)
    }
}
