//! Lifecycle engine: authorization and state transitions for devices
//!
//! Every entry point checks before it writes. Identity is passed in
//! explicitly and the only clock is the invocation timestamp carried by a
//! [`Transfer`], so replicas replaying the same invocation reach the same
//! result.
use super::device::{
    Device, Participant, Role, Status, TimeStamp, is_valid_identifier, validate_identifier,
};
use super::error::{CustodyError, DenialReason, Result};
use super::index::DeviceIndex;
use super::ledger::Ledger;
use super::store::DeviceStore;
use super::transition::{Rule, Stamp, Transition};
use std::sync::Arc;
use tracing::{info, warn};

/// Fields editable through `update`. Descriptive fields belong to the
/// manufacturer before the device ships; sale fields belong to the seller
/// once the device is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceField {
    Name,
    Model,
    ManufactureDate,
    SaleDate,
    SoldBy,
}

/// A requested custody hand-over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub kind: Transition,
    pub recipient: Participant,
    pub submitted_at: TimeStamp,
    pub replaces: Option<String>,
}

/// Result of enumerating devices for a caller. `unreadable` lists indexed
/// identifiers whose records were missing or failed to decode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceListing {
    pub devices: Vec<Device>,
    pub unreadable: Vec<String>,
}

pub struct LifecycleEngine<L> {
    ledger: Arc<L>,
}

impl DeviceField {
    pub const ALL: [DeviceField; 5] = [
        DeviceField::Name,
        DeviceField::Model,
        DeviceField::ManufactureDate,
        DeviceField::SaleDate,
        DeviceField::SoldBy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceField::Name => "name",
            DeviceField::Model => "model",
            DeviceField::ManufactureDate => "manufacture_date",
            DeviceField::SaleDate => "sale_date",
            DeviceField::SoldBy => "sold_by",
        }
    }

    pub fn operation_name(&self) -> &'static str {
        match self {
            DeviceField::Name => "update_name",
            DeviceField::Model => "update_model",
            DeviceField::ManufactureDate => "update_manufacture_date",
            DeviceField::SaleDate => "update_sale_date",
            DeviceField::SoldBy => "update_sold_by",
        }
    }

    pub fn from_operation(name: &str) -> Option<DeviceField> {
        DeviceField::ALL
            .into_iter()
            .find(|field| field.operation_name() == name)
    }

    /// Sale fields are only editable after a sale edge.
    pub fn is_sale_metadata(&self) -> bool {
        matches!(self, DeviceField::SaleDate | DeviceField::SoldBy)
    }
}

impl Transfer {
    pub fn new(kind: Transition, recipient: Participant, submitted_at: TimeStamp) -> Self {
        Self {
            kind,
            recipient,
            submitted_at,
            replaces: None,
        }
    }
    /// Identifier of the device this hand-over replaces.
    pub fn replacing(mut self, identifier: impl Into<String>) -> Self {
        self.replaces = Some(identifier.into());
        self
    }
}

impl<L: Ledger> LifecycleEngine<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    fn store(&self) -> DeviceStore<'_, L> {
        DeviceStore::new(&*self.ledger)
    }

    fn index(&self) -> DeviceIndex<'_, L> {
        DeviceIndex::new(&*self.ledger)
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Load a device without any permission check.
    pub fn retrieve(&self, identifier: &str) -> Result<Device> {
        self.store().retrieve(identifier)
    }

    /// Register a new device in `MANUFACTURE`, owned by the calling manufacturer.
    pub fn create(&self, identifier: &str, caller: &Participant) -> Result<Device> {
        validate_identifier(identifier)?;

        if self.store().exists(identifier)? {
            return Err(CustodyError::DuplicateAsset {
                identifier: identifier.to_string(),
            });
        }

        if !caller.holds(Role::Manufacturer) {
            return Err(CustodyError::denied(
                "create_device",
                DenialReason::CallerAffiliation {
                    expected: Role::Manufacturer,
                    actual: caller.affiliation.clone(),
                },
            ));
        }

        let device = Device::manufactured(identifier, &caller.id);
        self.store().save(&device)?;
        // Last write. If it fails the device exists but is not enumerable;
        // a retried create is rejected as a duplicate rather than re-indexed.
        self.index().append(identifier)?;

        info!(identifier, owner = %caller.id, "device created");
        Ok(device)
    }

    /// Hand `device` over to `transfer.recipient` along one edge of the
    /// transition table.
    pub fn transfer(
        &self,
        mut device: Device,
        caller: &Participant,
        transfer: Transfer,
    ) -> Result<Device> {
        let rule = transfer.kind.rule();
        let operation = transfer.kind.operation_name();

        if let Err(reason) = authorize_transfer(rule, &device, caller, &transfer.recipient) {
            warn!(identifier = %device.identifier, operation, %reason, "transfer denied");
            return Err(CustodyError::denied(operation, reason));
        }

        if transfer.recipient.id.trim().is_empty() {
            return Err(CustodyError::invalid_argument(
                operation,
                "recipient id is empty",
            ));
        }

        match (rule.stamp, transfer.replaces) {
            (Stamp::Replacement, Some(replaces)) => {
                self.check_replacement(operation, &device, &replaces)?;
                device.previous_identifier = Some(replaces);
            }
            (Stamp::Replacement, None) => {
                return Err(CustodyError::invalid_argument(
                    operation,
                    "replacement needs the identifier of the device being replaced",
                ));
            }
            (_, Some(_)) => {
                return Err(CustodyError::invalid_argument(
                    operation,
                    "only a replacement may name a replaced device",
                ));
            }
            (Stamp::Sale, None) => {
                device.sale_date = Some(transfer.submitted_at);
                device.sold_by = Some(caller.id.clone());
            }
            (Stamp::None, None) => {}
        }

        device.owner = transfer.recipient.id;
        device.status = rule.to;
        self.store().save(&device)?;

        info!(
            identifier = %device.identifier,
            operation,
            status = %device.status,
            owner = %device.owner,
            "custody transferred"
        );
        Ok(device)
    }

    fn check_replacement(&self, operation: &str, device: &Device, replaces: &str) -> Result<()> {
        validate_identifier(replaces)?;
        if replaces == device.identifier {
            return Err(CustodyError::invalid_argument(
                operation,
                "a device cannot replace itself",
            ));
        }
        if !self.store().exists(replaces)? {
            return Err(CustodyError::NotFound {
                identifier: replaces.to_string(),
            });
        }
        Ok(())
    }

    /// Edit one field. Descriptive fields are open to the owning manufacturer
    /// while the device is in `MANUFACTURE`; sale fields to the recorded seller
    /// once it is `SOLD`.
    pub fn update(
        &self,
        mut device: Device,
        caller: &Participant,
        field: DeviceField,
        value: &str,
    ) -> Result<Device> {
        let operation = field.operation_name();

        if let Err(reason) = authorize_update(field, &device, caller) {
            warn!(identifier = %device.identifier, operation, %reason, "update denied");
            return Err(CustodyError::denied(operation, reason));
        }

        let value = value.trim();
        if value.is_empty() {
            return Err(CustodyError::invalid_argument(operation, "value is empty"));
        }

        match field {
            DeviceField::Name => device.name = Some(value.to_string()),
            DeviceField::Model => device.model = Some(value.to_string()),
            DeviceField::ManufactureDate => {
                device.manufacture_date = Some(parse_date(operation, value)?);
            }
            DeviceField::SaleDate => device.sale_date = Some(parse_date(operation, value)?),
            DeviceField::SoldBy => device.sold_by = Some(value.to_string()),
        }

        self.store().save(&device)?;

        info!(identifier = %device.identifier, field = field.as_str(), "device updated");
        Ok(device)
    }

    /// The device as the caller may see it: owners and manufacturers only.
    pub fn query_details(&self, device: Device, caller: &Participant) -> Result<Device> {
        if can_view(&device, caller) {
            return Ok(device);
        }
        Err(CustodyError::denied(
            "get_device_details",
            DenialReason::NotEntitled,
        ))
    }

    /// Every indexed device the caller may view, in creation order.
    pub fn query_all(&self, caller: &Participant) -> Result<DeviceListing> {
        let mut listing = DeviceListing::default();

        for identifier in self.index().all()? {
            match self.store().retrieve(&identifier) {
                Ok(device) if can_view(&device, caller) => listing.devices.push(device),
                Ok(_) => {}
                Err(err @ (CustodyError::NotFound { .. } | CustodyError::CorruptRecord { .. })) => {
                    warn!(%identifier, error = %err, "omitting unreadable device from listing");
                    listing.unreadable.push(identifier);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(listing)
    }

    /// True when no device was ever created under `identifier`. Malformed
    /// identifiers can never have been created and do not reach the ledger.
    pub fn check_unique(&self, identifier: &str) -> Result<bool> {
        if !is_valid_identifier(identifier) {
            return Ok(true);
        }
        Ok(!self.store().exists(identifier)?)
    }
}

fn parse_date(operation: &str, value: &str) -> Result<TimeStamp> {
    TimeStamp::parse_date(value).ok_or_else(|| {
        CustodyError::invalid_argument(operation, format!("{value:?} is not a YYYY-MM-DD date"))
    })
}

fn authorize_transfer(
    rule: &Rule,
    device: &Device,
    caller: &Participant,
    recipient: &Participant,
) -> std::result::Result<(), DenialReason> {
    if device.status != rule.from {
        return Err(DenialReason::Status {
            expected: rule.from,
            actual: device.status,
        });
    }
    if !device.is_owned_by(caller) {
        return Err(DenialReason::NotOwner);
    }
    if !caller.holds(rule.caller) {
        return Err(DenialReason::CallerAffiliation {
            expected: rule.caller,
            actual: caller.affiliation.clone(),
        });
    }
    if !recipient.holds(rule.recipient) {
        return Err(DenialReason::RecipientAffiliation {
            expected: rule.recipient,
            actual: recipient.affiliation.clone(),
        });
    }
    Ok(())
}

fn authorize_update(
    field: DeviceField,
    device: &Device,
    caller: &Participant,
) -> std::result::Result<(), DenialReason> {
    if field.is_sale_metadata() {
        return authorize_sale_update(device, caller);
    }
    if device.status != Status::Manufacture {
        return Err(DenialReason::Status {
            expected: Status::Manufacture,
            actual: device.status,
        });
    }
    if !device.is_owned_by(caller) {
        return Err(DenialReason::NotOwner);
    }
    if !caller.holds(Role::Manufacturer) {
        return Err(DenialReason::CallerAffiliation {
            expected: Role::Manufacturer,
            actual: caller.affiliation.clone(),
        });
    }
    Ok(())
}

fn authorize_sale_update(
    device: &Device,
    caller: &Participant,
) -> std::result::Result<(), DenialReason> {
    if device.status != Status::Sold {
        return Err(DenialReason::Status {
            expected: Status::Sold,
            actual: device.status,
        });
    }
    if device.sold_by.as_deref() != Some(caller.id.as_str()) {
        return Err(DenialReason::NotSeller);
    }
    Ok(())
}

fn can_view(device: &Device, caller: &Participant) -> bool {
    device.is_owned_by(caller) || caller.holds(Role::Manufacturer)
}
