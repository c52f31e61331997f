//! Request routing: operation names and positional arguments to engine calls
//!
//! Mutating operations go through [`Router::invoke`] and must be applied in the
//! substrate's total order; read-only operations go through [`Router::query`].
//! Each surface only knows its own operation names.
use super::device::{Device, Participant, TimeStamp, validate_identifier};
use super::engine::{DeviceField, LifecycleEngine, Transfer};
use super::error::{CustodyError, Result};
use super::ledger::Ledger;
use super::transition::{Stamp, Transition};
use tracing::{debug, warn};

pub const PING_PAYLOAD: &[u8] = b"Hello, world!";

/// What the substrate knows about the in-flight invocation.
///
/// Only the caller is authenticated here. A recipient's affiliation arrives as
/// a positional argument, so the substrate is expected to verify counterparty
/// roles before the invocation reaches the router.
pub trait InvocationContext {
    /// Verified id and affiliation of whoever submitted the invocation.
    fn caller(&self) -> anyhow::Result<Participant>;
    /// Submission time agreed by the substrate. Stamped on sales.
    fn submitted_at(&self) -> TimeStamp;
}

/// An invocation whose identity and timestamp are already known.
#[derive(Debug, Clone)]
pub struct FixedInvocation {
    caller: Option<Participant>,
    submitted_at: TimeStamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateDevice,
    Transfer(Transition),
    Update(DeviceField),
    GetDeviceDetails,
    CheckUniqueDevice,
    GetDevices,
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Invoke,
    Query,
}

pub struct Router<L> {
    engine: LifecycleEngine<L>,
}

impl FixedInvocation {
    pub fn new(caller: Participant, submitted_at: TimeStamp) -> Self {
        Self {
            caller: Some(caller),
            submitted_at,
        }
    }
    /// An invocation whose credential could not be read.
    pub fn anonymous(submitted_at: TimeStamp) -> Self {
        Self {
            caller: None,
            submitted_at,
        }
    }
}

impl InvocationContext for FixedInvocation {
    fn caller(&self) -> anyhow::Result<Participant> {
        self.caller
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no username or role attribute on the credential"))
    }
    fn submitted_at(&self) -> TimeStamp {
        self.submitted_at
    }
}

impl Operation {
    pub fn parse(name: &str) -> Option<Operation> {
        let operation = match name {
            "create_device" => Operation::CreateDevice,
            "get_device_details" => Operation::GetDeviceDetails,
            "check_unique_device" => Operation::CheckUniqueDevice,
            "get_devices" => Operation::GetDevices,
            "ping" => Operation::Ping,
            other => {
                if let Some(kind) = Transition::from_operation(other) {
                    Operation::Transfer(kind)
                } else {
                    Operation::Update(DeviceField::from_operation(other)?)
                }
            }
        };
        Some(operation)
    }

    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::CreateDevice | Operation::Transfer(_) | Operation::Update(_)
        )
    }
}

impl Surface {
    fn allows(&self, operation: &Operation) -> bool {
        match (self, operation) {
            (_, Operation::Ping) => true,
            (Surface::Invoke, op) => op.is_mutating(),
            (Surface::Query, op) => !op.is_mutating(),
        }
    }
}

impl<L: Ledger> Router<L> {
    pub fn new(engine: LifecycleEngine<L>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &LifecycleEngine<L> {
        &self.engine
    }

    /// Run a mutating operation. Returns an empty payload on success.
    pub fn invoke<C, S>(&self, ctx: &C, function: &str, args: &[S]) -> Result<Vec<u8>>
    where
        C: InvocationContext + ?Sized,
        S: AsRef<str>,
    {
        self.route(Surface::Invoke, ctx, function, args)
    }

    /// Run a read-only operation against the latest committed state.
    pub fn query<C, S>(&self, ctx: &C, function: &str, args: &[S]) -> Result<Vec<u8>>
    where
        C: InvocationContext + ?Sized,
        S: AsRef<str>,
    {
        self.route(Surface::Query, ctx, function, args)
    }

    fn route<C, S>(&self, surface: Surface, ctx: &C, function: &str, args: &[S]) -> Result<Vec<u8>>
    where
        C: InvocationContext + ?Sized,
        S: AsRef<str>,
    {
        let caller = ctx
            .caller()
            .map_err(|err| CustodyError::IdentityUnavailable(format!("{err:#}")))?;

        debug!(
            function,
            caller = %caller.id,
            affiliation = %caller.affiliation,
            ?surface,
            "routing invocation"
        );

        let operation = Operation::parse(function)
            .filter(|operation| surface.allows(operation))
            .ok_or_else(|| CustodyError::UnknownOperation {
                name: function.to_string(),
            })?;
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        match operation {
            Operation::CreateDevice => {
                expect_args(function, &args, 1)?;
                self.engine.create(args[0], &caller)?;
                Ok(Vec::new())
            }
            Operation::Transfer(kind) => {
                // recipient id, device, recipient affiliation[, replaced device]
                let arity = match kind.rule().stamp {
                    Stamp::Replacement => 4,
                    _ => 3,
                };
                expect_args(function, &args, arity)?;

                let device = self.retrieve(args[1])?;
                let recipient = Participant::new(args[0], args[2]);
                let mut transfer = Transfer::new(kind, recipient, ctx.submitted_at());
                if let Some(replaces) = args.get(3) {
                    transfer = transfer.replacing(*replaces);
                }

                self.engine.transfer(device, &caller, transfer)?;
                Ok(Vec::new())
            }
            Operation::Update(field) => {
                expect_args(function, &args, 2)?;
                let device = self.retrieve(args[1])?;
                self.engine.update(device, &caller, field, args[0])?;
                Ok(Vec::new())
            }
            Operation::GetDeviceDetails => {
                expect_args(function, &args, 1)?;
                let device = self.retrieve(args[0])?;
                let device = self.engine.query_details(device, &caller)?;
                encode_payload(&device.identifier, &device)
            }
            Operation::CheckUniqueDevice => {
                expect_args(function, &args, 1)?;
                let unique = self.engine.check_unique(args[0])?;
                Ok(unique.to_string().into_bytes())
            }
            Operation::GetDevices => {
                expect_args(function, &args, 0)?;
                let listing = self.engine.query_all(&caller)?;
                if !listing.unreadable.is_empty() {
                    warn!(
                        omitted = listing.unreadable.len(),
                        returned = listing.devices.len(),
                        "device listing is incomplete"
                    );
                }
                encode_payload("get_devices", &listing.devices)
            }
            Operation::Ping => Ok(PING_PAYLOAD.to_vec()),
        }
    }

    // only well-formed identifiers are read as devices
    fn retrieve(&self, identifier: &str) -> Result<Device> {
        validate_identifier(identifier)?;
        self.engine.retrieve(identifier)
    }
}

fn expect_args(operation: &str, args: &[&str], expected: usize) -> Result<()> {
    if args.len() == expected {
        return Ok(());
    }
    Err(CustodyError::invalid_argument(
        operation,
        format!("expected {expected} arguments, got {}", args.len()),
    ))
}

fn encode_payload<T: minicbor::Encode<()>>(subject: &str, value: &T) -> Result<Vec<u8>> {
    minicbor::to_vec(value).map_err(|err| CustodyError::CorruptRecord {
        identifier: subject.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_operation_name() {
        assert_eq!(Operation::parse("create_device"), Some(Operation::CreateDevice));
        assert_eq!(Operation::parse("get_devices"), Some(Operation::GetDevices));
        assert_eq!(
            Operation::parse("warehouse_to_retailer"),
            Some(Operation::Transfer(Transition::WarehouseToRetailer))
        );
        assert_eq!(
            Operation::parse("update_model"),
            Some(Operation::Update(DeviceField::Model))
        );
        assert_eq!(
            Operation::parse("update_sold_by"),
            Some(Operation::Update(DeviceField::SoldBy))
        );
        for kind in Transition::ALL {
            assert_eq!(
                Operation::parse(kind.operation_name()),
                Some(Operation::Transfer(kind))
            );
        }
        assert_eq!(Operation::parse("get_vehicles"), None);
        assert_eq!(Operation::parse(""), None);
    }

    #[test]
    fn surfaces_split_reads_from_writes() {
        let create = Operation::CreateDevice;
        let details = Operation::GetDeviceDetails;

        assert!(Surface::Invoke.allows(&create));
        assert!(!Surface::Query.allows(&create));
        assert!(Surface::Query.allows(&details));
        assert!(!Surface::Invoke.allows(&details));
        assert!(Surface::Invoke.allows(&Operation::Ping));
        assert!(Surface::Query.allows(&Operation::Ping));
    }

    #[test]
    fn argument_count_is_checked() {
        assert!(expect_args("create_device", &["AB1234567"], 1).is_ok());

        let err = expect_args("create_device", &[], 1).unwrap_err();
        assert!(matches!(err, CustodyError::InvalidArgument { .. }));
        assert!(err.to_string().contains("expected 1 arguments, got 0"));
    }

    #[test]
    fn fixed_invocation_without_caller_fails() {
        let ctx = FixedInvocation::anonymous(TimeStamp::new());
        assert!(ctx.caller().is_err());
    }
}
