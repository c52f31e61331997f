//! Core device record, lifecycle statuses and participant roles
use super::error::CustodyError;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

const IDENTIFIER_LETTERS: usize = 2;
const IDENTIFIER_DIGITS: usize = 7;

/// Lifecycle stage of a device. Indices mirror the status codes the ledger
/// has always used; `Sold` is the terminal stage reached by a sale.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    #[n(1)]
    Manufacture,
    #[n(2)]
    Warehouse,
    #[n(3)]
    Retailer,
    #[n(4)]
    Store,
    #[n(5)]
    Return,
    #[n(6)]
    Replace,
    #[n(7)]
    Sold,
}

/// Organizational role carried in a participant's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Manufacturer,
    CustCare,
    Warehouse,
    Store,
    Retailer,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct TimeStamp(DateTime<Utc>);

// Keyed in the ledger by `identifier`
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Device {
    #[n(0)]
    pub identifier: String,
    #[n(1)]
    pub name: Option<String>,
    #[n(2)]
    pub model: Option<String>,
    #[n(3)]
    pub manufacture_date: Option<TimeStamp>,
    #[n(4)]
    pub sale_date: Option<TimeStamp>,
    #[n(5)]
    pub previous_identifier: Option<String>, // set on replacement only
    #[n(6)]
    pub status: Status,
    #[n(7)]
    pub sold_by: Option<String>,
    #[n(8)]
    pub owner: String,
}

/// A caller or counterparty: an actor id plus the affiliation string from its
/// credential. Affiliations naming no known role are kept verbatim so they can
/// be reported, but never satisfy a role check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub affiliation: String,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Manufacture => "MANUFACTURE",
            Status::Warehouse => "WAREHOUSE",
            Status::Retailer => "RETAILER",
            Status::Store => "STORE",
            Status::Return => "RETURN",
            Status::Replace => "REPLACE",
            Status::Sold => "SOLD",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Manufacturer,
        Role::CustCare,
        Role::Warehouse,
        Role::Store,
        Role::Retailer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manufacturer => "manufacturer",
            Role::CustCare => "custcare",
            Role::Warehouse => "warehouse",
            Role::Store => "store",
            Role::Retailer => "retailer",
        }
    }

    pub fn from_affiliation(affiliation: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == affiliation)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TimeStamp {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(TimeStamp)
    }
    /// Parses a calendar date in `YYYY-MM-DD` form as midnight UTC.
    pub fn parse_date(value: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
        Some(Self(date.and_hms_opt(0, 0, 0)?.and_utc()))
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp {
    fn default() -> Self {
        Self::new()
    }
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        TimeStamp(value)
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

// Stored as whole seconds so the encoding cannot fail for any representable date
impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.i64(self.0.timestamp())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let secs = d.i64()?;

        TimeStamp::from_unix(secs).ok_or(minicbor::decode::Error::message(
            "failed to convert timestamp to utc",
        ))
    }
}

impl Device {
    /// A freshly manufactured device owned by `owner`, descriptive fields unset.
    pub fn manufactured(identifier: &str, owner: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: None,
            model: None,
            manufacture_date: None,
            sale_date: None,
            previous_identifier: None,
            status: Status::Manufacture,
            sold_by: None,
            owner: owner.to_string(),
        }
    }
    pub fn is_owned_by(&self, participant: &Participant) -> bool {
        self.owner == participant.id
    }
}

impl Participant {
    pub fn new(id: impl Into<String>, affiliation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            affiliation: affiliation.into(),
        }
    }
    pub fn with_role(id: impl Into<String>, role: Role) -> Self {
        Self::new(id, role.as_str())
    }
    pub fn role(&self) -> Option<Role> {
        Role::from_affiliation(&self.affiliation)
    }
    pub fn holds(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}

/// Two ASCII letters followed by seven ASCII digits, nothing else.
pub fn is_valid_identifier(identifier: &str) -> bool {
    let bytes = identifier.as_bytes();

    bytes.len() == IDENTIFIER_LETTERS + IDENTIFIER_DIGITS
        && bytes[..IDENTIFIER_LETTERS]
            .iter()
            .all(|b| b.is_ascii_alphabetic())
        && bytes[IDENTIFIER_LETTERS..].iter().all(|b| b.is_ascii_digit())
}

pub fn validate_identifier(identifier: &str) -> crate::error::Result<()> {
    if is_valid_identifier(identifier) {
        return Ok(());
    }
    Err(CustodyError::InvalidIdentifier {
        identifier: identifier.to_string(),
    })
}
