//! Categorical result codes for transaction and query handling.
//!
//! Result codes are returned to the consensus engine verbatim, so the
//! `repr` values are part of the external interface and MUST stay stable.

use core::fmt;

use crate::currency::CurrencyError;

/// Transaction result code.
///
/// `Ok` is the only success value. Every other variant is a recoverable,
/// side-effect free rejection, except where the caller decides otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Ok = 0,
    BadParam = 1,
    InvalidAmount = 2,
    NotEnoughBalance = 3,
    SelfTransaction = 4,
    PermissionDenied = 5,
    AlreadyRegistered = 6,
    AlreadyRequested = 7,
    AlreadyGranted = 8,
    ParcelNotFound = 9,
    RequestNotFound = 10,
    UsageNotFound = 11,
    UdcNotFound = 12,
    BadSignature = 13,
    MultipleDelegates = 14,
    DelegateNotFound = 15,
    DelegateExists = 16,
    NoStake = 17,
    StakeLocked = 18,
    LastValidator = 19,
    ImproperTxHeight = 20,
    Replayed = 21,
    Unknown = 1000,
}

impl ResultCode {
    const ALL: [ResultCode; 23] = [
        Self::Ok,
        Self::BadParam,
        Self::InvalidAmount,
        Self::NotEnoughBalance,
        Self::SelfTransaction,
        Self::PermissionDenied,
        Self::AlreadyRegistered,
        Self::AlreadyRequested,
        Self::AlreadyGranted,
        Self::ParcelNotFound,
        Self::RequestNotFound,
        Self::UsageNotFound,
        Self::UdcNotFound,
        Self::BadSignature,
        Self::MultipleDelegates,
        Self::DelegateNotFound,
        Self::DelegateExists,
        Self::NoStake,
        Self::StakeLocked,
        Self::LastValidator,
        Self::ImproperTxHeight,
        Self::Replayed,
        Self::Unknown,
    ];

    /// Convert from the numeric code reported to the consensus engine.
    pub fn from_u32(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_u32() == code)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::BadParam => "BAD_PARAM",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::NotEnoughBalance => "NOT_ENOUGH_BALANCE",
            Self::SelfTransaction => "SELF_TRANSACTION",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::AlreadyRequested => "ALREADY_REQUESTED",
            Self::AlreadyGranted => "ALREADY_GRANTED",
            Self::ParcelNotFound => "PARCEL_NOT_FOUND",
            Self::RequestNotFound => "REQUEST_NOT_FOUND",
            Self::UsageNotFound => "USAGE_NOT_FOUND",
            Self::UdcNotFound => "UDC_NOT_FOUND",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::MultipleDelegates => "MULTIPLE_DELEGATES",
            Self::DelegateNotFound => "DELEGATE_NOT_FOUND",
            Self::DelegateExists => "DELEGATE_EXISTS",
            Self::NoStake => "NO_STAKE",
            Self::StakeLocked => "STAKE_LOCKED",
            Self::LastValidator => "LAST_VALIDATOR",
            Self::ImproperTxHeight => "IMPROPER_TX_HEIGHT",
            Self::Replayed => "REPLAYED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

impl From<CurrencyError> for ResultCode {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::Underflow => Self::NotEnoughBalance,
            CurrencyError::Overflow | CurrencyError::DivisionByZero | CurrencyError::Parse(_) => {
                Self::InvalidAmount
            }
        }
    }
}

/// Query result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum QueryCode {
    Ok = 0,
    BadPath = 1,
    NoKey = 2,
    BadKey = 3,
    NoMatch = 4,
}

impl QueryCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for QueryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::BadPath => write!(f, "BAD_PATH"),
            Self::NoKey => write!(f, "NO_KEY"),
            Self::BadKey => write!(f, "BAD_KEY"),
            Self::NoMatch => write!(f, "NO_MATCH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_repr_values() {
        // Reported to the consensus engine; must never be renumbered
        assert_eq!(ResultCode::Ok as u32, 0);
        assert_eq!(ResultCode::BadParam as u32, 1);
        assert_eq!(ResultCode::NotEnoughBalance as u32, 3);
        assert_eq!(ResultCode::BadSignature as u32, 13);
        assert_eq!(ResultCode::Replayed as u32, 21);
        assert_eq!(ResultCode::Unknown as u32, 1000);
    }

    #[test]
    fn test_result_code_from_u32_roundtrip() {
        for code in ResultCode::ALL {
            assert_eq!(ResultCode::from_u32(code.as_u32()), Some(code));
        }
    }

    #[test]
    fn test_result_code_from_u32_invalid() {
        assert_eq!(ResultCode::from_u32(22), None);
        assert_eq!(ResultCode::from_u32(999), None);
        assert_eq!(ResultCode::from_u32(u32::MAX), None);
    }

    #[test]
    fn test_result_code_is_ok() {
        assert!(ResultCode::Ok.is_ok());
        assert!(!ResultCode::Unknown.is_ok());
    }

    #[test]
    fn test_currency_error_mapping() {
        assert_eq!(ResultCode::from(CurrencyError::Underflow), ResultCode::NotEnoughBalance);
        assert_eq!(ResultCode::from(CurrencyError::Overflow), ResultCode::InvalidAmount);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResultCode::StakeLocked.to_string(), "STAKE_LOCKED");
        assert_eq!(QueryCode::NoMatch.to_string(), "NO_MATCH");
    }
}
