//! SAI error types and status handling.
//!
//! This module provides safe error handling for SAI operations, converting
//! raw SAI status codes into Rust's Result type.

use std::fmt;
use thiserror::Error;

/// SAI status codes matching the SAI C API.
///
/// These values correspond to `sai_status_t` in the SAI header files.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success = 0,
    Failure = -1,
    NotSupported = -2,
    NoMemory = -3,
    InsufficientResources = -4,
    InvalidParameter = -5,
    ItemAlreadyExists = -6,
    ItemNotFound = -7,
    BufferOverflow = -8,
    InvalidPortNumber = -9,
    InvalidPortMember = -10,
    InvalidVlanId = -11,
    Uninitialized = -12,
    TableFull = -13,
    MandatoryAttributeMissing = -14,
    NotImplemented = -15,
    AddrNotFound = -16,
    ObjectInUse = -17,
    InvalidObjectType = -18,
    InvalidObjectId = -19,
    InvalidNifId = -20,
    NifTableFull = -21,
    HwTableFull = -22,
    NotExecuted = -23,
    InvalidAttribute = -24,
    AttrNotImplemented = -25,
    // Add more as needed based on SAI headers
}

impl SaiStatus {
    /// Creates a SaiStatus from a raw i32 value.
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => SaiStatus::Success,
            -1 => SaiStatus::Failure,
            -2 => SaiStatus::NotSupported,
            -3 => SaiStatus::NoMemory,
            -4 => SaiStatus::InsufficientResources,
            -5 => SaiStatus::InvalidParameter,
            -6 => SaiStatus::ItemAlreadyExists,
            -7 => SaiStatus::ItemNotFound,
            -8 => SaiStatus::BufferOverflow,
            -9 => SaiStatus::InvalidPortNumber,
            -10 => SaiStatus::InvalidPortMember,
            -11 => SaiStatus::InvalidVlanId,
            -12 => SaiStatus::Uninitialized,
            -13 => SaiStatus::TableFull,
            -14 => SaiStatus::MandatoryAttributeMissing,
            -15 => SaiStatus::NotImplemented,
            -16 => SaiStatus::AddrNotFound,
            -17 => SaiStatus::ObjectInUse,
            -18 => SaiStatus::InvalidObjectType,
            -19 => SaiStatus::InvalidObjectId,
            -20 => SaiStatus::InvalidNifId,
            -21 => SaiStatus::NifTableFull,
            -22 => SaiStatus::HwTableFull,
            -23 => SaiStatus::NotExecuted,
            -24 => SaiStatus::InvalidAttribute,
            -25 => SaiStatus::AttrNotImplemented,
            _ => SaiStatus::Failure,
        }
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == SaiStatus::Success
    }

    /// Returns true if the status indicates an error.
    pub fn is_error(&self) -> bool {
        *self != SaiStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> SaiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SaiError::from_status(self))
        }
    }

    /// Maps this status to a dispatch policy for the given kind of HAL call.
    ///
    /// `bulker_staged` is true when the create was issued through a deferred
    /// bulk call whose completion races other staged operations on the same
    /// object, e.g. a route create racing the next-hop-group create it
    /// depends on. In that case an `ITEM_ALREADY_EXISTS` on create most
    /// likely means the object was created by an earlier retry of the same
    /// batch and the call should be retried rather than treated as success.
    pub fn hal_policy(self, op: SaiOpKind, bulker_staged: bool) -> HalPolicy {
        match self {
            SaiStatus::Success => HalPolicy::Success,
            SaiStatus::NotSupported | SaiStatus::NotImplemented | SaiStatus::AttrNotImplemented => {
                HalPolicy::Ignore
            }
            SaiStatus::ItemAlreadyExists if op == SaiOpKind::Create => {
                if bulker_staged {
                    HalPolicy::NeedRetry
                } else {
                    HalPolicy::Success
                }
            }
            SaiStatus::ObjectInUse if op == SaiOpKind::Remove => HalPolicy::NeedRetry,
            SaiStatus::InsufficientResources | SaiStatus::NoMemory | SaiStatus::NotExecuted => {
                HalPolicy::NeedRetry
            }
            _ => HalPolicy::Failed,
        }
    }
}

/// The kind of HAL call a [`SaiStatus`] was returned from.
///
/// `hal_policy` needs this because the same status means different things
/// on different calls: `ITEM_ALREADY_EXISTS` is often benign on create,
/// `OBJECT_IN_USE` is only a retry signal on remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaiOpKind {
    Create,
    Remove,
    Set,
}

/// Dispatch policy derived from a HAL status, per the create/remove/set
/// outcome table: ignore unimplemented attributes, let benign
/// already-exists/in-use races retry, and surface everything else as
/// either success or a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalPolicy {
    Success,
    Ignore,
    NeedRetry,
    Failed,
}

impl HalPolicy {
    /// True if the caller should abort and dump pending-task state rather
    /// than retry.
    pub fn is_fatal(self) -> bool {
        matches!(self, HalPolicy::Failed)
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiStatus::Success => "SAI_STATUS_SUCCESS",
            SaiStatus::Failure => "SAI_STATUS_FAILURE",
            SaiStatus::NotSupported => "SAI_STATUS_NOT_SUPPORTED",
            SaiStatus::NoMemory => "SAI_STATUS_NO_MEMORY",
            SaiStatus::InsufficientResources => "SAI_STATUS_INSUFFICIENT_RESOURCES",
            SaiStatus::InvalidParameter => "SAI_STATUS_INVALID_PARAMETER",
            SaiStatus::ItemAlreadyExists => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            SaiStatus::ItemNotFound => "SAI_STATUS_ITEM_NOT_FOUND",
            SaiStatus::BufferOverflow => "SAI_STATUS_BUFFER_OVERFLOW",
            SaiStatus::InvalidPortNumber => "SAI_STATUS_INVALID_PORT_NUMBER",
            SaiStatus::InvalidPortMember => "SAI_STATUS_INVALID_PORT_MEMBER",
            SaiStatus::InvalidVlanId => "SAI_STATUS_INVALID_VLAN_ID",
            SaiStatus::Uninitialized => "SAI_STATUS_UNINITIALIZED",
            SaiStatus::TableFull => "SAI_STATUS_TABLE_FULL",
            SaiStatus::MandatoryAttributeMissing => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            SaiStatus::NotImplemented => "SAI_STATUS_NOT_IMPLEMENTED",
            SaiStatus::AddrNotFound => "SAI_STATUS_ADDR_NOT_FOUND",
            SaiStatus::ObjectInUse => "SAI_STATUS_OBJECT_IN_USE",
            SaiStatus::InvalidObjectType => "SAI_STATUS_INVALID_OBJECT_TYPE",
            SaiStatus::InvalidObjectId => "SAI_STATUS_INVALID_OBJECT_ID",
            SaiStatus::InvalidNifId => "SAI_STATUS_INVALID_NIF_ID",
            SaiStatus::NifTableFull => "SAI_STATUS_NIF_TABLE_FULL",
            SaiStatus::HwTableFull => "SAI_STATUS_HW_TABLE_FULL",
            SaiStatus::NotExecuted => "SAI_STATUS_NOT_EXECUTED",
            SaiStatus::InvalidAttribute => "SAI_STATUS_INVALID_ATTRIBUTE",
            SaiStatus::AttrNotImplemented => "SAI_STATUS_ATTR_NOT_IMPLEMENTED",
        };
        write!(f, "{}", s)
    }
}

/// Error type for SAI operations.
#[derive(Debug, Clone, Error)]
pub enum SaiError {
    /// SAI API returned an error status.
    #[error("SAI operation failed: {status}")]
    Status { status: SaiStatus },

    /// The requested feature is not supported by the SAI implementation.
    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    /// Invalid parameter passed to SAI API.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The requested item was not found.
    #[error("Item not found: {item}")]
    NotFound { item: String },

    /// The item already exists.
    #[error("Item already exists: {item}")]
    AlreadyExists { item: String },

    /// Hardware table is full.
    #[error("Table full: {table}")]
    TableFull { table: String },

    /// Object is in use and cannot be removed.
    #[error("Object in use: {object}")]
    ObjectInUse { object: String },

    /// SAI context is not initialized.
    #[error("SAI not initialized")]
    Uninitialized,

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SaiError {
    /// Creates an error from a SAI status code.
    pub fn from_status(status: SaiStatus) -> Self {
        match status {
            SaiStatus::Success => {
                // This shouldn't happen, but handle it gracefully
                SaiError::Internal {
                    message: "from_status called with success status".to_string(),
                }
            }
            SaiStatus::NotSupported | SaiStatus::NotImplemented | SaiStatus::AttrNotImplemented => {
                SaiError::NotSupported {
                    feature: "unknown".to_string(),
                }
            }
            SaiStatus::InvalidParameter
            | SaiStatus::InvalidPortNumber
            | SaiStatus::InvalidPortMember
            | SaiStatus::InvalidVlanId
            | SaiStatus::InvalidObjectType
            | SaiStatus::InvalidObjectId
            | SaiStatus::InvalidAttribute => SaiError::InvalidParameter {
                message: format!("SAI returned {}", status),
            },
            SaiStatus::ItemNotFound | SaiStatus::AddrNotFound => SaiError::NotFound {
                item: "unknown".to_string(),
            },
            SaiStatus::ItemAlreadyExists => SaiError::AlreadyExists {
                item: "unknown".to_string(),
            },
            SaiStatus::TableFull | SaiStatus::NifTableFull | SaiStatus::HwTableFull => {
                SaiError::TableFull {
                    table: "unknown".to_string(),
                }
            }
            SaiStatus::ObjectInUse => SaiError::ObjectInUse {
                object: "unknown".to_string(),
            },
            SaiStatus::Uninitialized => SaiError::Uninitialized,
            _ => SaiError::Status { status },
        }
    }

    /// Creates a not supported error with a feature description.
    pub fn not_supported(feature: impl Into<String>) -> Self {
        SaiError::NotSupported {
            feature: feature.into(),
        }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a not found error with an item description.
    pub fn not_found(item: impl Into<String>) -> Self {
        SaiError::NotFound { item: item.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(item: impl Into<String>) -> Self {
        SaiError::AlreadyExists { item: item.into() }
    }

    /// Creates a table full error.
    pub fn table_full(table: impl Into<String>) -> Self {
        SaiError::TableFull {
            table: table.into(),
        }
    }

    /// Creates an object in use error.
    pub fn object_in_use(object: impl Into<String>) -> Self {
        SaiError::ObjectInUse {
            object: object.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SaiError::Internal {
            message: message.into(),
        }
    }

    /// Returns the underlying SAI status this error originated from, if
    /// known. Covers the semantic variants too, not just the generic
    /// `Status` catch-all, so policy decisions can be made uniformly from
    /// any `SaiError`.
    pub fn status(&self) -> Option<SaiStatus> {
        match self {
            SaiError::Status { status } => Some(*status),
            SaiError::NotSupported { .. } => Some(SaiStatus::NotSupported),
            SaiError::NotFound { .. } => Some(SaiStatus::ItemNotFound),
            SaiError::AlreadyExists { .. } => Some(SaiStatus::ItemAlreadyExists),
            SaiError::TableFull { .. } => Some(SaiStatus::TableFull),
            SaiError::ObjectInUse { .. } => Some(SaiStatus::ObjectInUse),
            SaiError::Uninitialized => Some(SaiStatus::Uninitialized),
            SaiError::InvalidParameter { .. } | SaiError::Internal { .. } => None,
        }
    }

    /// Maps this error to a dispatch policy for the given kind of HAL call.
    /// See [`SaiStatus::hal_policy`] for the decision table; errors with no
    /// recoverable status (e.g. `Internal`) are always `Failed`.
    pub fn hal_policy(&self, op: SaiOpKind, bulker_staged: bool) -> HalPolicy {
        match self.status() {
            Some(status) => status.hal_policy(op, bulker_staged),
            None => HalPolicy::Failed,
        }
    }

    /// Returns true if this error is retryable regardless of which HAL call
    /// produced it. Operation-specific cases (`OBJECT_IN_USE` on remove,
    /// `ITEM_ALREADY_EXISTS` on a bulker-staged create) aren't covered here
    /// since they need the caller's operation kind; use `hal_policy` for
    /// those.
    pub fn is_retryable(&self) -> bool {
        matches!(self.hal_policy(SaiOpKind::Set, false), HalPolicy::NeedRetry)
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;

/// Extension trait for converting raw SAI status codes.
pub trait SaiStatusExt {
    /// Converts a raw status code to a Result.
    fn to_result(self) -> SaiResult<()>;
}

impl SaiStatusExt for i32 {
    fn to_result(self) -> SaiResult<()> {
        SaiStatus::from_raw(self).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success() {
        assert!(SaiStatus::Success.is_success());
        assert!(!SaiStatus::Success.is_error());
        assert!(SaiStatus::Success.into_result().is_ok());
    }

    #[test]
    fn test_status_failure() {
        assert!(!SaiStatus::Failure.is_success());
        assert!(SaiStatus::Failure.is_error());
        assert!(SaiStatus::Failure.into_result().is_err());
    }

    #[test]
    fn test_status_from_raw() {
        assert_eq!(SaiStatus::from_raw(0), SaiStatus::Success);
        assert_eq!(SaiStatus::from_raw(-7), SaiStatus::ItemNotFound);
        assert_eq!(SaiStatus::from_raw(-999), SaiStatus::Failure);
    }

    #[test]
    fn test_error_from_status() {
        let err = SaiError::from_status(SaiStatus::ItemNotFound);
        assert!(matches!(err, SaiError::NotFound { .. }));

        let err = SaiError::from_status(SaiStatus::TableFull);
        assert!(matches!(err, SaiError::TableFull { .. }));
    }

    #[test]
    fn test_raw_status_to_result() {
        assert!(0_i32.to_result().is_ok());
        assert!((-7_i32).to_result().is_err());
    }

    #[test]
    fn test_error_retryable() {
        let err = SaiError::from_status(SaiStatus::InsufficientResources);
        assert!(err.is_retryable());

        let err = SaiError::from_status(SaiStatus::ItemNotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_hal_policy_not_implemented_is_ignored() {
        assert_eq!(
            SaiStatus::NotImplemented.hal_policy(SaiOpKind::Set, false),
            HalPolicy::Ignore
        );
        assert_eq!(
            SaiStatus::AttrNotImplemented.hal_policy(SaiOpKind::Create, false),
            HalPolicy::Ignore
        );
    }

    #[test]
    fn test_hal_policy_already_exists_on_create() {
        assert_eq!(
            SaiStatus::ItemAlreadyExists.hal_policy(SaiOpKind::Create, false),
            HalPolicy::Success
        );
        assert_eq!(
            SaiStatus::ItemAlreadyExists.hal_policy(SaiOpKind::Create, true),
            HalPolicy::NeedRetry
        );
        // Outside of create, an already-exists race is not expected.
        assert_eq!(
            SaiStatus::ItemAlreadyExists.hal_policy(SaiOpKind::Set, false),
            HalPolicy::Failed
        );
    }

    #[test]
    fn test_hal_policy_object_in_use_on_remove() {
        assert_eq!(
            SaiStatus::ObjectInUse.hal_policy(SaiOpKind::Remove, false),
            HalPolicy::NeedRetry
        );
        // Not a retry signal for other operations.
        assert_eq!(
            SaiStatus::ObjectInUse.hal_policy(SaiOpKind::Create, false),
            HalPolicy::Failed
        );
    }

    #[test]
    fn test_hal_policy_unrecognized_is_failed() {
        assert_eq!(
            SaiStatus::InvalidParameter.hal_policy(SaiOpKind::Set, false),
            HalPolicy::Failed
        );
        assert!(HalPolicy::Failed.is_fatal());
        assert!(!HalPolicy::NeedRetry.is_fatal());
    }

    #[test]
    fn test_error_hal_policy_object_in_use_via_error_variant() {
        // SaiError::ObjectInUse is a semantic variant, not SaiError::Status,
        // so this only works if `status()` recovers the original status.
        let err = SaiError::object_in_use("vrf-oid-5");
        assert!(!err.is_retryable());
        assert_eq!(
            err.hal_policy(SaiOpKind::Remove, false),
            HalPolicy::NeedRetry
        );
    }
}
