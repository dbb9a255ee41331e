//! Error types.

use core::fmt;

/// Why a mutation attempt was refused.
///
/// Rejections never change state and never produce an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// The delegate is the reserved all-zero address.
    ZeroAddress,
    /// The delegate is the delegator itself.
    SelfDelegation,
    /// The delegate is already a member of the set.
    DuplicateDelegate,
    /// The delegate is not a member of the set.
    DelegateNotFound,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::ZeroAddress => "Can't delegate to 0x0",
            RejectionReason::SelfDelegation => "Can't delegate to self",
            RejectionReason::DuplicateDelegate => "Already delegated to this address",
            RejectionReason::DelegateNotFound => "Delegate not found",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A command failed validation.
    Rejected(RejectionReason),
    /// An event arrived ahead of the reducer's cursor.
    OutOfOrder { expected: u64, found: u64 },
    /// Malformed encoded input (checkpoint body, hex text).
    InvalidInput,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Rejected(reason) => write!(f, "rejected: {}", reason),
            KernelError::OutOfOrder { expected, found } => {
                write!(f, "event out of order: expected sequence {}, found {}", expected, found)
            }
            KernelError::InvalidInput => f.write_str("invalid input"),
        }
    }
}

impl From<RejectionReason> for KernelError {
    fn from(reason: RejectionReason) -> Self {
        KernelError::Rejected(reason)
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
