//! Pre-mutation validation rules.
//!
//! Pure predicates; nothing here touches state. Rules are evaluated in a fixed
//! order and the first failing rule decides the rejection.

use crate::error::RejectionReason;
use crate::state::set::DelegationSet;
use crate::types::{Address, DelegationKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    SetDelegate,
    ClearDelegate,
    ClearAllDelegates,
}

/// Checks a mutation against the current members of its set.
///
/// `delegate` is required for `SetDelegate` and `ClearDelegate`; passing
/// `None` for those is treated like the zero address.
pub fn validate(
    op: Operation,
    key: &DelegationKey,
    delegate: Option<&Address>,
    members: &DelegationSet,
) -> Result<(), RejectionReason> {
    let delegate = delegate.copied().unwrap_or(Address::ZERO);

    match op {
        Operation::SetDelegate => {
            if delegate.is_zero() {
                return Err(RejectionReason::ZeroAddress);
            }
            if delegate == key.delegator {
                return Err(RejectionReason::SelfDelegation);
            }
            if members.contains(&delegate) {
                return Err(RejectionReason::DuplicateDelegate);
            }
            Ok(())
        }
        // Zero and self can never be members, so both land here.
        Operation::ClearDelegate => {
            if !members.contains(&delegate) {
                return Err(RejectionReason::DelegateNotFound);
            }
            Ok(())
        }
        Operation::ClearAllDelegates => Ok(()),
    }
}
