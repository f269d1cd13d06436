//! Offline code allocation.
//!
//! Codes below the floor belong to the backend. Offline records get
//! `max(floor, highest local code + 1)`, so allocations increase
//! monotonically and never land on a server-assigned code.

use stockroom_core::DEFAULT_OFFLINE_FLOOR;

use crate::product::Code;

/// The default reserved threshold as a [`Code`].
pub const OFFLINE_CODE_FLOOR: Code = Code(DEFAULT_OFFLINE_FLOOR);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator {
    floor: Code,
}

impl Default for Allocator {
    fn default() -> Self {
        Self { floor: OFFLINE_CODE_FLOOR }
    }
}

impl Allocator {
    pub fn with_floor(floor: impl Into<Code>) -> Self {
        Self { floor: floor.into() }
    }

    pub fn floor(&self) -> Code {
        self.floor
    }

    /// Pick the code for a new offline record given every code already stored.
    ///
    /// Saturates at `i64::MAX`; callers must still check the result against
    /// `existing` (see `ProductRepository::add`).
    pub fn allocate<I>(&self, existing: I) -> Code
    where
        I: IntoIterator<Item = Code>,
    {
        match existing.into_iter().max() {
            Some(max) => Code(max.0.saturating_add(1).max(self.floor.0)),
            None => self.floor,
        }
    }

    /// Whether `code` lies in the offline range.
    pub fn is_offline_code(&self, code: Code) -> bool {
        code >= self.floor
    }
}

/// Allocate with the default floor.
pub fn allocate<I>(existing: I) -> Code
where
    I: IntoIterator<Item = Code>,
{
    Allocator::default().allocate(existing)
}
