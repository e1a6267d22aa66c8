//! Cache payload and load-state types

use crate::errors::CacheError;
use std::sync::Arc;

/// Load status of a cache payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// Nothing has been read from disk yet
    Unloaded,
    /// Loaded, but the backing file is absent or unusable
    InMemoryOnly,
    /// In memory and known to be persisted
    InMemoryAndOnDisk,
}

/// Immutable snapshot of one store's state and value
#[derive(Debug, Clone, PartialEq)]
pub struct CachePayload<T> {
    pub state: CacheState,
    pub value: T,
}

impl<T> CachePayload<T> {
    pub fn new(state: CacheState, value: T) -> Self {
        Self { state, value }
    }

    /// Fresh payload for a store that has not touched disk
    pub fn unloaded(value: T) -> Self {
        Self::new(CacheState::Unloaded, value)
    }

    /// Same value, different state
    pub fn with_state(self, state: CacheState) -> Self {
        Self {
            state,
            value: self.value,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state != CacheState::Unloaded
    }
}

impl<T: PartialEq> CachePayload<T> {
    /// Whether committing `next` over `self` is visible to subscribers
    ///
    /// A changed value is visible, and so is leaving `Unloaded`. A state
    /// change that keeps the value and was already loaded is not.
    pub fn differs_visibly_from(&self, next: &CachePayload<T>) -> bool {
        self.value != next.value
            || (self.state == CacheState::Unloaded && next.state != CacheState::Unloaded)
    }
}

/// Outcome of a non-blocking read
#[derive(Debug, Clone)]
pub enum AsyncResult<T> {
    /// A load was scheduled; ask again once it has run
    Pending,
    Success(T),
    /// The last background load failed
    Failure(Arc<CacheError>),
}

impl<T> AsyncResult<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The value, if the read succeeded
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Pending | Self::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_change_is_visible() {
        let old = CachePayload::new(CacheState::InMemoryAndOnDisk, 1);
        let new = CachePayload::new(CacheState::InMemoryAndOnDisk, 2);
        assert!(old.differs_visibly_from(&new));
    }

    #[test]
    fn test_leaving_unloaded_is_visible_without_value_change() {
        let old = CachePayload::unloaded(0);
        assert!(old.differs_visibly_from(&CachePayload::new(CacheState::InMemoryOnly, 0)));
        assert!(old.differs_visibly_from(&CachePayload::new(CacheState::InMemoryAndOnDisk, 0)));
    }

    #[test]
    fn test_load_state_churn_is_not_visible() {
        let old = CachePayload::new(CacheState::InMemoryOnly, 5);
        let new = CachePayload::new(CacheState::InMemoryAndOnDisk, 5);
        assert!(!old.differs_visibly_from(&new));
        assert!(!CachePayload::unloaded(5).differs_visibly_from(&CachePayload::unloaded(5)));
    }
}
