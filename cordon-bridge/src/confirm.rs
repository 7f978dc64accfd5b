//! The human-confirmation seam (spec §4.I/§5): an external collaborator the
//! embedding app implements to show a native prompt, plus the single-flight
//! guard that enforces "only one active confirmation UI" across however
//! many distinct `requestId`s are outstanding.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::BridgeError;

/// What to show the user before a bridge request is allowed to proceed.
#[derive(Clone, Debug)]
pub struct ConfirmationPrompt {
    pub title: String,
    pub detail: String,
    pub origin: String,
}

#[async_trait]
pub trait ConfirmationUi: Send + Sync {
    /// Returns `true` if the user approved. The bridge never treats a
    /// missing response as approval; an implementation that can't show UI
    /// (backgrounded app, etc.) must return `false`.
    async fn confirm(&self, prompt: ConfirmationPrompt) -> bool;
}

/// Enforces spec §5's "only one active confirmation UI" rule. Acquired for
/// the lifetime of a single gated request; a second request that needs a
/// prompt while one is live is rejected with `AuthInProgress` rather than
/// queued, matching the spec's wording ("MUST be rejected", not "MUST
/// wait").
pub struct AuthGuard {
    active: AtomicBool,
}

impl AuthGuard {
    pub fn new() -> Self {
        Self { active: AtomicBool::new(false) }
    }

    pub fn try_acquire(&self) -> Result<AuthGuardHandle<'_>, BridgeError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| AuthGuardHandle { guard: self })
            .map_err(|_| BridgeError::AuthInProgress)
    }
}

impl Default for AuthGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the guard when dropped, so an early return (denial, error) from
/// a gated handler never leaves the bridge stuck rejecting every further
/// confirmation-requiring request.
pub struct AuthGuardHandle<'a> {
    guard: &'a AuthGuard,
}

impl Drop for AuthGuardHandle<'_> {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn second_acquire_while_active_is_rejected() {
        let guard = AuthGuard::new();
        let first = guard.try_acquire().unwrap();
        assert!(matches!(guard.try_acquire(), Err(BridgeError::AuthInProgress)));
        drop(first);
        assert!(guard.try_acquire().is_ok());
    }
}
