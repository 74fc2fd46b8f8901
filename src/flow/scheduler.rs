//! Deferred flow checks, one pending slot per surface

use crate::flow::surface::SurfaceId;
use rustc_hash::FxHashMap;

/// Pending checks keyed by surface.
///
/// Scheduling a surface that already has a pending check replaces it and
/// moves it to the back of the order; there is never more than one pending
/// check per surface.
#[derive(Debug, Default)]
pub struct CheckScheduler {
    pending: FxHashMap<SurfaceId, u64>,
    next_ticket: u64,
}

impl CheckScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a check, superseding any pending one for the same surface
    pub fn schedule(&mut self, surface: SurfaceId) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(surface, ticket);
        ticket
    }

    pub fn cancel(&mut self, surface: SurfaceId) -> bool {
        self.pending.remove(&surface).is_some()
    }

    pub fn is_pending(&self, surface: SurfaceId) -> bool {
        self.pending.contains_key(&surface)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain everything due this tick, oldest ticket first
    pub fn take_due(&mut self) -> Vec<SurfaceId> {
        let mut due: Vec<(u64, SurfaceId)> = self
            .pending
            .drain()
            .map(|(surface, ticket)| (ticket, surface))
            .collect();
        due.sort_unstable();
        due.into_iter().map(|(_, surface)| surface).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_supersedes() {
        let mut scheduler = CheckScheduler::new();
        scheduler.schedule(SurfaceId(1));
        scheduler.schedule(SurfaceId(2));
        scheduler.schedule(SurfaceId(1));

        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.take_due(), vec![SurfaceId(2), SurfaceId(1)]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = CheckScheduler::new();
        scheduler.schedule(SurfaceId(7));
        assert!(scheduler.is_pending(SurfaceId(7)));
        assert!(scheduler.cancel(SurfaceId(7)));
        assert!(!scheduler.cancel(SurfaceId(7)));
        assert!(scheduler.take_due().is_empty());
    }
}
