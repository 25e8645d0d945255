use crate::types::SurfaceSize;

/// Tracks the backing-buffer size and reports when the displayed size drifts.
///
/// Resize notifications are queued by the host and reconciled between ticks,
/// so a tick always sees one consistent size for the surface, the viewport and
/// the offscreen texture.
#[derive(Debug, Clone, Copy)]
pub struct ResizeSynchronizer {
    backing: SurfaceSize,
}

impl ResizeSynchronizer {
    pub fn new(backing: SurfaceSize) -> Self {
        Self { backing }
    }

    pub fn backing(&self) -> SurfaceSize {
        self.backing
    }

    /// Returns the new backing size when `displayed` differs from it.
    pub fn reconcile(&mut self, displayed: SurfaceSize) -> Option<SurfaceSize> {
        if displayed.is_empty() || displayed == self.backing {
            return None;
        }
        tracing::debug!(from = %self.backing, to = %displayed, "backing buffer resized");
        self.backing = displayed;
        Some(displayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_size_is_a_no_op() {
        let mut sync = ResizeSynchronizer::new(SurfaceSize::new(640, 480));
        assert_eq!(sync.reconcile(SurfaceSize::new(640, 480)), None);
        assert_eq!(sync.backing(), SurfaceSize::new(640, 480));
    }

    #[test]
    fn mismatch_reports_new_size_once() {
        let mut sync = ResizeSynchronizer::new(SurfaceSize::new(640, 480));
        assert_eq!(
            sync.reconcile(SurfaceSize::new(800, 600)),
            Some(SurfaceSize::new(800, 600))
        );
        assert_eq!(sync.backing(), SurfaceSize::new(800, 600));
        assert_eq!(sync.reconcile(SurfaceSize::new(800, 600)), None);
    }

    #[test]
    fn zero_sized_surfaces_are_ignored() {
        let mut sync = ResizeSynchronizer::new(SurfaceSize::new(640, 480));
        assert_eq!(sync.reconcile(SurfaceSize::new(0, 480)), None);
        assert_eq!(sync.reconcile(SurfaceSize::new(640, 0)), None);
        assert_eq!(sync.backing(), SurfaceSize::new(640, 480));
    }
}
