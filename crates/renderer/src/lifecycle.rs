//! Scoped acquisition and release of session resources.
//!
//! Every GPU object and input subscription a session creates is recorded in a
//! [`Lifecycle`] ledger together with the action that releases it. Teardown
//! walks the ledger in reverse acquisition order and runs each action exactly
//! once, so a half-finished setup releases precisely what it created.

use std::fmt;

/// Category of a tracked resource, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Shader,
    Program,
    Buffer,
    Texture,
    Framebuffer,
    Subscription,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Shader => "shader",
            ResourceKind::Program => "program",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Framebuffer => "framebuffer",
            ResourceKind::Subscription => "subscription",
        };
        f.write_str(name)
    }
}

/// Handle to a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

type Release = Box<dyn FnOnce()>;

struct Entry {
    id: ResourceId,
    kind: ResourceKind,
    label: &'static str,
    release: Option<Release>,
}

#[derive(Default)]
pub struct Lifecycle {
    entries: Vec<Entry>,
    next_id: u64,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("live", &self.live())
            .finish()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resource and the action that frees it.
    pub fn track(
        &mut self,
        kind: ResourceKind,
        label: &'static str,
        release: impl FnOnce() + 'static,
    ) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            kind,
            label,
            release: Some(Box::new(release)),
        });
        id
    }

    /// Releases the current holder of `id` and installs a new release action.
    ///
    /// Used when a resource is reallocated in place of an older one, such as
    /// the offscreen texture after a resize. Returns `false` when `id` is not
    /// live; the new action then runs immediately so nothing leaks.
    pub fn replace(&mut self, id: ResourceId, release: impl FnOnce() + 'static) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id && entry.release.is_some())
        else {
            release();
            return false;
        };
        if let Some(previous) = entry.release.replace(Box::new(release)) {
            tracing::debug!(kind = %entry.kind, label = entry.label, "released replaced resource");
            previous();
        }
        true
    }

    /// Number of entries that still hold a release action.
    pub fn live(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.release.is_some())
            .count()
    }

    /// Runs every pending release in reverse acquisition order.
    ///
    /// Returns how many entries were released by this call; a second call
    /// returns zero.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        while let Some(mut entry) = self.entries.pop() {
            if let Some(release) = entry.release.take() {
                tracing::debug!(kind = %entry.kind, label = entry.label, "released resource");
                release();
                released += 1;
            }
        }
        released
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.release_all();
    }
}
