//! Infinite-scroll trigger.
//!
//! The view reports sentinel visibility through an [`ObserverHandle`]. Each
//! time the screen disconnects or reconnects the observer, older handles
//! stop counting, so a notification from a torn-down sentinel can never
//! load a page into the wrong query.

/// Identifies one connection of the sentinel observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle {
    epoch: u64,
}

/// A visibility observation of the sentinel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
    /// Distance in rows between the sentinel and the viewport edge
    pub distance: u32,
}

impl IntersectionEntry {
    pub fn visible() -> Self {
        Self {
            is_intersecting: true,
            distance: 0,
        }
    }

    pub fn below(distance: u32) -> Self {
        Self {
            is_intersecting: false,
            distance,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    root_margin: u32,
    epoch: u64,
    connected: bool,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ScrollTrigger {
    /// `root_margin` widens the viewport: a sentinel this close counts as
    /// visible.
    pub fn new(root_margin: u32) -> Self {
        Self {
            root_margin,
            epoch: 0,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Start observing; returns the handle notifications must carry
    pub fn connect(&mut self) -> ObserverHandle {
        self.epoch += 1;
        self.connected = true;
        ObserverHandle { epoch: self.epoch }
    }

    /// Stop observing. Handles issued so far become stale.
    pub fn disconnect(&mut self) {
        if self.connected {
            tracing::debug!(epoch = self.epoch, "sentinel observer disconnected");
        }
        self.epoch += 1;
        self.connected = false;
    }

    /// Tear down and re-observe, e.g. after the query changed
    pub fn reconnect(&mut self) -> ObserverHandle {
        self.disconnect();
        self.connect()
    }

    pub fn is_current(&self, handle: ObserverHandle) -> bool {
        self.connected && handle.epoch == self.epoch
    }

    /// Whether this observation should load the next page
    pub fn notify(
        &self,
        handle: ObserverHandle,
        entry: IntersectionEntry,
        has_more: bool,
        loading: bool,
    ) -> bool {
        if !self.is_current(handle) {
            tracing::debug!("ignoring notification from stale sentinel observer");
            return false;
        }
        let in_range = entry.is_intersecting || entry.distance <= self.root_margin;
        in_range && has_more && !loading
    }

    /// The sentinel exists only while there is something left to load
    pub fn should_render_sentinel(has_more: bool) -> bool {
        has_more
    }
}
