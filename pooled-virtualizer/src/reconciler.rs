/// Scroll offset bookkeeping and drift correction.
///
/// `scroll_top` is the offset most recently requested (by the host's scroll events or by
/// the virtualizer itself); `scroll_position` is the offset the pool was last laid out for.
/// The two differ only between a scroll event and the frame pass that handles it.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScrollReconciler {
    scroll_top: i64,
    scroll_position: i64,
    estimated_height: i64,
    applied_height: i64,
    corrected: bool,
}

impl ScrollReconciler {
    pub(crate) fn scroll_position(&self) -> i64 {
        self.scroll_position
    }

    pub(crate) fn scroll_top(&self) -> i64 {
        self.scroll_top
    }

    pub(crate) fn estimated_height(&self) -> i64 {
        self.estimated_height
    }

    pub(crate) fn applied_height(&self) -> i64 {
        self.applied_height
    }

    fn max_scroll_top(&self, viewport: i64) -> i64 {
        (self.estimated_height - viewport).max(0)
    }

    /// Records a scroll offset reported by the host, clamped to the scrollable range.
    pub(crate) fn request(&mut self, offset: u64, viewport: i64) -> i64 {
        let offset = offset.min(i64::MAX as u64) as i64;
        self.scroll_top = offset.min(self.max_scroll_top(viewport)).max(0);
        self.scroll_top
    }

    /// Consumes the pending scroll request and returns the signed distance travelled.
    pub(crate) fn take_delta(&mut self, viewport: i64) -> i64 {
        let top = self.scroll_top.min(self.max_scroll_top(viewport)).max(0);
        let delta = top - self.scroll_position;
        self.scroll_top = top;
        self.scroll_position = top;
        delta
    }

    /// Moves the scroll offset as if the host's scroller had been set to `pos`.
    ///
    /// Like a real scroller, the offset is clamped to the applied content height. Negative
    /// positions are ignored.
    pub(crate) fn reset_to(&mut self, pos: i64, viewport: i64) {
        if pos < 0 {
            return;
        }
        let max = (self.applied_height - viewport).max(0);
        let pos = pos.min(max);
        if pos != self.scroll_position || pos != self.scroll_top {
            self.corrected = true;
        }
        self.scroll_top = pos;
        self.scroll_position = pos;
    }

    /// Corrects `physical_top` after measurement replaced estimates with exact sizes.
    ///
    /// When the first item is rendered the pool must start at offset `0`; otherwise it must
    /// not start above the top of the content. Whatever drift is removed from the pool is also
    /// removed from the scroll offset so the visible content does not move.
    pub(crate) fn reconcile_top(
        &mut self,
        physical_top: i64,
        at_first_item: bool,
        viewport: i64,
    ) -> i64 {
        let drift = if at_first_item {
            physical_top
        } else {
            (self.scroll_position + physical_top).min(0)
        };
        if drift == 0 {
            return physical_top;
        }
        let pos = self.scroll_position;
        if pos > 0 {
            self.reset_to(pos - drift, viewport);
        }
        physical_top - drift
    }

    /// Updates the estimated content height and decides whether the applied height follows.
    ///
    /// The applied height only jumps when it is unset, when forced, when the offset is near the
    /// estimated end, or when the estimate moved by at least one viewport.
    pub(crate) fn update_height(
        &mut self,
        estimated: i64,
        physical_size: i64,
        viewport: i64,
        force: bool,
    ) {
        self.estimated_height = estimated.max(0);
        let force = force
            || self.applied_height == 0
            || self.scroll_position >= self.estimated_height - physical_size;
        if force || (self.estimated_height - self.applied_height).abs() >= viewport {
            self.applied_height = self.estimated_height;
        }
    }

    pub(crate) fn rewind(&mut self) {
        if self.scroll_top != 0 || self.scroll_position != 0 {
            self.corrected = true;
        }
        self.scroll_top = 0;
        self.scroll_position = 0;
    }

    /// Returns the corrected offset once if the virtualizer moved the scroll position itself.
    pub(crate) fn take_correction(&mut self) -> Option<u64> {
        if !self.corrected {
            return None;
        }
        self.corrected = false;
        Some(self.scroll_position.max(0) as u64)
    }
}
