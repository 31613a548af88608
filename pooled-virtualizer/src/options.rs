/// Configuration for [`crate::Virtualizer`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualizerOptions {
    /// Number of virtual indexes (the flattened item count).
    pub count: usize,

    /// Viewport size in the scroll axis. `0` means "not attached yet": render passes are
    /// skipped until the host reports a size.
    pub viewport_height: u32,

    /// Minimum pool length, so that one screen is always covered even before anything has
    /// been measured.
    pub min_pool_size: usize,

    /// How many viewports worth of slots the pool grows to during idle time.
    ///
    /// The pool stops growing in the background once the rendered slots cover
    /// `viewport_height * max_pages`.
    pub max_pages: u32,

    /// Fraction of the off-screen content that is never recycled on a scroll pass.
    ///
    /// Keeping part of the hidden slots on the trailing edge means a small scroll back does not
    /// need any re-binding.
    pub protected_ratio: f32,

    /// Pool growth per continuation step, relative to the current pool length.
    pub growth_factor: f32,

    /// Upper bound (milliseconds) for the slot creation work done per idle period.
    pub idle_budget_ms: f64,
}

impl VirtualizerOptions {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            viewport_height: 0,
            min_pool_size: 3,
            max_pages: 2,
            protected_ratio: 0.5,
            growth_factor: 0.5,
            idle_budget_ms: 50.0,
        }
    }

    pub fn with_viewport_height(mut self, viewport_height: u32) -> Self {
        self.viewport_height = viewport_height;
        self
    }

    pub fn with_min_pool_size(mut self, min_pool_size: usize) -> Self {
        self.min_pool_size = min_pool_size.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_protected_ratio(mut self, protected_ratio: f32) -> Self {
        self.protected_ratio = protected_ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f32) -> Self {
        self.growth_factor = growth_factor.max(0.0);
        self
    }

    pub fn with_idle_budget_ms(mut self, idle_budget_ms: f64) -> Self {
        self.idle_budget_ms = idle_budget_ms.max(0.0);
        self
    }
}

impl Default for VirtualizerOptions {
    fn default() -> Self {
        Self::new(0)
    }
}
