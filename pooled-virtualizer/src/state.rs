/// A lightweight, serializable snapshot of the pool and scroll state.
///
/// Useful for debugging overlays, logging and tests. With `feature = "serde"`, this type
/// implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSnapshot {
    pub count: usize,
    pub viewport_height: u32,
    pub virtual_start: usize,
    pub physical_start: usize,
    pub pool_len: usize,
    /// Offset of the first slot in the scroll axis.
    pub physical_top: i64,
    /// Sum of the measured sizes of all slots.
    pub physical_size: i64,
    pub scroll_offset: u64,
    /// Content height the host should currently apply to its scroller. Trails
    /// `estimated_size` by less than one viewport.
    pub total_size: u64,
    /// Latest content height estimate.
    pub estimated_size: u64,
    pub average_size: u32,
    pub measured_count: u64,
}
