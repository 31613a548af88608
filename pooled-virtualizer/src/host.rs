/// The host side of the pool: whatever owns the actual visual elements.
///
/// The virtualizer never holds UI objects. It tells the host how many elements to create,
/// which virtual index each slot shows, and where to put it; the host reports back the
/// rendered size of a slot.
///
/// Slot numbers are stable: slot `i` is the `i`-th element the host created.
pub trait SlotHost {
    /// Appends `count` new elements to the pool.
    fn create_slots(&mut self, count: usize);

    /// Shows the item at virtual index `index` in `slot`.
    fn bind(&mut self, slot: usize, index: usize);

    /// Hides `slot`; called when the slot's virtual index is past the end of the list.
    fn hide(&mut self, _slot: usize) {}

    /// Rendered size of `slot` in the scroll axis.
    fn measure(&mut self, slot: usize) -> u32;

    /// Places `slot` at `offset` in the scroll axis.
    fn position(&mut self, _slot: usize, _offset: i64) {}

    /// Virtual index of the element that currently has focus, if any.
    fn focused_index(&self) -> Option<usize> {
        None
    }

    /// Monotonic clock in milliseconds, used to size idle-time pool growth.
    fn now_ms(&self) -> f64 {
        0.0
    }
}

impl<H: SlotHost + ?Sized> SlotHost for &mut H {
    fn create_slots(&mut self, count: usize) {
        (**self).create_slots(count)
    }

    fn bind(&mut self, slot: usize, index: usize) {
        (**self).bind(slot, index)
    }

    fn hide(&mut self, slot: usize) {
        (**self).hide(slot)
    }

    fn measure(&mut self, slot: usize) -> u32 {
        (**self).measure(slot)
    }

    fn position(&mut self, slot: usize, offset: i64) {
        (**self).position(slot, offset)
    }

    fn focused_index(&self) -> Option<usize> {
        (**self).focused_index()
    }

    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}
