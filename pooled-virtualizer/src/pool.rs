use alloc::vec::Vec;

/// The recycled slot arena.
///
/// Slots are never removed. `start` is the slot that currently represents `virtual_start`;
/// walking forward from it (wrapping at `len`) yields consecutive virtual indexes.
#[derive(Clone, Debug, Default)]
pub(crate) struct SlotPool {
    sizes: Vec<u32>,
    start: usize,
    /// Wall-clock milliseconds spent per created slot during the last growth.
    cost_per_slot_ms: f64,
}

impl SlotPool {
    pub(crate) fn len(&self) -> usize {
        self.sizes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub(crate) fn start(&self) -> usize {
        self.start
    }

    /// The slot representing the last rendered virtual index.
    pub(crate) fn end(&self) -> usize {
        let n = self.len();
        if n == 0 {
            return 0;
        }
        (self.start + n - 1) % n
    }

    pub(crate) fn size(&self, slot: usize) -> u32 {
        self.sizes.get(slot).copied().unwrap_or(0)
    }

    pub(crate) fn set_size(&mut self, slot: usize, size: u32) {
        if let Some(s) = self.sizes.get_mut(slot) {
            *s = size;
        }
    }

    /// Moves the circular start by `delta` slots (either direction).
    pub(crate) fn shift(&mut self, delta: i64) {
        let n = self.len() as i64;
        if n == 0 {
            self.start = 0;
            return;
        }
        self.start = (self.start as i64 + delta).rem_euclid(n) as usize;
    }

    pub(crate) fn rewind(&mut self) {
        self.start = 0;
    }

    /// Slot at position `offset` counted from `start`.
    pub(crate) fn slot_at(&self, offset: usize) -> usize {
        let n = self.len();
        if n == 0 {
            return 0;
        }
        (self.start + offset) % n
    }

    pub(crate) fn cost_per_slot_ms(&self) -> f64 {
        self.cost_per_slot_ms
    }

    pub(crate) fn set_cost_per_slot_ms(&mut self, cost: f64) {
        if cost.is_finite() && cost >= 0.0 {
            self.cost_per_slot_ms = cost;
        }
    }

    /// Target pool length for a growth request of `request` slots.
    ///
    /// The floor guarantees at least a screenful; the ceiling (`available`, the number of virtual
    /// indexes from `virtual_start` to the end) wins over the floor so the pool never outgrows the
    /// list.
    pub(crate) fn plan_growth(&self, request: usize, floor: usize, available: usize) -> usize {
        self.len()
            .saturating_add(request)
            .max(floor)
            .min(available)
    }

    /// Appends `delta` zero-sized slots.
    ///
    /// `focused_slot` is the slot that renders the host's focused item (if any). New slots land
    /// between the last physical slot and slot `0`, so when the pool is wrapped every slot below
    /// `start` would map to a different virtual index afterwards. If the focused slot is one of
    /// those, `start` moves by `delta` so the focused slot keeps its virtual index.
    pub(crate) fn grow(&mut self, delta: usize, focused_slot: Option<usize>) {
        if delta == 0 {
            return;
        }
        let wrapped = self.start > self.end();
        self.sizes.resize(self.sizes.len() + delta, 0);
        if wrapped && focused_slot.is_some_and(|slot| slot < self.start) {
            self.start += delta;
        }
    }

    /// Walks `(slot, virtual_index)` pairs.
    ///
    /// With `slots = None` every slot is visited in virtual order starting at `start`; otherwise
    /// only the given slots are visited, in the given order. The walker copies the pool geometry,
    /// so the pool can be mutated while walking.
    pub(crate) fn walk<'a>(&self, slots: Option<&'a [usize]>, virtual_start: usize) -> SlotWalk<'a> {
        SlotWalk {
            slots: slots.map(|s| s.iter()),
            start: self.start,
            len: self.len(),
            virtual_start,
            next: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SlotWalk<'a> {
    slots: Option<core::slice::Iter<'a, usize>>,
    start: usize,
    len: usize,
    virtual_start: usize,
    next: usize,
}

impl Iterator for SlotWalk<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.len == 0 {
            return None;
        }
        match &mut self.slots {
            Some(slots) => {
                let slot = *slots.next()?;
                let offset = if slot >= self.start {
                    slot - self.start
                } else {
                    self.len - self.start + slot
                };
                Some((slot, self.virtual_start + offset))
            }
            None => {
                if self.next >= self.len {
                    return None;
                }
                let offset = self.next;
                self.next += 1;
                Some(((self.start + offset) % self.len, self.virtual_start + offset))
            }
        }
    }
}
