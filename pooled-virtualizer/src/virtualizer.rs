use alloc::vec::Vec;
use core::ops::Range;

use crate::estimator::{SizeEstimator, div_round};
use crate::pool::SlotPool;
use crate::reconciler::ScrollReconciler;
use crate::scheduler::{Lane, Scheduler, Task};
use crate::{PoolItem, PoolSnapshot, ScrollDirection, SlotHost, VirtualRange, VirtualizerOptions};

// Upper bound on pool-growth continuations run by one microtask drain. Whatever is left
// stays queued for the next drain.
const MAX_MICROTASK_ROUNDS: usize = 64;

struct Reusables {
    slots: Vec<usize>,
    physical_top: i64,
}

/// A headless, element-recycling virtualizer.
///
/// The virtualizer keeps a small pool of slots (visual elements owned by a [`SlotHost`]) and
/// moves them around so that they always cover the viewport, no matter how large `count` is:
///
/// - `virtual_start` is the first virtual index represented by the pool, and the pool's
///   circular start slot represents it.
/// - `physical_top` is the scroll-axis offset of that slot; the others follow back to back.
/// - Sizes of items that were never rendered are projected from a running average of measured
///   sizes, which is also what the (estimated) content height is made of.
///
/// Work is split into lanes (see [`Lane`]): the host reports events (`on_scroll`,
/// `set_viewport_height`, ...) which only schedule work, and then drives the queue with
/// [`Virtualizer::run_frame`], [`Virtualizer::run_microtasks`] and [`Virtualizer::run_idle`].
#[derive(Clone, Debug)]
pub struct Virtualizer {
    options: VirtualizerOptions,
    count: usize,
    viewport_height: u32,
    virtual_start: usize,
    physical_top: i64,
    physical_size: i64,
    pool: SlotPool,
    estimator: SizeEstimator,
    scroll: ScrollReconciler,
    scheduler: Scheduler,
    scroll_direction: Option<ScrollDirection>,
}

impl Virtualizer {
    pub fn new(options: VirtualizerOptions) -> Self {
        vdebug!(
            count = options.count,
            viewport_height = options.viewport_height,
            min_pool_size = options.min_pool_size,
            "Virtualizer::new"
        );
        let mut v = Self {
            count: options.count,
            viewport_height: options.viewport_height,
            options,
            virtual_start: 0,
            physical_top: 0,
            physical_size: 0,
            pool: SlotPool::default(),
            estimator: SizeEstimator::default(),
            scroll: ScrollReconciler::default(),
            scheduler: Scheduler::default(),
            scroll_direction: None,
        };
        v.scheduler.debounce(
            Lane::Frame,
            Task::Render {
                reset_average: false,
            },
        );
        v
    }

    pub fn options(&self) -> &VirtualizerOptions {
        &self.options
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    /// Number of slots in the pool.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// First virtual index represented by the pool.
    pub fn virtual_start(&self) -> usize {
        self.virtual_start
    }

    /// Slot that represents [`Virtualizer::virtual_start`].
    pub fn physical_start(&self) -> usize {
        self.pool.start()
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll.scroll_top().max(0) as u64
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    /// Content height the host should give its scroller.
    ///
    /// This follows the estimate lazily (see [`Virtualizer::estimated_size`]) to avoid scrollbar
    /// jitter while sizes are being discovered.
    pub fn total_size(&self) -> u64 {
        self.scroll.applied_height().max(0) as u64
    }

    pub fn estimated_size(&self) -> u64 {
        self.scroll.estimated_height().max(0) as u64
    }

    pub fn average_size(&self) -> u32 {
        self.estimator.average()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            count: self.count,
            viewport_height: self.viewport_height,
            virtual_start: self.virtual_start,
            physical_start: self.pool.start(),
            pool_len: self.pool.len(),
            physical_top: self.physical_top,
            physical_size: self.physical_size,
            scroll_offset: self.scroll_offset(),
            total_size: self.total_size(),
            estimated_size: self.estimated_size(),
            average_size: self.estimator.average(),
            measured_count: self.estimator.measured_count(),
        }
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.scheduler.is_empty()
    }

    pub fn has_pending(&self, lane: Lane) -> bool {
        self.scheduler.has(lane)
    }

    // ---- host events ---------------------------------------------------------------------

    /// Updates the viewport size (aka "update viewport boundaries").
    ///
    /// Sizes measured under the old geometry are no longer trusted: the next frame resets the
    /// running average and re-renders the pool.
    pub fn set_viewport_height(&mut self, viewport_height: u32) {
        if self.viewport_height == viewport_height {
            return;
        }
        vdebug!(
            from = self.viewport_height,
            to = viewport_height,
            "set_viewport_height"
        );
        self.viewport_height = viewport_height;
        self.options.viewport_height = viewport_height;
        self.scheduler.debounce(
            Lane::Frame,
            Task::Render {
                reset_average: true,
            },
        );
    }

    /// Reports that rendered items changed size without a viewport change (e.g. fonts loaded,
    /// column widths changed). Handled like a viewport resize.
    pub fn items_resized(&mut self) {
        self.scheduler.debounce(
            Lane::Frame,
            Task::Render {
                reset_average: true,
            },
        );
    }

    /// Reports a new scroll offset from the host's scroller.
    ///
    /// The offset is clamped immediately and returned; recycling happens on the next frame, so
    /// any number of scroll events between two frames costs one pass.
    pub fn on_scroll(&mut self, offset: u64) -> u64 {
        let before = self.scroll.scroll_top();
        let clamped = self.scroll.request(offset, self.viewport());
        self.scroll_direction = match clamped.cmp(&before) {
            core::cmp::Ordering::Greater => Some(ScrollDirection::Forward),
            core::cmp::Ordering::Less => Some(ScrollDirection::Backward),
            core::cmp::Ordering::Equal => self.scroll_direction,
        };
        vtrace!(offset, clamped, "on_scroll");
        self.scheduler.debounce(Lane::Frame, Task::Scroll);
        clamped as u64
    }

    /// Full items change: the list is replaced (new sort order, new filter, ...).
    ///
    /// The pool is rewound to the first item and scrolled to the top; the next frame re-binds
    /// every slot.
    pub fn reset(&mut self, count: usize) {
        vdebug!(count, "reset");
        self.count = count;
        self.options.count = count;
        self.rewind();
        // Queued scroll and growth work refers to the old list.
        self.scheduler.cancel_all();
        self.scheduler.debounce(
            Lane::Frame,
            Task::Render {
                reset_average: false,
            },
        );
    }

    /// Changes the item count while keeping the first visible item where it is on screen.
    pub fn set_count(&mut self, host: &mut impl SlotHost, count: usize) {
        if self.count == count {
            return;
        }
        vdebug!(from = self.count, to = count, "set_count");
        let anchor = self
            .first_visible_index()
            .and_then(|index| Some((index, self.index_scroll_offset(index)?)));

        self.count = count;
        self.options.count = count;
        self.rewind();
        if self.viewport_height == 0 {
            self.scheduler.debounce(
                Lane::Frame,
                Task::Render {
                    reset_average: false,
                },
            );
            return;
        }
        self.render(host);

        let Some((index, before)) = anchor else {
            return;
        };
        if count == 0 {
            return;
        }
        let index = index.min(count - 1);
        self.scroll_to_index(host, index);
        if let Some(after) = self.index_scroll_offset(index) {
            if after != before {
                let target = self.scroll.scroll_position() + (before - after);
                self.scroll.request(target.max(0) as u64, self.viewport());
                self.handle_scroll(host);
            }
        }
    }

    // ---- scheduling ----------------------------------------------------------------------

    /// Runs the frame lane (render / scroll passes queued so far), then the microtask lane.
    ///
    /// Returns the new scroll offset if the virtualizer moved it; the host should apply it to its
    /// scroller.
    pub fn run_frame(&mut self, host: &mut impl SlotHost) -> Option<u64> {
        // Work scheduled while this frame runs waits for the next one.
        let tasks = self.scheduler.drain(Lane::Frame);
        for task in tasks {
            self.run_task(host, task);
        }
        self.drain_microtasks(host);
        self.scroll.take_correction()
    }

    pub fn run_microtasks(&mut self, host: &mut impl SlotHost) -> Option<u64> {
        self.drain_microtasks(host);
        self.scroll.take_correction()
    }

    /// Runs one idle-lane task (a chunk of pool growth), then the microtask lane.
    pub fn run_idle(&mut self, host: &mut impl SlotHost) -> Option<u64> {
        if let Some(task) = self.scheduler.pop(Lane::Idle) {
            self.run_task(host, task);
        }
        self.drain_microtasks(host);
        self.scroll.take_correction()
    }

    /// Runs all pending frame and microtask work right now.
    pub fn flush(&mut self, host: &mut impl SlotHost) -> Option<u64> {
        while self.scheduler.has(Lane::Frame) {
            let tasks = self.scheduler.drain(Lane::Frame);
            for task in tasks {
                self.run_task(host, task);
            }
            self.drain_microtasks(host);
        }
        self.scroll.take_correction()
    }

    /// Returns the scroll offset once if the virtualizer moved it since the last call.
    pub fn take_scroll_correction(&mut self) -> Option<u64> {
        self.scroll.take_correction()
    }

    fn drain_microtasks(&mut self, host: &mut impl SlotHost) {
        for _ in 0..MAX_MICROTASK_ROUNDS {
            let Some(task) = self.scheduler.pop(Lane::Microtask) else {
                return;
            };
            self.run_task(host, task);
        }
    }

    fn run_task(&mut self, host: &mut impl SlotHost, task: Task) {
        match task {
            Task::Render { reset_average } => {
                if reset_average {
                    self.estimator.reset();
                }
                self.render(host);
            }
            Task::Scroll => self.handle_scroll(host),
            Task::IncreasePool(request) => self.increase_pool_if_needed(host, request),
        }
    }

    // ---- passes --------------------------------------------------------------------------

    /// Render pass: recycles what scrolled out at the top, re-binds and re-measures the whole
    /// pool, and starts pool growth. On the first call this creates the initial pool.
    pub fn render(&mut self, host: &mut impl SlotHost) {
        if self.viewport_height == 0 {
            return;
        }
        if !self.pool.is_empty() {
            let reusables = self.get_reusables(true);
            let recycled = reusables.slots.len();
            self.physical_top = reusables.physical_top;
            self.virtual_start += recycled;
            self.pool.shift(recycled as i64);
            self.update(host, Some(&reusables.slots), false);
            self.update(host, None, false);
            self.increase_pool_if_needed(host, 0);
        } else if self.count > 0 {
            self.increase_pool_if_needed(host, self.options.min_pool_size);
        }
    }

    fn handle_scroll(&mut self, host: &mut impl SlotHost) {
        let delta = self.scroll.take_delta(self.viewport());
        if delta == 0 || self.pool.is_empty() {
            return;
        }
        let down = delta > 0;

        if delta.abs() > self.physical_size && self.physical_size > 0 {
            // Random access: nothing in the pool survives, so jump by the estimate.
            let average = (self.estimator.average() as i64).max(1);
            let jump = div_round(delta, average);
            vdebug!(delta, jump, "random scroll jump");
            self.set_virtual_start(self.virtual_start as i64 + jump);
            self.pool.shift(jump);
            self.physical_top =
                (self.virtual_start as i64 * average).min(self.scroll.scroll_position());
            self.update(host, None, false);
            return;
        }

        let reusables = self.get_reusables(down);
        let recycled = reusables.slots.len();
        if down {
            self.physical_top = reusables.physical_top;
            self.virtual_start += recycled;
            self.pool.shift(recycled as i64);
        } else {
            self.virtual_start -= recycled;
            self.pool.shift(-(recycled as i64));
        }
        vtrace!(recycled, down, "recycle");
        self.update(host, Some(&reusables.slots), !down);
        self.scheduler.debounce(Lane::Microtask, Task::IncreasePool(0));
    }

    /// Collects the slots that scrolled out on the trailing edge.
    ///
    /// Walking from the trailing edge, slots are taken while the off-screen content left behind
    /// them stays larger than the protected share of the hidden content.
    fn get_reusables(&self, from_top: bool) -> Reusables {
        let mut slots = Vec::new();
        let len = self.pool.len();
        let mut top = self.physical_top;
        if len == 0 {
            return Reusables {
                slots,
                physical_top: top,
            };
        }
        let protected =
            (self.hidden_content_size() as f64 * self.options.protected_ratio as f64) as i64;
        let scroll_top = self.scroll.scroll_position();
        let scroll_bottom = self.scroll_bottom();

        let (mut slot, mut off_screen) = if from_top {
            (self.pool.start(), scroll_top - top)
        } else {
            (self.pool.end(), self.physical_bottom() - scroll_bottom)
        };

        loop {
            let size = self.pool.size(slot) as i64;
            off_screen -= size;
            if slots.len() >= len || off_screen <= protected {
                break;
            }
            if from_top {
                if self.virtual_end() + slots.len() + 1 >= self.count {
                    break;
                }
                if top + size >= scroll_top {
                    break;
                }
                slots.push(slot);
                top += size;
                slot = (slot + 1) % len;
            } else {
                if self.virtual_start <= slots.len() {
                    break;
                }
                if top + self.physical_size - size <= scroll_bottom {
                    break;
                }
                slots.push(slot);
                top -= size;
                slot = if slot == 0 { len - 1 } else { slot - 1 };
            }
        }

        Reusables {
            slots,
            physical_top: top,
        }
    }

    /// Re-binds, re-measures and re-positions `slots` (all slots when `None`).
    ///
    /// `moving_up` is set when the slots were recycled to the leading edge above the pool, in
    /// which case the pool's top moves up by their freshly measured sizes.
    fn update(&mut self, host: &mut impl SlotHost, slots: Option<&[usize]>, moving_up: bool) {
        if self.pool.is_empty() || slots.is_some_and(|s| s.is_empty()) {
            return;
        }
        self.assign(host, slots);
        self.update_metrics(host, slots);
        if moving_up {
            for &slot in slots.unwrap_or(&[]) {
                self.physical_top -= self.pool.size(slot) as i64;
            }
        }
        self.position_items(host);
        self.update_scroller_size(false);
    }

    fn assign(&self, host: &mut impl SlotHost, slots: Option<&[usize]>) {
        for (slot, index) in self.pool.walk(slots, self.virtual_start) {
            if index < self.count {
                host.bind(slot, index);
            } else {
                host.hide(slot);
            }
        }
    }

    /// Re-measures `slots` and folds the new sizes into the running average.
    fn update_metrics(&mut self, host: &mut impl SlotHost, slots: Option<&[usize]>) {
        let mut old_size = 0i64;
        let mut new_size = 0i64;
        let mut nonzero = 0u64;
        for (slot, index) in self.pool.walk(slots, self.virtual_start) {
            old_size += self.pool.size(slot) as i64;
            let size = if index < self.count {
                host.measure(slot)
            } else {
                0
            };
            self.pool.set_size(slot, size);
            new_size += size as i64;
            if size > 0 {
                nonzero += 1;
            }
        }
        self.physical_size += new_size - old_size;
        self.estimator.fold(new_size as u64, nonzero);
    }

    /// Lays the pool out back to back from `physical_top`, after correcting drift.
    fn position_items(&mut self, host: &mut impl SlotHost) {
        self.physical_top =
            self.scroll
                .reconcile_top(self.physical_top, self.virtual_start == 0, self.viewport());
        let mut y = self.physical_top;
        for (slot, _) in self.pool.walk(None, self.virtual_start) {
            host.position(slot, y);
            y += self.pool.size(slot) as i64;
        }
    }

    fn update_scroller_size(&mut self, force: bool) {
        let remaining = self
            .count
            .saturating_sub(self.pool.len() + self.virtual_start) as i64;
        let estimated = self.physical_bottom() + remaining * self.estimator.average() as i64;
        self.scroll
            .update_height(estimated, self.physical_size, self.viewport(), force);
    }

    /// Grows the pool by `request` slots (within floor and ceiling) and schedules the next step.
    ///
    /// While the viewport is not covered, growth continues as a microtask. Once it is, the pool
    /// keeps growing in idle-time chunks sized by the measured per-slot creation cost until it
    /// covers `max_pages` viewports.
    fn increase_pool_if_needed(&mut self, host: &mut impl SlotHost, request: usize) {
        let available = self.count.saturating_sub(self.virtual_start);
        let len = self.pool.len();
        let next = self
            .pool
            .plan_growth(request, self.options.min_pool_size, available);
        if next < len {
            return;
        }
        let mut next_increase = self.growth_step(len);

        if next > len {
            let delta = next - len;
            let started = host.now_ms();
            let focused_slot = host
                .focused_index()
                .filter(|&index| self.is_index_rendered(index))
                .map(|index| self.pool.slot_at(index - self.virtual_start));
            host.create_slots(delta);
            self.pool.grow(delta, focused_slot);
            vdebug!(delta, pool_len = self.pool.len(), "pool grown");
            self.update(host, None, false);
            let elapsed = host.now_ms() - started;
            self.pool.set_cost_per_slot_ms(elapsed / delta as f64);
            next_increase = self.growth_step(self.pool.len());
        }

        if self.physical_size <= 0 {
            // Nothing measurable was rendered; growing further would never fill the viewport.
            return;
        }
        if self.virtual_end() + 1 >= self.count || next_increase == 0 {
            return;
        }
        if !self.is_client_full() {
            self.scheduler
                .debounce(Lane::Microtask, Task::IncreasePool(next_increase));
        } else if self.physical_size < self.opt_physical_size() {
            let cost = self.pool.cost_per_slot_ms();
            let chunk = if cost > 0.0 {
                (self.options.idle_budget_ms / cost + 0.5) as usize
            } else {
                next_increase
            };
            self.scheduler
                .debounce(Lane::Idle, Task::IncreasePool(chunk.clamp(1, next_increase)));
        }
    }

    fn growth_step(&self, len: usize) -> usize {
        (len as f32 * self.options.growth_factor + 0.5) as usize
    }

    // ---- random access -------------------------------------------------------------------

    /// Scrolls so that `index` is visible and returns the new scroll offset.
    ///
    /// Once the pool covers more than the viewport, `index` lands at the top (or as close as the
    /// end of the list allows). Before that, the row above it may be the first one shown.
    ///
    /// The target offset is computed from exact measured sizes, not from the estimate.
    pub fn scroll_to_index(&mut self, host: &mut impl SlotHost, index: usize) -> u64 {
        if self.count == 0 {
            return self.scroll_offset();
        }
        let index = index.min(self.count - 1);
        if self.pool.is_empty() {
            self.render(host);
        }
        if self.pool.is_empty() {
            return self.scroll_offset();
        }
        vdebug!(index, "scroll_to_index");

        if !self.is_index_rendered(index) || index >= self.max_virtual_start() {
            self.set_virtual_start(index as i64 - 1);
        }
        self.assign(host, None);
        self.update_metrics(host, None);
        self.physical_top = self.virtual_start as i64 * self.estimator.average() as i64;

        let len = self.pool.len();
        let hidden = self.hidden_content_size();
        let mut slot = self.pool.start();
        let mut current = self.virtual_start;
        let mut target = 0i64;
        while current < index && target <= hidden {
            target += self.pool.size(slot) as i64;
            slot = (slot + 1) % len;
            current += 1;
        }

        self.update_scroller_size(true);
        self.position_items(host);
        self.scroll
            .reset_to(self.physical_top + target, self.viewport());
        self.increase_pool_if_needed(host, 0);
        self.scroll_offset()
    }

    // ---- data refresh --------------------------------------------------------------------

    /// Re-binds and re-measures the rendered slots whose virtual index lies in `range`.
    ///
    /// Use this when the data behind some indexes arrived or changed while `count` stayed the
    /// same.
    pub fn update_items(&mut self, host: &mut impl SlotHost, range: Range<usize>) {
        let count = self.count;
        let slots: Vec<usize> = self
            .pool
            .walk(None, self.virtual_start)
            .filter(|&(_, index)| index < count && range.contains(&index))
            .map(|(slot, _)| slot)
            .collect();
        self.update(host, Some(&slots), false);
    }

    /// Re-binds and re-measures every slot.
    pub fn refresh(&mut self, host: &mut impl SlotHost) {
        self.update(host, None, false);
    }

    // ---- queries -------------------------------------------------------------------------

    /// First virtual index whose slot reaches into the viewport.
    pub fn first_visible_index(&self) -> Option<usize> {
        if self.pool.is_empty() || self.count == 0 {
            return None;
        }
        let scroll_top = self.scroll.scroll_position();
        let mut offset = self.physical_top;
        for (slot, index) in self.pool.walk(None, self.virtual_start) {
            if index >= self.count {
                break;
            }
            offset += self.pool.size(slot) as i64;
            if offset > scroll_top {
                return Some(index);
            }
        }
        None
    }

    /// Last virtual index whose slot starts inside the viewport.
    pub fn last_visible_index(&self) -> Option<usize> {
        if self.pool.is_empty() || self.count == 0 {
            return None;
        }
        let scroll_bottom = self.scroll_bottom();
        let mut offset = self.physical_top;
        let mut last = None;
        for (slot, index) in self.pool.walk(None, self.virtual_start) {
            if index >= self.count {
                break;
            }
            if offset < scroll_bottom {
                last = Some(index);
            }
            offset += self.pool.size(slot) as i64;
        }
        last
    }

    pub fn visible_range(&self) -> VirtualRange {
        match (self.first_visible_index(), self.last_visible_index()) {
            (Some(first), Some(last)) if first <= last => VirtualRange {
                start_index: first,
                end_index: last + 1,
            },
            _ => VirtualRange {
                start_index: 0,
                end_index: 0,
            },
        }
    }

    /// Range of virtual indexes currently bound to slots.
    pub fn rendered_range(&self) -> VirtualRange {
        let end = (self.virtual_start + self.pool.len()).min(self.count);
        VirtualRange {
            start_index: self.virtual_start.min(end),
            end_index: end,
        }
    }

    pub fn is_index_rendered(&self, index: usize) -> bool {
        !self.pool.is_empty()
            && index < self.count
            && index >= self.virtual_start
            && index <= self.virtual_end()
    }

    /// Slot currently bound to `index`.
    pub fn slot_for_index(&self, index: usize) -> Option<usize> {
        if !self.is_index_rendered(index) {
            return None;
        }
        Some(self.pool.slot_at(index - self.virtual_start))
    }

    /// Offset of a rendered item in the scroll axis.
    pub fn item_start(&self, index: usize) -> Option<i64> {
        if !self.is_index_rendered(index) {
            return None;
        }
        let mut offset = self.physical_top;
        for (slot, i) in self.pool.walk(None, self.virtual_start) {
            if i == index {
                return Some(offset);
            }
            offset += self.pool.size(slot) as i64;
        }
        None
    }

    /// How far the viewport's top edge is below the top of a rendered item.
    fn index_scroll_offset(&self, index: usize) -> Option<i64> {
        Some(self.scroll.scroll_position() - self.item_start(index)?)
    }

    /// Visits every slot that represents an item, in virtual order, without allocating.
    pub fn for_each_slot(&self, mut f: impl FnMut(PoolItem)) {
        let mut offset = self.physical_top;
        for (slot, index) in self.pool.walk(None, self.virtual_start) {
            let size = self.pool.size(slot);
            if index < self.count {
                f(PoolItem {
                    slot,
                    index,
                    start: offset,
                    size,
                });
            }
            offset += size as i64;
        }
    }

    pub fn collect_slots(&self, out: &mut Vec<PoolItem>) {
        out.clear();
        self.for_each_slot(|item| out.push(item));
    }

    // ---- geometry ------------------------------------------------------------------------

    fn viewport(&self) -> i64 {
        self.viewport_height as i64
    }

    fn virtual_end(&self) -> usize {
        (self.virtual_start + self.pool.len()).saturating_sub(1)
    }

    fn max_virtual_start(&self) -> usize {
        self.count.saturating_sub(self.pool.len())
    }

    fn set_virtual_start(&mut self, virtual_start: i64) {
        let max = self.max_virtual_start() as i64;
        self.virtual_start = virtual_start.clamp(0, max) as usize;
    }

    fn physical_bottom(&self) -> i64 {
        self.physical_top + self.physical_size
    }

    fn scroll_bottom(&self) -> i64 {
        self.scroll.scroll_position() + self.viewport()
    }

    fn hidden_content_size(&self) -> i64 {
        self.physical_size - self.viewport()
    }

    fn opt_physical_size(&self) -> i64 {
        if self.viewport_height == 0 {
            return i64::MAX;
        }
        self.viewport() * self.options.max_pages as i64
    }

    fn is_client_full(&self) -> bool {
        let scroll_bottom = self.scroll_bottom();
        scroll_bottom != 0
            && self.physical_bottom() - 1 >= scroll_bottom
            && self.physical_top <= self.scroll.scroll_position()
    }

    fn rewind(&mut self) {
        self.virtual_start = 0;
        self.physical_top = 0;
        self.pool.rewind();
        self.scroll.rewind();
    }
}
