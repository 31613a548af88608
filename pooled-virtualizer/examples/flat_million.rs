// Example: a million fixed-height rows rendered by a pool of a few dozen slots.
use pooled_virtualizer::{SlotHost, Virtualizer, VirtualizerOptions};

struct Rows {
    bound: Vec<Option<usize>>,
}

impl SlotHost for Rows {
    fn create_slots(&mut self, count: usize) {
        self.bound.resize(self.bound.len() + count, None);
    }

    fn bind(&mut self, slot: usize, index: usize) {
        self.bound[slot] = Some(index);
    }

    fn hide(&mut self, slot: usize) {
        self.bound[slot] = None;
    }

    fn measure(&mut self, slot: usize) -> u32 {
        if self.bound[slot].is_some() { 40 } else { 0 }
    }
}

fn main() {
    let mut rows = Rows { bound: Vec::new() };
    let mut v = Virtualizer::new(VirtualizerOptions::new(1_000_000).with_viewport_height(400));

    // A host would call these from its frame loop and idle callback.
    v.run_frame(&mut rows);
    while v.has_pending_tasks() {
        v.run_idle(&mut rows);
    }
    println!("after first paint: {:?}", v.snapshot());

    for offset in [200, 800, 5_000, 20_000_000] {
        v.on_scroll(offset);
        if let Some(corrected) = v.run_frame(&mut rows) {
            println!("scroll corrected to {corrected}");
        }
        println!(
            "scroll={} visible={:?} pool={} total={}",
            v.scroll_offset(),
            v.visible_range(),
            v.pool_len(),
            v.total_size()
        );
    }

    let offset = v.scroll_to_index(&mut rows, 999_999);
    println!(
        "scroll_to_index(999_999): offset={offset} last_visible={:?}",
        v.last_visible_index()
    );
}
