// Example: rows of unknown, varying height. The estimate converges as rows are measured.
use pooled_virtualizer::{SlotHost, Virtualizer, VirtualizerOptions};

struct Rows {
    bound: Vec<Option<usize>>,
    now_ms: f64,
}

impl SlotHost for Rows {
    fn create_slots(&mut self, count: usize) {
        self.bound.resize(self.bound.len() + count, None);
        // Pretend every element costs a little to create.
        self.now_ms += count as f64 * 0.5;
    }

    fn bind(&mut self, slot: usize, index: usize) {
        self.bound[slot] = Some(index);
    }

    fn measure(&mut self, slot: usize) -> u32 {
        self.bound[slot].map_or(0, |index| 18 + (index % 7) as u32 * 9)
    }

    fn position(&mut self, slot: usize, offset: i64) {
        if slot == 0 {
            println!("  slot 0 -> y={offset}");
        }
    }

    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

fn main() {
    let mut rows = Rows {
        bound: Vec::new(),
        now_ms: 0.0,
    };
    let mut v = Virtualizer::new(VirtualizerOptions::new(50_000).with_viewport_height(600));
    v.flush(&mut rows);
    while v.has_pending_tasks() {
        v.run_idle(&mut rows);
    }
    println!(
        "average={} estimated={} applied={}",
        v.average_size(),
        v.estimated_size(),
        v.total_size()
    );

    for step in 1..=5u64 {
        v.on_scroll(step * 350);
        v.run_frame(&mut rows);
        println!(
            "scroll={} first={:?} average={}",
            v.scroll_offset(),
            v.first_visible_index(),
            v.average_size()
        );
    }
}
