use pooled_virtualizer_data::{
    GridController, GridOptions, PageCallback, PageRequest, RowContext, RowRenderer,
};

#[derive(Default)]
struct Rows {
    lines: Vec<String>,
}

impl RowRenderer<String> for Rows {
    fn create_rows(&mut self, count: usize) {
        self.lines.resize(self.lines.len() + count, String::new());
    }

    fn render_row(&mut self, row: usize, context: RowContext<'_, String>) {
        let marker = if context.expanded { "v" } else { ">" };
        self.lines[row] = match context.item {
            Some(item) => format!(
                "{:>5} {}{marker} {item}",
                context.index,
                "  ".repeat(context.level)
            ),
            None => format!("{:>5} (loading)", context.index),
        };
    }

    fn measure_row(&mut self, _row: usize) -> u32 {
        20
    }
}

fn main() {
    // Example: a lazily loaded tree grid. Each folder has 4 children; the root has 10_000.
    //
    // The provider answers right away here; a real one would keep the callback and complete
    // it when its request finishes.
    let provider = |request: PageRequest<'_, String>, callback: PageCallback<String>| {
        let (prefix, size) = match request.parent_item {
            None => (String::from("folder"), 10_000),
            Some(parent) => (format!("{parent}/file"), 4),
        };
        let items = request
            .range()
            .filter(|&i| i < size)
            .map(|i| format!("{prefix}-{i}"))
            .collect();
        callback.complete(items, Some(size));
    };

    let mut grid = GridController::new(
        provider,
        Rows::default(),
        GridOptions::new(|item: &String| item.clone())
            .with_page_size(100)
            .with_viewport_height(200),
    );
    grid.flush();
    grid.expand_index(1);
    grid.expand_index(0);
    println!(
        "effective_size={} pool={}",
        grid.effective_size(),
        grid.virtualizer().pool_len()
    );

    grid.scroll_to_index(7_000);
    let first = grid.first_visible_index().unwrap_or(0);
    println!("after scroll_to_index(7000): first={first}");

    let mut slots = Vec::new();
    grid.virtualizer().collect_slots(&mut slots);
    for item in slots.iter().take(8) {
        println!("{}", grid.renderer().lines[item.slot]);
    }
}
