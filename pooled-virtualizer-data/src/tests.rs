use crate::*;

use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::Range;

// Item ids: top-level items are `0..root`, the children of item `p` are
// `1000 * (p + 1) + j` for `j` in `0..children`.
fn tree_rows(
    parent: Option<u64>,
    range: Range<usize>,
    root: usize,
    children: usize,
) -> (Vec<u64>, usize) {
    let (base, size) = match parent {
        None => (0, root),
        Some(p) => (1000 * (p + 1), children),
    };
    let items = range.filter(|&i| i < size).map(|i| base + i as u64).collect();
    (items, size)
}

fn identity_key() -> ItemKeyFn<u64, u64> {
    Arc::new(|item: &u64| *item)
}

#[derive(Clone, Debug, PartialEq)]
struct Call {
    parent: Option<u64>,
    page: usize,
    filters: Vec<Filter>,
}

type CallLog = Rc<RefCell<Vec<Call>>>;

/// Answers every request right away.
fn tree_provider(
    root: usize,
    children: usize,
    log: CallLog,
) -> impl FnMut(PageRequest<'_, u64>, PageCallback<u64>) {
    move |request: PageRequest<'_, u64>, callback: PageCallback<u64>| {
        log.borrow_mut().push(Call {
            parent: request.parent_item.copied(),
            page: request.page,
            filters: request.filters.to_vec(),
        });
        let parent = request.parent_item.copied();
        let (items, size) = tree_rows(parent, request.range(), root, children);
        callback.complete(items, Some(size));
    }
}

struct Deferred {
    parent: Option<u64>,
    range: Range<usize>,
    callback: PageCallback<u64>,
}

type DeferredLog = Rc<RefCell<Vec<Deferred>>>;

/// Keeps every callback for the test to answer (or not).
fn deferred_provider(log: DeferredLog) -> impl FnMut(PageRequest<'_, u64>, PageCallback<u64>) {
    move |request: PageRequest<'_, u64>, callback: PageCallback<u64>| {
        log.borrow_mut().push(Deferred {
            parent: request.parent_item.copied(),
            range: request.range(),
            callback,
        });
    }
}

fn answer(request: Deferred, root: usize, children: usize) {
    let (items, size) = tree_rows(request.parent, request.range, root, children);
    request.callback.complete(items, Some(size));
}

fn loaded_cache(
    root: usize,
    children: usize,
    page_size: usize,
) -> (ItemCache<u64, u64>, CallLog) {
    let log = CallLog::default();
    let provider = tree_provider(root, children, log.clone());
    let mut cache = ItemCache::new(provider, identity_key(), page_size);
    cache.clear();
    assert!(cache.process_responses(&KeySet::<u64>::default()));
    (cache, log)
}

fn expanded(keys: &[u64]) -> KeySet<u64> {
    keys.iter().copied().collect()
}

fn settle_cache(cache: &mut ItemCache<u64, u64>, expanded: &KeySet<u64>) {
    for _ in 0..16 {
        if !cache.process_responses(expanded) {
            return;
        }
    }
    panic!("cache did not settle");
}

// ---- item cache ---------------------------------------------------------------------------

#[test]
fn clear_on_an_empty_root_requests_the_first_page() {
    let (cache, log) = loaded_cache(10, 3, 50);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].parent, None);
    assert_eq!(cache.size(), 10);
    assert_eq!(cache.effective_size(), 10);
    assert_eq!(cache.item_at(9), Some(&9));
    assert!(!cache.is_loading());
}

#[test]
fn expanding_and_collapsing_changes_the_effective_size() {
    let (mut cache, log) = loaded_cache(10, 3, 50);
    let mut keys = expanded(&[3]);
    cache.sync_expanded(&keys);
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(log.borrow()[1].parent, Some(3));
    settle_cache(&mut cache, &keys);
    assert_eq!(cache.effective_size(), 13);

    let root = cache.root();
    assert_eq!(
        cache.get_cache_and_index(3),
        CacheIndex {
            node: root,
            scaled_index: 3,
            level: 0
        }
    );
    let child = cache.get_cache_and_index(4);
    assert_ne!(child.node, root);
    assert_eq!((child.scaled_index, child.level), (0, 1));
    assert_eq!(cache.item_at(4), Some(&4000));
    assert_eq!(cache.item_at(6), Some(&4002));
    assert_eq!(cache.get_cache_and_index(7).scaled_index, 4);
    assert_eq!(cache.item_at(7), Some(&4));

    keys.remove(&3);
    cache.sync_expanded(&keys);
    assert_eq!(cache.effective_size(), 10);
    assert_eq!(cache.item_at(4), Some(&4));
}

#[test]
fn nested_expansion_propagates_sizes_to_the_root() {
    let (mut cache, _log) = loaded_cache(10, 3, 50);
    let keys = expanded(&[0, 1000, 5]);
    cache.sync_expanded(&keys);
    settle_cache(&mut cache, &keys);

    // 0, 1000, [1001000..1001003), 1001, 1002, 1, .., 5, [6000..6003), 6, ..
    assert_eq!(cache.effective_size(), 10 + 3 + 3 + 3);
    assert_eq!(cache.item_at(1), Some(&1000));
    assert_eq!(cache.item_at(2), Some(&1_001_000));
    assert_eq!(cache.level_for_index(2), 2);
    assert_eq!(cache.item_at(5), Some(&1001));
    assert_eq!(cache.item_at(7), Some(&1));
    assert_eq!(cache.item_at(11), Some(&5));
    assert_eq!(cache.item_at(12), Some(&6000));
    assert_eq!(cache.item_at(15), Some(&6));

    let mut nodes = Vec::new();
    cache.for_each_node(|info| nodes.push(info));
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0].effective_size, 19);
    assert_eq!(nodes[0].children_effective_size, 9);
    for info in &nodes {
        assert_eq!(info.effective_size, info.size + info.children_effective_size);
    }
    let grandchild = nodes.iter().find(|info| info.level == 2).copied();
    assert_eq!(grandchild.and_then(|info| info.parent_index), Some(0));
}

#[test]
fn lookups_in_one_page_request_it_once() {
    let log = DeferredLog::default();
    let mut cache = ItemCache::new(deferred_provider(log.clone()), identity_key(), 50);
    cache.set_size(100);
    cache.clear();
    assert!(log.borrow().is_empty());

    assert_eq!(cache.get_item_for_index(5), None);
    assert_eq!(cache.get_item_for_index(7), None);
    assert_eq!(log.borrow().len(), 1);
    assert!(cache.is_loading());

    let request = log.borrow_mut().remove(0);
    assert_eq!(request.range, 0..50);
    answer(request, 100, 0);
    assert!(cache.has_responses());
    assert!(cache.process_responses(&KeySet::<u64>::default()));
    assert_eq!(cache.get_item_for_index(7), Some(&7));
    assert!(!cache.is_loading());
    assert!(log.borrow().is_empty());
}

#[test]
fn an_unanswered_page_stays_empty() {
    let log = DeferredLog::default();
    let mut cache = ItemCache::new(deferred_provider(log.clone()), identity_key(), 20);
    cache.set_size(100);
    cache.clear();
    let none = KeySet::<u64>::default();

    for _ in 0..3 {
        for index in [20, 25, 39] {
            assert_eq!(cache.get_item_for_index(index), None);
        }
        cache.process_responses(&none);
    }
    assert_eq!(log.borrow().len(), 1);

    assert_eq!(cache.get_item_for_index(45), None);
    let page_two = log.borrow_mut().pop();
    answer(page_two.expect("page 2 requested"), 100, 0);
    cache.process_responses(&none);

    assert_eq!(cache.item_at(45), Some(&45));
    for index in 20..40 {
        assert_eq!(cache.item_at(index), None);
    }
    assert!(cache.is_loading());
}

#[test]
fn pages_may_arrive_out_of_order() {
    let log = DeferredLog::default();
    let mut cache = ItemCache::new(deferred_provider(log.clone()), identity_key(), 10);
    cache.set_size(100);
    cache.clear();
    for index in [0, 35, 55] {
        cache.get_item_for_index(index);
    }
    let mut requests: Vec<Deferred> = log.borrow_mut().drain(..).collect();
    assert_eq!(requests.len(), 3);
    requests.reverse();
    for request in requests {
        answer(request, 100, 0);
    }
    cache.process_responses(&KeySet::<u64>::default());
    assert_eq!(cache.item_at(0), Some(&0));
    assert_eq!(cache.item_at(35), Some(&35));
    assert_eq!(cache.item_at(59), Some(&59));
    assert!(!cache.is_loading());
}

#[test]
fn completion_after_collapse_is_ignored() {
    let log = DeferredLog::default();
    let mut cache = ItemCache::new(deferred_provider(log.clone()), identity_key(), 50);
    cache.clear();
    let root_page = log.borrow_mut().remove(0);
    answer(root_page, 10, 3);
    cache.process_responses(&KeySet::<u64>::default());

    let child = cache.expand_index(3);
    assert!(child.is_some());
    let child_page = log.borrow_mut().remove(0);
    assert_eq!(child_page.parent, Some(3));
    assert_eq!(child_page.callback.node(), child.expect("child node"));

    assert!(cache.collapse_index(3));
    answer(child_page, 10, 3);
    assert!(!cache.process_responses(&expanded(&[3])));
    assert_eq!(cache.effective_size(), 10);
    assert!(cache.node_info(child.expect("child node")).is_none());
}

#[test]
fn completion_after_clear_is_dropped() {
    let log = DeferredLog::default();
    let mut cache = ItemCache::new(deferred_provider(log.clone()), identity_key(), 50);
    cache.clear();
    let stale = log.borrow_mut().remove(0);
    let stale_root = cache.root();

    cache.clear();
    assert_ne!(cache.root(), stale_root);
    assert_eq!(log.borrow().len(), 1);
    answer(stale, 10, 0);
    assert!(!cache.has_responses());

    let fresh = log.borrow_mut().remove(0);
    answer(fresh, 10, 0);
    assert!(cache.process_responses(&KeySet::<u64>::default()));
    assert_eq!(cache.effective_size(), 10);
}

#[test]
fn a_child_page_without_size_falls_back_to_the_observed_count() {
    let provider = |request: PageRequest<'_, u64>, callback: PageCallback<u64>| match request.parent_item {
        None => callback.complete((0..10).collect(), Some(10)),
        Some(&p) => callback.complete(vec![p * 10, p * 10 + 1, p * 10 + 2], None),
    };
    let mut cache = ItemCache::new(provider, identity_key(), 50);
    cache.clear();
    let keys = expanded(&[2]);
    settle_cache(&mut cache, &keys);

    let child = cache.expand_index(2).expect("item 2 is loaded");
    settle_cache(&mut cache, &keys);
    assert_eq!(cache.effective_size(), 13);
    assert_eq!(cache.item_at(3), Some(&20));
    assert_eq!(
        cache.take_diagnostics(),
        vec![CacheError::MissingSize {
            node: child,
            page: 0
        }]
    );
    assert!(cache.take_diagnostics().is_empty());
}

#[test]
fn an_oversized_page_is_truncated() {
    let provider = |_request: PageRequest<'_, u64>, callback: PageCallback<u64>| {
        callback.complete((0..60).collect(), Some(100));
    };
    let mut cache = ItemCache::new(provider, identity_key(), 50);
    cache.clear();
    cache.process_responses(&KeySet::<u64>::default());

    assert_eq!(cache.size(), 100);
    assert_eq!(cache.item_at(49), Some(&49));
    assert_eq!(cache.item_at(50), None);
    let diagnostics = cache.take_diagnostics();
    assert_eq!(
        diagnostics,
        vec![CacheError::PageOverflow {
            node: cache.root(),
            page: 0,
            len: 60,
            page_size: 50
        }]
    );
}

/// Promises 100 items but never sends any.
fn empty_pages(
    calls: Rc<core::cell::Cell<usize>>,
) -> impl FnMut(PageRequest<'_, u64>, PageCallback<u64>) {
    move |_request: PageRequest<'_, u64>, callback: PageCallback<u64>| {
        calls.set(calls.get() + 1);
        callback.complete(Vec::new(), Some(100));
    }
}

#[test]
fn a_short_page_is_not_requested_again() {
    let calls = Rc::new(core::cell::Cell::new(0));
    let mut cache = ItemCache::new(empty_pages(calls.clone()), identity_key(), 20);
    cache.clear();
    let none = KeySet::<u64>::default();
    for _ in 0..4 {
        cache.process_responses(&none);
        for index in 0..cache.effective_size() {
            assert_eq!(cache.get_item_for_index(index), None);
        }
    }
    // Page 0 from `clear`, then pages 1..=4 once each.
    assert_eq!(calls.get(), 5);
    assert!(!cache.is_loading());
    assert_eq!(cache.node_info(cache.root()).map(|info| info.completed_pages), Some(5));

    let diagnostics = cache.take_diagnostics();
    assert_eq!(diagnostics.len(), 5);
    assert_eq!(
        diagnostics[0],
        CacheError::ShortPage {
            node: cache.root(),
            page: 0,
            len: 0,
            expected: 20
        }
    );

    // A new size gives the pages another chance.
    cache.set_size(50);
    cache.get_item_for_index(10);
    assert_eq!(calls.get(), 6);
}

#[test]
fn shrinking_the_size_drops_items_and_sub_caches() {
    let (mut cache, _log) = loaded_cache(10, 3, 50);
    let keys = expanded(&[2, 8]);
    cache.sync_expanded(&keys);
    settle_cache(&mut cache, &keys);
    assert_eq!(cache.effective_size(), 16);

    cache.set_size(5);
    assert_eq!(cache.effective_size(), 8);
    let mut nodes = 0;
    cache.for_each_node(|_| nodes += 1);
    assert_eq!(nodes, 2);
    assert_eq!(cache.item_at(7), Some(&4));
}

#[test]
fn a_replaced_parent_item_loses_its_sub_cache() {
    let offset = Rc::new(core::cell::Cell::new(0u64));
    let provider = {
        let offset = offset.clone();
        move |request: PageRequest<'_, u64>, callback: PageCallback<u64>| match request.parent_item {
            None => callback.complete((0..10).map(|i| offset.get() + i).collect(), Some(10)),
            Some(_) => callback.complete(vec![1, 2], Some(2)),
        }
    };
    let mut cache = ItemCache::new(provider, identity_key(), 50);
    cache.clear();
    let keys = expanded(&[3]);
    settle_cache(&mut cache, &keys);
    assert_eq!(cache.effective_size(), 12);

    offset.set(100);
    assert!(cache.load_page(cache.root(), 0));
    settle_cache(&mut cache, &keys);
    assert_eq!(cache.item_at(3), Some(&103));
    assert_eq!(cache.effective_size(), 10);
}

#[test]
fn set_query_keeps_the_root_size_and_forwards_filters() {
    let (mut cache, log) = loaded_cache(10, 3, 50);
    cache.set_query(vec![Filter::new("name", "x")], Vec::new());
    assert_eq!(cache.effective_size(), 10);
    assert_eq!(cache.item_at(0), None);
    assert_eq!(log.borrow().len(), 1);

    assert_eq!(cache.get_item_for_index(0), None);
    assert_eq!(log.borrow()[1].filters, vec![Filter::new("name", "x")]);
}

#[test]
fn page_size_change_reloads_with_the_new_size() {
    let (mut cache, log) = loaded_cache(100, 0, 50);
    cache.set_page_size(20);
    assert_eq!(cache.page_size(), 20);
    assert_eq!(cache.item_at(0), None);
    cache.get_item_for_index(45);
    assert_eq!(log.borrow().last().map(|call| call.page), Some(2));
}

#[test]
fn array_provider_filters_and_sorts() {
    let provider = ArrayDataProvider::new((0..20u64).collect())
        .with_filter(|item, filters| {
            filters.iter().all(|filter| match filter.value.as_str() {
                "even" => item % 2 == 0,
                _ => true,
            })
        })
        .with_compare(|a, b, sort_orders| match sort_orders[0].direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        });
    let mut cache = ItemCache::new(provider, identity_key(), 4);
    cache.set_query(
        vec![Filter::new("parity", "even")],
        vec![SortOrder::new("value", SortDirection::Descending)],
    );
    let none = KeySet::<u64>::default();
    cache.process_responses(&none);
    assert_eq!(cache.size(), 10);
    assert_eq!(cache.item_at(0), Some(&18));

    cache.get_item_for_index(9);
    cache.process_responses(&none);
    assert_eq!(cache.item_at(9), Some(&0));

    // Flat data: expanded items get an empty sub-cache.
    let keys = expanded(&[18]);
    cache.sync_expanded(&keys);
    settle_cache(&mut cache, &keys);
    assert_eq!(cache.effective_size(), 10);
}

// ---- grid controller ----------------------------------------------------------------------

const ROW: u32 = 30;

#[derive(Clone, Debug, PartialEq)]
struct Row {
    index: usize,
    level: usize,
    item: Option<u64>,
    expanded: bool,
}

#[derive(Debug, Default)]
struct Rows {
    shown: Vec<Option<Row>>,
}

impl RowRenderer<u64> for Rows {
    fn create_rows(&mut self, count: usize) {
        self.shown.extend(core::iter::repeat_n(None, count));
    }

    fn render_row(&mut self, row: usize, context: RowContext<'_, u64>) {
        self.shown[row] = Some(Row {
            index: context.index,
            level: context.level,
            item: context.item.copied(),
            expanded: context.expanded,
        });
    }

    fn hide_row(&mut self, row: usize) {
        self.shown[row] = None;
    }

    fn measure_row(&mut self, _row: usize) -> u32 {
        ROW
    }
}

type Grid = GridController<u64, u64, Rows>;

fn settle_grid(grid: &mut Grid) {
    for _ in 0..256 {
        grid.flush();
        if !grid.virtualizer().has_pending_tasks() {
            return;
        }
        grid.run_idle();
    }
    panic!("grid did not settle");
}

/// Every rendered row shows what the cache holds for its index.
fn assert_rows_match_cache(grid: &Grid) {
    let mut slots = Vec::new();
    grid.virtualizer().collect_slots(&mut slots);
    assert!(!slots.is_empty());
    for slot in slots {
        let row = grid.renderer().shown[slot.slot].clone().expect("row is bound");
        assert_eq!(row.index, slot.index);
        assert_eq!(row.level, grid.cache().level_for_index(slot.index));
        assert_eq!(row.item.as_ref(), grid.item_at(slot.index));
        assert!(row.item.is_some(), "index {} not loaded", slot.index);
        let key = grid.item_at(slot.index).copied();
        assert_eq!(row.expanded, key.is_some_and(|key| grid.is_expanded(&key)));
    }
}

fn tree_grid(root: usize, children: usize) -> (Grid, CallLog) {
    let log = CallLog::default();
    let grid = GridController::new(
        tree_provider(root, children, log.clone()),
        Rows::default(),
        GridOptions::new(|item: &u64| *item).with_viewport_height(300),
    );
    (grid, log)
}

#[test]
fn grid_rows_show_cache_items() {
    let (mut grid, log) = tree_grid(1_000, 5);
    settle_grid(&mut grid);
    assert_eq!(grid.effective_size(), 1_000);
    assert_eq!(grid.virtualizer().count(), 1_000);
    assert_eq!(grid.first_visible_index(), Some(0));
    assert_rows_match_cache(&grid);
    // Page 0 once from `new`; the pool never reaches page 1.
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn expanding_a_row_grows_the_list() {
    let (mut grid, _log) = tree_grid(1_000, 5);
    settle_grid(&mut grid);

    grid.expand_index(2);
    settle_grid(&mut grid);
    assert_eq!(grid.effective_size(), 1_005);
    assert_eq!(grid.virtualizer().count(), 1_005);
    assert!(grid.is_expanded(&2));
    assert_eq!(grid.item_at(3), Some(&3000));
    assert_eq!(grid.item_at(8), Some(&3));
    assert_rows_match_cache(&grid);

    let slot = grid.virtualizer().slot_for_index(2).expect("row 2 rendered");
    let row = grid.renderer().shown[slot].clone();
    assert_eq!(row.map(|row| row.expanded), Some(true));
    let slot = grid.virtualizer().slot_for_index(4).expect("row 4 rendered");
    assert_eq!(grid.renderer().shown[slot].as_ref().map(|row| row.level), Some(1));

    grid.toggle_index(2);
    settle_grid(&mut grid);
    assert_eq!(grid.virtualizer().count(), 1_000);
    assert!(!grid.is_expanded(&2));
    assert_rows_match_cache(&grid);
}

#[test]
fn set_expanded_items_replaces_the_set() {
    let (mut grid, _log) = tree_grid(100, 2);
    settle_grid(&mut grid);
    grid.set_expanded_items([0, 1]);
    settle_grid(&mut grid);
    assert_eq!(grid.effective_size(), 104);
    grid.set_expanded_items([1]);
    settle_grid(&mut grid);
    assert_eq!(grid.effective_size(), 102);
    assert_eq!(grid.item_at(2), Some(&2000));
    assert_rows_match_cache(&grid);
}

#[test]
fn scroll_to_index_waits_for_loading() {
    let log = DeferredLog::default();
    let mut grid: Grid = GridController::new(
        deferred_provider(log.clone()),
        Rows::default(),
        GridOptions::new(|item: &u64| *item)
            .with_size(1_000)
            .with_viewport_height(300),
    );
    settle_grid(&mut grid);
    assert!(grid.is_loading());

    grid.scroll_to_index(500);
    assert_eq!(grid.pending_scroll_index(), Some(500));

    for _ in 0..8 {
        let requests: Vec<Deferred> = log.borrow_mut().drain(..).collect();
        if requests.is_empty() && !grid.is_loading() {
            break;
        }
        for request in requests {
            answer(request, 1_000, 0);
        }
        settle_grid(&mut grid);
    }
    assert_eq!(grid.pending_scroll_index(), None);
    let first = grid.first_visible_index().expect("rows visible");
    let last = grid.last_visible_index().expect("rows visible");
    assert!(first <= 500 && 500 <= last, "first={first} last={last}");
    assert_rows_match_cache(&grid);
}

#[test]
fn scroll_to_index_waits_for_a_viewport() {
    let mut grid: Grid = GridController::new(
        ArrayDataProvider::new((0..1_000u64).collect()),
        Rows::default(),
        GridOptions::new(|item: &u64| *item),
    );
    grid.scroll_to_index(300);
    assert_eq!(grid.pending_scroll_index(), Some(300));
    assert_eq!(grid.effective_size(), 1_000);

    grid.set_viewport_height(300);
    settle_grid(&mut grid);
    assert_eq!(grid.pending_scroll_index(), None);
    let first = grid.first_visible_index().expect("rows visible");
    let last = grid.last_visible_index().expect("rows visible");
    assert!(first <= 300 && 300 <= last, "first={first} last={last}");
}

#[test]
fn sorting_resets_to_the_top() {
    let provider = ArrayDataProvider::new((0..200u64).collect()).with_compare(|a, b, sort_orders| {
        match sort_orders[0].direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        }
    });
    let mut grid: Grid = GridController::new(
        provider,
        Rows::default(),
        GridOptions::new(|item: &u64| *item)
            .with_page_size(20)
            .with_viewport_height(300),
    );
    settle_grid(&mut grid);
    grid.scroll_to_index(100);
    settle_grid(&mut grid);
    assert!(grid.virtualizer().scroll_offset() > 0);

    grid.set_sort_orders(vec![SortOrder::new("value", SortDirection::Descending)]);
    settle_grid(&mut grid);
    assert_eq!(grid.virtualizer().scroll_offset(), 0);
    assert_eq!(grid.first_visible_index(), Some(0));
    assert_eq!(grid.item_at(0), Some(&199));
    assert_rows_match_cache(&grid);
}

#[test]
fn clear_cache_reloads_the_rendered_rows() {
    let (mut grid, log) = tree_grid(1_000, 0);
    settle_grid(&mut grid);
    let before = log.borrow().len();
    grid.clear_cache();
    settle_grid(&mut grid);
    assert!(log.borrow().len() > before);
    assert_eq!(grid.effective_size(), 1_000);
    assert_rows_match_cache(&grid);
}

#[test]
fn grid_does_not_refetch_short_pages() {
    let calls = Rc::new(core::cell::Cell::new(0));
    let mut grid: Grid = GridController::new(
        empty_pages(calls.clone()),
        Rows::default(),
        GridOptions::new(|item: &u64| *item)
            .with_page_size(20)
            .with_viewport_height(300),
    );
    settle_grid(&mut grid);
    assert_eq!(grid.effective_size(), 100);
    let settled = calls.get();
    assert!(settled <= 5, "calls={settled}");

    for _ in 0..5 {
        grid.run_frame();
        grid.flush();
    }
    assert_eq!(calls.get(), settled);
    assert!(grid
        .take_diagnostics()
        .iter()
        .all(|error| matches!(error, CacheError::ShortPage { .. })));
}
