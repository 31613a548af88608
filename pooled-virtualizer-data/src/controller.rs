use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use pooled_virtualizer::{PoolSnapshot, SlotHost, Virtualizer, VirtualizerOptions};

use crate::{
    CacheError, DataProvider, ExpandedItems, Filter, ItemCache, ItemKey, ItemKeyFn, KeySet,
    SortOrder,
};

// Bound on the process-responses / re-render rounds run after one host call. A synchronous
// provider settles in a handful; anything left is picked up by the next call.
const MAX_SETTLE_ROUNDS: usize = 16;

/// What a row shows.
#[derive(Debug)]
pub struct RowContext<'a, T> {
    /// Flat index of the row.
    pub index: usize,
    /// Depth in the tree; top-level items are level `0`.
    pub level: usize,
    /// `None` while the row's page is loading.
    pub item: Option<&'a T>,
    pub expanded: bool,
}

/// The UI side of a [`GridController`]: owns the row elements.
///
/// Mirrors [`SlotHost`], with the row's data resolved from the cache.
pub trait RowRenderer<T> {
    /// Appends `count` row elements.
    fn create_rows(&mut self, count: usize);

    fn render_row(&mut self, row: usize, context: RowContext<'_, T>);

    fn hide_row(&mut self, _row: usize) {}

    fn measure_row(&mut self, row: usize) -> u32;

    fn position_row(&mut self, _row: usize, _offset: i64) {}

    fn focused_index(&self) -> Option<usize> {
        None
    }

    fn now_ms(&self) -> f64 {
        0.0
    }
}

/// Configuration for [`GridController`].
pub struct GridOptions<T, K> {
    /// Items per provider request.
    pub page_size: usize,
    /// Size of the root collection, if known up front. Otherwise it comes from the provider's
    /// first answer.
    pub size: Option<usize>,
    pub item_key: ItemKeyFn<T, K>,
    /// Pool settings; `count` is ignored and follows the cache.
    pub virtualizer: VirtualizerOptions,
}

impl<T, K> GridOptions<T, K> {
    pub fn new(item_key: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            page_size: 50,
            size: None,
            item_key: Arc::new(item_key),
            virtualizer: VirtualizerOptions::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_viewport_height(mut self, viewport_height: u32) -> Self {
        self.virtualizer.viewport_height = viewport_height;
        self
    }

    pub fn with_virtualizer(mut self, virtualizer: VirtualizerOptions) -> Self {
        self.virtualizer = virtualizer;
        self
    }
}

impl<T, K> Clone for GridOptions<T, K> {
    fn clone(&self) -> Self {
        Self {
            page_size: self.page_size,
            size: self.size,
            item_key: Arc::clone(&self.item_key),
            virtualizer: self.virtualizer,
        }
    }
}

impl<T, K> fmt::Debug for GridOptions<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridOptions")
            .field("page_size", &self.page_size)
            .field("size", &self.size)
            .field("item_key", &"Fn(&T) -> K")
            .field("virtualizer", &self.virtualizer)
            .finish()
    }
}

/// Binds virtual indexes to cache items for one virtualizer pass.
struct RowBinder<'a, T, K, R> {
    cache: &'a mut ItemCache<T, K>,
    expanded: &'a KeySet<K>,
    renderer: &'a mut R,
}

impl<T, K, R> SlotHost for RowBinder<'_, T, K, R>
where
    T: Clone,
    K: ItemKey,
    R: RowRenderer<T>,
{
    fn create_slots(&mut self, count: usize) {
        self.renderer.create_rows(count);
    }

    fn bind(&mut self, slot: usize, index: usize) {
        let loaded = self.cache.get_item_for_index(index).is_some();
        let cache = &*self.cache;
        let item = if loaded { cache.item_at(index) } else { None };
        let expanded = item.is_some_and(|item| self.expanded.is_expanded(&cache.key_of(item)));
        self.renderer.render_row(
            slot,
            RowContext {
                index,
                level: cache.level_for_index(index),
                item,
                expanded,
            },
        );
    }

    fn hide(&mut self, slot: usize) {
        self.renderer.hide_row(slot);
    }

    fn measure(&mut self, slot: usize) -> u32 {
        self.renderer.measure_row(slot)
    }

    fn position(&mut self, slot: usize, offset: i64) {
        self.renderer.position_row(slot, offset);
    }

    fn focused_index(&self) -> Option<usize> {
        self.renderer.focused_index()
    }

    fn now_ms(&self) -> f64 {
        self.renderer.now_ms()
    }
}

/// A tree grid's scrolling body: an [`ItemCache`] feeding a [`Virtualizer`]'s pool.
///
/// The controller keeps the virtualizer's count equal to the cache's effective size, owns the
/// set of expanded items, and applies sorting and filtering. Like the virtualizer, it holds no
/// UI objects; rows are drawn through a [`RowRenderer`].
///
/// Every method that can deliver data (a frame, an expansion, a scroll to an index) finishes by
/// applying queued provider responses and re-rendering the affected rows, so a synchronous
/// provider shows its items in the same call. Methods returning `Option<u64>` report a scroll
/// offset the host should apply to its scroller.
pub struct GridController<T, K, R> {
    virtualizer: Virtualizer,
    cache: ItemCache<T, K>,
    expanded: KeySet<K>,
    renderer: R,
    pending_scroll_index: Option<usize>,
}

impl<T, K, R> GridController<T, K, R>
where
    T: Clone,
    K: ItemKey,
    R: RowRenderer<T>,
{
    pub fn new<P>(provider: P, renderer: R, options: GridOptions<T, K>) -> Self
    where
        P: DataProvider<T> + 'static,
    {
        let mut cache = ItemCache::new(provider, options.item_key, options.page_size);
        if let Some(size) = options.size {
            cache.set_size(size);
        }
        cache.clear();
        let mut virtualizer_options = options.virtualizer;
        virtualizer_options.count = cache.effective_size();
        vdebug!(
            page_size = options.page_size,
            size = cache.effective_size(),
            "GridController::new"
        );
        Self {
            virtualizer: Virtualizer::new(virtualizer_options),
            cache,
            expanded: KeySet::default(),
            renderer,
            pending_scroll_index: None,
        }
    }

    pub fn virtualizer(&self) -> &Virtualizer {
        &self.virtualizer
    }

    pub fn cache(&self) -> &ItemCache<T, K> {
        &self.cache
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn expanded_items(&self) -> &KeySet<K> {
        &self.expanded
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.is_expanded(key)
    }

    pub fn item_at(&self, index: usize) -> Option<&T> {
        self.cache.item_at(index)
    }

    pub fn effective_size(&self) -> usize {
        self.cache.effective_size()
    }

    pub fn is_loading(&self) -> bool {
        self.cache.is_loading()
    }

    pub fn first_visible_index(&self) -> Option<usize> {
        self.virtualizer.first_visible_index()
    }

    pub fn last_visible_index(&self) -> Option<usize> {
        self.virtualizer.last_visible_index()
    }

    pub fn pending_scroll_index(&self) -> Option<usize> {
        self.pending_scroll_index
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.virtualizer.snapshot()
    }

    pub fn take_diagnostics(&mut self) -> Vec<CacheError> {
        self.cache.take_diagnostics()
    }

    // ---- host events -----------------------------------------------------------------------

    pub fn set_viewport_height(&mut self, viewport_height: u32) {
        self.virtualizer.set_viewport_height(viewport_height);
    }

    pub fn on_scroll(&mut self, offset: u64) -> u64 {
        self.virtualizer.on_scroll(offset)
    }

    pub fn run_frame(&mut self) -> Option<u64> {
        let (v, mut host) = self.parts();
        let correction = v.run_frame(&mut host);
        self.settle().or(correction)
    }

    pub fn run_microtasks(&mut self) -> Option<u64> {
        let (v, mut host) = self.parts();
        let correction = v.run_microtasks(&mut host);
        self.settle().or(correction)
    }

    pub fn run_idle(&mut self) -> Option<u64> {
        let (v, mut host) = self.parts();
        let correction = v.run_idle(&mut host);
        self.settle().or(correction)
    }

    pub fn flush(&mut self) -> Option<u64> {
        let (v, mut host) = self.parts();
        let correction = v.flush(&mut host);
        self.settle().or(correction)
    }

    /// Scrolls so that flat index `index` is visible.
    ///
    /// While pages are loading (or before the viewport has a size), the index is remembered and
    /// scrolled to again once loading has settled, since expanded items above it can still
    /// change where it lands.
    pub fn scroll_to_index(&mut self, index: usize) -> Option<u64> {
        self.pending_scroll_index = None;
        if self.virtualizer.viewport_height() > 0 {
            let (v, mut host) = self.parts();
            v.scroll_to_index(&mut host, index);
        }
        if self.cache.is_loading() || self.virtualizer.viewport_height() == 0 {
            vdebug!(index, "scroll_to_index pending");
            self.pending_scroll_index = Some(index);
        }
        self.settle()
    }

    // ---- expansion -------------------------------------------------------------------------

    pub fn expand(&mut self, key: K) -> Option<u64> {
        if !self.expanded.insert(key) {
            return None;
        }
        self.expansion_changed()
    }

    pub fn collapse(&mut self, key: &K) -> Option<u64> {
        if !self.expanded.remove(key) {
            return None;
        }
        self.expansion_changed()
    }

    /// Expands the item at a flat index. Does nothing if the item is not loaded.
    pub fn expand_index(&mut self, index: usize) -> Option<u64> {
        let key = self.key_at(index)?;
        self.expand(key)
    }

    pub fn collapse_index(&mut self, index: usize) -> Option<u64> {
        let key = self.key_at(index)?;
        self.collapse(&key)
    }

    pub fn toggle_index(&mut self, index: usize) -> Option<u64> {
        let key = self.key_at(index)?;
        if self.expanded.is_expanded(&key) {
            self.collapse(&key)
        } else {
            self.expand(key)
        }
    }

    /// Replaces the whole expanded set.
    pub fn set_expanded_items(&mut self, keys: impl IntoIterator<Item = K>) -> Option<u64> {
        self.expanded = keys.into_iter().collect();
        self.expansion_changed()
    }

    // ---- data ------------------------------------------------------------------------------

    /// Changes the sort order. Every cached page is dropped and the grid scrolls to the top.
    pub fn set_sort_orders(&mut self, sort_orders: Vec<SortOrder>) -> Option<u64> {
        let filters = self.cache.filters().to_vec();
        self.cache.set_query(filters, sort_orders);
        self.reset()
    }

    /// Changes the filters. Every cached page is dropped and the grid scrolls to the top.
    pub fn set_filters(&mut self, filters: Vec<Filter>) -> Option<u64> {
        let sort_orders = self.cache.sort_orders().to_vec();
        self.cache.set_query(filters, sort_orders);
        self.reset()
    }

    pub fn set_data_provider<P>(&mut self, provider: P) -> Option<u64>
    where
        P: DataProvider<T> + 'static,
    {
        self.cache.set_provider(provider);
        self.reset()
    }

    /// Sets the size of the root collection.
    pub fn set_size(&mut self, size: usize) -> Option<u64> {
        self.cache.set_size(size);
        self.sync_count()
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Option<u64> {
        self.cache.set_page_size(page_size);
        self.sync_count()
    }

    /// Drops every cached page and reloads what is on screen, keeping the scroll position.
    pub fn clear_cache(&mut self) -> Option<u64> {
        self.cache.clear();
        self.sync_count()
    }

    /// Re-renders every row from the cache, e.g. after the items changed in place.
    pub fn refresh(&mut self) -> Option<u64> {
        let (v, mut host) = self.parts();
        v.refresh(&mut host);
        self.settle()
    }

    // ---- internals -------------------------------------------------------------------------

    fn parts(&mut self) -> (&mut Virtualizer, RowBinder<'_, T, K, R>) {
        let Self {
            virtualizer,
            cache,
            expanded,
            renderer,
            ..
        } = self;
        (
            virtualizer,
            RowBinder {
                cache,
                expanded,
                renderer,
            },
        )
    }

    fn key_at(&self, index: usize) -> Option<K> {
        self.cache.item_at(index).map(|item| self.cache.key_of(item))
    }

    fn expansion_changed(&mut self) -> Option<u64> {
        vdebug!(expanded = self.expanded.len(), "expanded items changed");
        self.cache.sync_expanded(&self.expanded);
        self.sync_count()
    }

    fn reset(&mut self) -> Option<u64> {
        self.pending_scroll_index = None;
        self.virtualizer.reset(self.cache.effective_size());
        let (v, mut host) = self.parts();
        let correction = v.flush(&mut host);
        self.settle().or(correction)
    }

    /// Matches the virtualizer's count to the cache and re-renders every row.
    fn sync_count(&mut self) -> Option<u64> {
        let (v, mut host) = self.parts();
        let size = host.cache.effective_size();
        if size != v.count() {
            v.set_count(&mut host, size);
        }
        v.refresh(&mut host);
        self.settle()
    }

    /// Applies delivered pages until the cache and the pool agree, then retries a pending
    /// scroll once nothing is loading.
    fn settle(&mut self) -> Option<u64> {
        let mut correction = self.virtualizer.take_scroll_correction();
        for _ in 0..MAX_SETTLE_ROUNDS {
            let (v, mut host) = self.parts();
            let mut progressed = host.cache.process_responses(host.expanded);
            let size = host.cache.effective_size();
            if size != v.count() {
                v.set_count(&mut host, size);
                progressed = true;
            } else if progressed {
                v.refresh(&mut host);
            }

            if let Some(index) = self.pending_scroll_index {
                if !self.cache.is_loading() && self.virtualizer.viewport_height() > 0 {
                    self.pending_scroll_index = None;
                    let (v, mut host) = self.parts();
                    v.scroll_to_index(&mut host, index);
                    if self.cache.is_loading() {
                        self.pending_scroll_index = Some(index);
                    }
                    progressed = true;
                }
            }

            correction = self.virtualizer.take_scroll_correction().or(correction);
            if !progressed && !self.cache.has_responses() {
                return correction;
            }
        }
        vtrace!("settle round limit reached");
        correction
    }
}

impl<T, K, R: fmt::Debug> fmt::Debug for GridController<T, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridController")
            .field("virtualizer", &self.virtualizer)
            .field("cache", &self.cache)
            .field("renderer", &self.renderer)
            .field("pending_scroll_index", &self.pending_scroll_index)
            .finish_non_exhaustive()
    }
}
