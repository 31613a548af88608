use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::provider::{Inbox, PageCallback, PageRequest, PageResponse};
use crate::{CacheError, DataProvider, ExpandedItems, Filter, ItemKey, SortOrder};

/// Maps an item to its identity.
pub type ItemKeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;

/// Identity of one cache node.
///
/// Ids are never reused, not even across [`ItemCache::clear`], so a response addressed to a
/// node that has since been discarded can always be recognized as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a flat index lives: the owning node and the index local to that node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheIndex {
    pub node: NodeId,
    pub scaled_index: usize,
    /// Depth of the node; the root collection is level `0`.
    pub level: usize,
}

/// Read-only view of one node, for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Position of the parent item among the parent node's items.
    pub parent_index: Option<usize>,
    pub level: usize,
    pub size: usize,
    pub effective_size: usize,
    /// Sum of the effective sizes of the node's children.
    pub children_effective_size: usize,
    pub child_count: usize,
    pub loaded_items: usize,
    pub pending_pages: usize,
    pub completed_pages: usize,
}

struct CacheNode<T, K> {
    id: NodeId,
    parent: Option<NodeId>,
    parent_key: Option<K>,
    parent_item: Option<T>,
    level: usize,
    size: usize,
    effective_size: usize,
    items: BTreeMap<usize, T>,
    /// Keyed by the position of the expanded item among `items`.
    children: BTreeMap<usize, CacheNode<T, K>>,
    pending: BTreeSet<usize>,
    /// Pages answered since the size last changed. Lookups never request these again.
    completed: BTreeSet<usize>,
}

/// Shared state threaded through recursive node updates.
struct Context<'a, T, K> {
    item_key: &'a ItemKeyFn<T, K>,
    next_id: &'a mut u64,
    loads: Vec<(NodeId, usize)>,
}

impl<T, K> Context<'_, T, K> {
    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(*self.next_id);
        *self.next_id += 1;
        id
    }
}

impl<T: Clone, K: ItemKey> CacheNode<T, K> {
    fn root(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            parent_key: None,
            parent_item: None,
            level: 0,
            size: 0,
            effective_size: 0,
            items: BTreeMap::new(),
            children: BTreeMap::new(),
            pending: BTreeSet::new(),
            completed: BTreeSet::new(),
        }
    }

    fn child_of(&self, id: NodeId, key: K, item: T) -> Self {
        Self {
            parent: Some(self.id),
            parent_key: Some(key),
            parent_item: Some(item),
            level: self.level + 1,
            ..Self::root(id)
        }
    }

    fn recompute(&mut self) {
        self.effective_size = self.children_effective_size().saturating_add(self.size);
    }

    fn children_effective_size(&self) -> usize {
        self.children
            .values()
            .fold(0usize, |sum, child| sum.saturating_add(child.effective_size))
    }

    fn update_size(&mut self) {
        for child in self.children.values_mut() {
            child.update_size();
        }
        self.recompute();
    }

    /// Sets the node's own size, dropping items and children that fall outside it.
    ///
    /// Any size change forgets which pages were answered, so short pages get another chance.
    fn set_size(&mut self, size: usize) {
        if size < self.size {
            self.items.split_off(&size);
            self.children.split_off(&size);
        }
        if size != self.size {
            self.completed.clear();
        }
        self.size = size;
    }

    fn find(&self, id: NodeId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.values().find_map(|child| child.find(id))
    }

    /// Runs `f` on node `id` and recomputes the effective size of that node and every ancestor.
    fn with_node<R>(&mut self, id: NodeId, f: &mut impl FnMut(&mut Self) -> R) -> Option<R> {
        if self.id == id {
            let out = f(self);
            self.recompute();
            return Some(out);
        }
        let mut out = None;
        for child in self.children.values_mut() {
            out = child.with_node(id, f);
            if out.is_some() {
                break;
            }
        }
        if out.is_some() {
            self.recompute();
        }
        out
    }

    fn is_loading(&self) -> bool {
        !self.pending.is_empty() || self.children.values().any(Self::is_loading)
    }

    fn cache_and_index(&self, index: usize) -> CacheIndex {
        let mut local = index;
        for (&expanded_index, child) in &self.children {
            if local <= expanded_index {
                break;
            }
            if local <= expanded_index + child.effective_size {
                return child.cache_and_index(local - expanded_index - 1);
            }
            local -= child.effective_size;
        }
        CacheIndex {
            node: self.id,
            scaled_index: local,
            level: self.level,
        }
    }

    /// Creates the child for the item at `scaled_index` if the item is loaded.
    fn ensure_child(&mut self, scaled_index: usize, cx: &mut Context<'_, T, K>) -> Option<NodeId> {
        if let Some(child) = self.children.get(&scaled_index) {
            return Some(child.id);
        }
        let item = self.items.get(&scaled_index)?.clone();
        let key = (cx.item_key)(&item);
        let child = self.child_of(cx.alloc_id(), key, item);
        let id = child.id;
        vdebug!(parent = self.id.get(), child = id.get(), scaled_index, "sub-cache created");
        cx.loads.push((id, 0));
        self.children.insert(scaled_index, child);
        Some(id)
    }

    /// Makes the node's children match the expanded set, recursively.
    fn sync_expanded<E>(&mut self, expanded: &E, cx: &mut Context<'_, T, K>)
    where
        E: ExpandedItems<K> + ?Sized,
    {
        let items = &self.items;
        let item_key = cx.item_key;
        self.children.retain(|scaled_index, child| match items.get(scaled_index) {
            Some(item) => {
                let key = item_key(item);
                child.parent_key.as_ref() == Some(&key) && expanded.is_expanded(&key)
            }
            None => false,
        });
        let wanted: Vec<usize> = self
            .items
            .iter()
            .filter(|(scaled_index, item)| {
                !self.children.contains_key(*scaled_index) && expanded.is_expanded(&item_key(item))
            })
            .map(|(&scaled_index, _)| scaled_index)
            .collect();
        for scaled_index in wanted {
            self.ensure_child(scaled_index, cx);
        }
        for child in self.children.values_mut() {
            child.sync_expanded(expanded, cx);
        }
        self.recompute();
    }

    /// Stores one delivered page.
    fn apply_page<E>(
        &mut self,
        response: PageResponse<T>,
        page_size: usize,
        expanded: &E,
        cx: &mut Context<'_, T, K>,
        diagnostics: &mut Vec<CacheError>,
    ) where
        E: ExpandedItems<K> + ?Sized,
    {
        let PageResponse {
            page,
            mut items,
            size,
            ..
        } = response;
        self.pending.remove(&page);
        let offset = page.saturating_mul(page_size);

        if items.len() > page_size {
            let error = CacheError::PageOverflow {
                node: self.id,
                page,
                len: items.len(),
                page_size,
            };
            vwarn!(%error, "page overflow");
            diagnostics.push(error);
            items.truncate(page_size);
        }

        match size {
            Some(size) => self.set_size(size),
            None if self.parent.is_some() => {
                let error = CacheError::MissingSize {
                    node: self.id,
                    page,
                };
                vwarn!(%error, "missing size");
                diagnostics.push(error);
                let observed = offset.saturating_add(items.len());
                self.set_size(self.size.max(observed));
            }
            // The root's size is known up front.
            None => {}
        }
        self.completed.insert(page);

        let expected = self.size.saturating_sub(offset).min(page_size);
        if items.len() < expected {
            let error = CacheError::ShortPage {
                node: self.id,
                page,
                len: items.len(),
                expected,
            };
            vwarn!(%error, "short page");
            diagnostics.push(error);
        }

        vdebug!(
            node = self.id.get(),
            page,
            len = items.len(),
            size = self.size,
            "page loaded"
        );

        for (i, item) in items.into_iter().enumerate() {
            let scaled_index = offset + i;
            if scaled_index >= self.size {
                break;
            }
            let key = (cx.item_key)(&item);
            let is_expanded = expanded.is_expanded(&key);
            let keep_child = self
                .children
                .get(&scaled_index)
                .is_some_and(|child| is_expanded && child.parent_key.as_ref() == Some(&key));
            self.items.insert(scaled_index, item);
            if !keep_child {
                self.children.remove(&scaled_index);
                if is_expanded {
                    self.ensure_child(scaled_index, cx);
                }
            }
        }
    }

    fn visit(&self, parent_index: Option<usize>, f: &mut impl FnMut(NodeInfo)) {
        f(NodeInfo {
            id: self.id,
            parent: self.parent,
            parent_index,
            level: self.level,
            size: self.size,
            effective_size: self.effective_size,
            children_effective_size: self.children_effective_size(),
            child_count: self.children.len(),
            loaded_items: self.items.len(),
            pending_pages: self.pending.len(),
            completed_pages: self.completed.len(),
        });
        for (&scaled_index, child) in &self.children {
            child.visit(Some(scaled_index), f);
        }
    }
}

/// A hierarchical, paged, lazily loaded item cache.
///
/// The root node holds the top-level collection; every expanded item gets a child node holding
/// its children, and so on. Each node is loaded one page at a time through the
/// [`DataProvider`]. The whole tree is addressed by flat indexes: a node's items come first in
/// their own order, with each expanded item followed directly by its (flattened) children.
///
/// Provider answers are queued and only applied by [`ItemCache::process_responses`], so a
/// provider that answers synchronously never re-enters the cache.
pub struct ItemCache<T, K> {
    root: CacheNode<T, K>,
    page_size: usize,
    filters: Vec<Filter>,
    sort_orders: Vec<SortOrder>,
    item_key: ItemKeyFn<T, K>,
    provider: Box<dyn DataProvider<T>>,
    inbox: Inbox<T>,
    next_id: u64,
    diagnostics: Vec<CacheError>,
}

impl<T: Clone, K: ItemKey> ItemCache<T, K> {
    /// Creates an empty cache. Nothing is requested until [`ItemCache::clear`] or the first
    /// lookup.
    pub fn new<P>(provider: P, item_key: ItemKeyFn<T, K>, page_size: usize) -> Self
    where
        P: DataProvider<T> + 'static,
    {
        Self {
            root: CacheNode::root(NodeId(0)),
            page_size: page_size.max(1),
            filters: Vec::new(),
            sort_orders: Vec::new(),
            item_key,
            provider: Box::new(provider),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            next_id: 1,
            diagnostics: Vec::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changes the page size. Cached pages no longer line up, so the cache is cleared.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return;
        }
        self.page_size = page_size;
        self.clear();
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort_orders(&self) -> &[SortOrder] {
        &self.sort_orders
    }

    /// Replaces filters and sort orders, invalidating every node.
    pub fn set_query(&mut self, filters: Vec<Filter>, sort_orders: Vec<SortOrder>) {
        self.filters = filters;
        self.sort_orders = sort_orders;
        self.clear();
    }

    pub fn set_provider<P>(&mut self, provider: P)
    where
        P: DataProvider<T> + 'static,
    {
        self.provider = Box::new(provider);
        self.clear();
    }

    pub fn key_of(&self, item: &T) -> K {
        (self.item_key)(item)
    }

    pub fn item_key(&self) -> &ItemKeyFn<T, K> {
        &self.item_key
    }

    pub fn root(&self) -> NodeId {
        self.root.id
    }

    /// Own size of the root collection.
    pub fn size(&self) -> usize {
        self.root.size
    }

    /// Sets the root collection's size (when it is known up front).
    pub fn set_size(&mut self, size: usize) {
        self.root.set_size(size);
        self.root.recompute();
    }

    /// Length of the flattened tree: root items plus every expanded descendant.
    pub fn effective_size(&self) -> usize {
        self.root.effective_size
    }

    /// Recomputes every node's effective size from its children.
    pub fn update_size(&mut self) {
        self.root.update_size();
    }

    /// Whether any node has a page request in flight.
    pub fn is_loading(&self) -> bool {
        self.root.is_loading()
    }

    /// Whether delivered pages are waiting for [`ItemCache::process_responses`].
    pub fn has_responses(&self) -> bool {
        !self.inbox.borrow().is_empty()
    }

    pub fn get_cache_and_index(&self, index: usize) -> CacheIndex {
        self.root.cache_and_index(index)
    }

    pub fn level_for_index(&self, index: usize) -> usize {
        self.get_cache_and_index(index).level
    }

    /// The item at a flat index, if loaded. Never requests anything.
    pub fn item_at(&self, index: usize) -> Option<&T> {
        let at = self.get_cache_and_index(index);
        self.root.find(at.node)?.items.get(&at.scaled_index)
    }

    /// The item at a flat index.
    ///
    /// If the item is not loaded, its page is requested and `None` is returned. A page already
    /// in flight is not requested twice, and neither is a page that was answered without the
    /// item.
    pub fn get_item_for_index(&mut self, index: usize) -> Option<&T> {
        let at = self.get_cache_and_index(index);
        let page = at.scaled_index / self.page_size;
        let (loaded, wanted) = {
            let node = self.root.find(at.node)?;
            let in_range = node.size == 0 || at.scaled_index < node.size;
            (
                node.items.contains_key(&at.scaled_index),
                in_range && !node.completed.contains(&page),
            )
        };
        if !loaded {
            if wanted {
                self.load_page(at.node, page);
            }
            return None;
        }
        self.item_at(index)
    }

    /// Requests one page of a node, even one answered before. Returns `false` if the node is
    /// unknown or the page is already in flight.
    pub fn load_page(&mut self, node: NodeId, page: usize) -> bool {
        let Some(target) = find_mut(&mut self.root, node) else {
            return false;
        };
        if !target.pending.insert(page) {
            vtrace!(node = node.get(), page, "page already pending");
            return false;
        }
        vdebug!(node = node.get(), page, level = target.level, "request page");
        let callback = PageCallback::new(&self.inbox, node, page);
        let request = PageRequest {
            page,
            page_size: self.page_size,
            filters: &self.filters,
            sort_orders: &self.sort_orders,
            parent_item: target.parent_item.as_ref(),
        };
        self.provider.fetch(request, callback);
        true
    }

    /// Creates the sub-cache for the item at `scaled_index` of `node` and requests its first
    /// page. Returns the child's id, or `None` if the item is not loaded.
    pub fn ensure_sub_cache_for_scaled_index(
        &mut self,
        node: NodeId,
        scaled_index: usize,
    ) -> Option<NodeId> {
        let mut cx = Context {
            item_key: &self.item_key,
            next_id: &mut self.next_id,
            loads: Vec::new(),
        };
        let mut ensure = |target: &mut CacheNode<T, K>| target.ensure_child(scaled_index, &mut cx);
        let child = self.root.with_node(node, &mut ensure).flatten();
        let loads = cx.loads;
        self.run_loads(loads);
        child
    }

    /// Discards the sub-cache of the item at `scaled_index` of `node`, with its whole subtree.
    pub fn remove_sub_cache_for_scaled_index(&mut self, node: NodeId, scaled_index: usize) -> bool {
        let mut remove = |target: &mut CacheNode<T, K>| target.children.remove(&scaled_index);
        let removed = self.root.with_node(node, &mut remove).flatten().is_some();
        if removed {
            vdebug!(node = node.get(), scaled_index, "sub-cache removed");
        }
        removed
    }

    /// Expands the item at a flat index (see [`ItemCache::ensure_sub_cache_for_scaled_index`]).
    pub fn expand_index(&mut self, index: usize) -> Option<NodeId> {
        let at = self.get_cache_and_index(index);
        self.ensure_sub_cache_for_scaled_index(at.node, at.scaled_index)
    }

    pub fn collapse_index(&mut self, index: usize) -> bool {
        let at = self.get_cache_and_index(index);
        self.remove_sub_cache_for_scaled_index(at.node, at.scaled_index)
    }

    /// Creates sub-caches for every loaded expanded item and discards the others.
    pub fn sync_expanded<E>(&mut self, expanded: &E)
    where
        E: ExpandedItems<K> + ?Sized,
    {
        let mut cx = Context {
            item_key: &self.item_key,
            next_id: &mut self.next_id,
            loads: Vec::new(),
        };
        self.root.sync_expanded(expanded, &mut cx);
        let loads = cx.loads;
        self.run_loads(loads);
    }

    /// Applies every delivered page. Returns whether anything changed.
    ///
    /// Responses for nodes that no longer exist are dropped.
    pub fn process_responses<E>(&mut self, expanded: &E) -> bool
    where
        E: ExpandedItems<K> + ?Sized,
    {
        let responses: Vec<PageResponse<T>> = self.inbox.borrow_mut().drain(..).collect();
        if responses.is_empty() {
            return false;
        }
        let page_size = self.page_size;
        let mut applied = false;
        let mut cx = Context {
            item_key: &self.item_key,
            next_id: &mut self.next_id,
            loads: Vec::new(),
        };
        let diagnostics = &mut self.diagnostics;
        for response in responses {
            let node = response.node;
            let mut response = Some(response);
            let hit = self.root.with_node(node, &mut |target: &mut CacheNode<T, K>| {
                if let Some(response) = response.take() {
                    target.apply_page(response, page_size, expanded, &mut cx, diagnostics);
                }
            });
            if hit.is_some() {
                applied = true;
            } else {
                vdebug!(node = node.get(), "stale page response dropped");
            }
        }
        let loads = cx.loads;
        self.run_loads(loads);
        applied
    }

    /// Drops every node and pending request, keeping the root size.
    ///
    /// Responses to requests made before the clear are ignored. If the root is empty afterwards,
    /// its first page is requested.
    pub fn clear(&mut self) {
        let size = self.root.size;
        self.inbox = Rc::new(RefCell::new(VecDeque::new()));
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.root = CacheNode::root(id);
        self.root.size = size;
        self.root.recompute();
        vdebug!(root = id.get(), size, "cache cleared");
        if self.root.effective_size == 0 {
            self.load_page(id, 0);
        }
    }

    pub fn node_info(&self, node: NodeId) -> Option<NodeInfo> {
        let mut out = None;
        self.for_each_node(|info| {
            if info.id == node {
                out = Some(info);
            }
        });
        out
    }

    /// Visits every node depth-first, parents before children.
    pub fn for_each_node(&self, mut f: impl FnMut(NodeInfo)) {
        self.root.visit(None, &mut f);
    }

    /// Returns and clears the malformed-response diagnostics collected so far.
    pub fn take_diagnostics(&mut self) -> Vec<CacheError> {
        core::mem::take(&mut self.diagnostics)
    }

    fn run_loads(&mut self, loads: Vec<(NodeId, usize)>) {
        for (node, page) in loads {
            self.load_page(node, page);
        }
    }
}

fn find_mut<T, K>(node: &mut CacheNode<T, K>, id: NodeId) -> Option<&mut CacheNode<T, K>> {
    if node.id == id {
        return Some(node);
    }
    node.children
        .values_mut()
        .find_map(|child| find_mut(child, id))
}

impl<T, K> fmt::Debug for ItemCache<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemCache")
            .field("root", &self.root.id)
            .field("size", &self.root.size)
            .field("effective_size", &self.root.effective_size)
            .field("page_size", &self.page_size)
            .field("filters", &self.filters)
            .field("sort_orders", &self.sort_orders)
            .finish_non_exhaustive()
    }
}
