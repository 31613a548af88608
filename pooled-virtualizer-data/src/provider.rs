use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::cmp::Ordering;
use core::fmt;

use crate::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One column of the grid's sort order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortOrder {
    pub path: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(path: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }
}

/// One active filter: items whose `path` matches `value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Filter {
    pub path: String,
    pub value: String,
}

impl Filter {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// What the cache asks a [`DataProvider`] for.
#[derive(Debug)]
pub struct PageRequest<'a, T> {
    pub page: usize,
    pub page_size: usize,
    pub filters: &'a [Filter],
    pub sort_orders: &'a [SortOrder],
    /// The expanded item whose children are requested; `None` for the root collection.
    pub parent_item: Option<&'a T>,
}

impl<T> PageRequest<'_, T> {
    /// Range of collection indexes this page covers.
    pub fn range(&self) -> core::ops::Range<usize> {
        let start = self.page.saturating_mul(self.page_size);
        start..start.saturating_add(self.page_size)
    }
}

/// A page delivered back to the cache.
#[derive(Clone, Debug, PartialEq)]
pub struct PageResponse<T> {
    pub node: NodeId,
    pub page: usize,
    pub items: Vec<T>,
    pub size: Option<usize>,
}

pub(crate) type Inbox<T> = Rc<RefCell<VecDeque<PageResponse<T>>>>;

/// Completion handle for one page request.
///
/// `complete` takes the callback by value, so a request is answered at most once. The callback
/// may be called right away or kept and called later; if the cache is gone or has been cleared
/// by then, the response is dropped. Dropping the callback without calling it leaves the page
/// unloaded.
pub struct PageCallback<T> {
    inbox: Weak<RefCell<VecDeque<PageResponse<T>>>>,
    node: NodeId,
    page: usize,
}

impl<T> PageCallback<T> {
    pub(crate) fn new(inbox: &Inbox<T>, node: NodeId, page: usize) -> Self {
        Self {
            inbox: Rc::downgrade(inbox),
            node,
            page,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Delivers the page.
    ///
    /// `size` is the total item count of the requested collection. It may be `None` for the
    /// root collection when the grid's size is already known; child collections must report
    /// it.
    pub fn complete(self, items: Vec<T>, size: Option<usize>) {
        let Some(inbox) = self.inbox.upgrade() else {
            return;
        };
        inbox.borrow_mut().push_back(PageResponse {
            node: self.node,
            page: self.page,
            items,
            size,
        });
    }
}

impl<T> fmt::Debug for PageCallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCallback")
            .field("node", &self.node)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

/// Fetches pages of items for the cache.
///
/// Implemented for closures `FnMut(PageRequest<'_, T>, PageCallback<T>)`.
pub trait DataProvider<T> {
    fn fetch(&mut self, request: PageRequest<'_, T>, callback: PageCallback<T>);
}

impl<T, F> DataProvider<T> for F
where
    F: FnMut(PageRequest<'_, T>, PageCallback<T>),
{
    fn fetch(&mut self, request: PageRequest<'_, T>, callback: PageCallback<T>) {
        self(request, callback)
    }
}

pub type FilterFn<T> = Arc<dyn Fn(&T, &[Filter]) -> bool + Send + Sync>;
pub type CompareFn<T> = Arc<dyn Fn(&T, &T, &[SortOrder]) -> Ordering + Send + Sync>;

/// A flat, in-memory provider that answers every request synchronously.
///
/// Filtering and sorting are delegated to the optional `filter`/`compare` closures, which receive
/// the grid's current filters and sort orders. Requests for child collections get an empty page.
pub struct ArrayDataProvider<T> {
    items: Vec<T>,
    filter: Option<FilterFn<T>>,
    compare: Option<CompareFn<T>>,
}

impl<T: Clone> ArrayDataProvider<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            filter: None,
            compare: None,
        }
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(&T, &[Filter]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_compare(
        mut self,
        compare: impl Fn(&T, &T, &[SortOrder]) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.compare = Some(Arc::new(compare));
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    fn query(&self, filters: &[Filter], sort_orders: &[SortOrder]) -> Vec<&T> {
        let mut out: Vec<&T> = match (&self.filter, filters.is_empty()) {
            (Some(filter), false) => self
                .items
                .iter()
                .filter(|item| filter(*item, filters))
                .collect(),
            _ => self.items.iter().collect(),
        };
        if let (Some(compare), false) = (&self.compare, sort_orders.is_empty()) {
            out.sort_by(|a, b| compare(*a, *b, sort_orders));
        }
        out
    }
}

impl<T: Clone> DataProvider<T> for ArrayDataProvider<T> {
    fn fetch(&mut self, request: PageRequest<'_, T>, callback: PageCallback<T>) {
        if request.parent_item.is_some() {
            callback.complete(Vec::new(), Some(0));
            return;
        }
        let rows = self.query(request.filters, request.sort_orders);
        let size = rows.len();
        let range = request.range();
        let page = rows
            .into_iter()
            .skip(range.start)
            .take(range.len())
            .cloned()
            .collect();
        callback.complete(page, Some(size));
    }
}

impl<T: fmt::Debug> fmt::Debug for ArrayDataProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayDataProvider")
            .field("items", &self.items)
            .field("filter", &self.filter.as_ref().map(|_| "Fn(..)"))
            .field("compare", &self.compare.as_ref().map(|_| "Fn(..)"))
            .finish()
    }
}
