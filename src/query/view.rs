//! ViewState: filter, sort and page bundled the way a table view holds them.
//!
//! Every setter that changes which records are visible, or their order,
//! sends the view back to page 1.

use crate::types::{DocStatus, DocumentKind, UnitRecord};

use super::filter::{filter_units, Completion, UnitFilter};
use super::page::{paginate, PageSpec, UnitPage};
use super::sort::{sort_units, SortKey, SortState};

/// What a table view currently shows: filter, sort and page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    filter: UnitFilter,
    sort: SortState,
    page: PageSpec,
}

impl ViewState {
    /// No filter, ascending by number, page 1 of `page_size`.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: PageSpec::first(page_size),
            ..Self::default()
        }
    }

    pub fn filter(&self) -> &UnitFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn page(&self) -> PageSpec {
        self.page
    }

    /// Replace the whole filter.
    pub fn set_filter(&mut self, filter: UnitFilter) {
        self.filter = filter;
        self.reset_page();
    }

    /// `None` shows every stage.
    pub fn set_stage(&mut self, stage: Option<u8>) {
        self.filter.stage = stage;
        self.reset_page();
    }

    pub fn set_completion(&mut self, completion: Option<Completion>) {
        self.filter.completion = completion;
        self.reset_page();
    }

    /// `None` clears the condition on `kind`.
    pub fn set_document(&mut self, kind: DocumentKind, status: Option<DocStatus>) {
        match status {
            Some(status) => self.filter.documents.insert(kind, status),
            None => self.filter.documents.remove(&kind),
        };
        self.reset_page();
    }

    pub fn set_search(&mut self, needle: impl Into<String>) {
        self.filter.number_contains = Some(needle.into());
        self.reset_page();
    }

    /// Drop every condition. Sort and page size are kept.
    pub fn clear_filters(&mut self) {
        self.filter = UnitFilter::default();
        self.reset_page();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.reset_page();
    }

    /// Header-click semantics; see [`SortState::toggle`].
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
        self.reset_page();
    }

    /// Change the page size and go back to page 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page = PageSpec::first(page_size);
    }

    /// Navigation only; leaves filter and sort alone.
    pub fn go_to(&mut self, page: usize) {
        self.page.page = page;
    }

    /// Advance one page. Paginating clamps past the last page.
    pub fn next_page(&mut self) {
        self.page.page = self.page.page.saturating_add(1);
    }

    /// Go back one page, stopping at 1.
    pub fn previous_page(&mut self) {
        self.page.page = self.page.page.saturating_sub(1).max(1);
    }

    fn reset_page(&mut self) {
        self.page.page = 1;
    }
}

/// filter → sort → paginate.
pub fn run_view(units: &[UnitRecord], view: &ViewState) -> UnitPage {
    let filtered = filter_units(units, &view.filter);
    let sorted = sort_units(filtered, &view.sort);
    paginate(&sorted, view.page)
}
