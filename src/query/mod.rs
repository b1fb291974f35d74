//! View pipeline: filter → sort → paginate over mirrored units.
//!
//! Everything here is synchronous and side-effect free; inputs are never
//! mutated, results are fresh vectors.

pub mod filter;
pub mod page;
pub mod sort;
pub mod view;

pub use filter::{apply_predicates, filter_units, Completion, Predicate, UnitFilter};
pub use page::{page_count, paginate, Page, PageSpec, UnitPage};
pub use sort::{compare_units, sort_units, SortDirection, SortKey, SortState};
pub use view::{run_view, ViewState};
