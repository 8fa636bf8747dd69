//! # services
//!
//! Use cases of yamdb. Each service holds its ports behind `Arc<dyn _>` and
//! enforces the consistency rules before the store is touched.

pub mod accounts;
pub mod catalog;
pub mod import;
pub mod rating;
pub mod reviews;

pub use accounts::AccountService;
pub use catalog::{CatalogService, TitleFilter, TitleView};
pub use import::{
    CommentRow, GenreTitleRow, ImportBundle, ImportReport, ImportService, NamedSlugRow, ReviewRow,
    RowIssue, SourceCount, TitleRow, UserRow,
};
pub use rating::{mean_score, RatingAggregator};
pub use reviews::{CommentDraft, ReviewDraft, ReviewService};
