//! Public board derivations: stage columns, upcoming/late windows, export.

mod columns;
mod export;
mod upcoming;

pub use columns::{
    board_view, flatten_entries, fold_search_text, has_lost_before, visible_columns, BoardFilter,
    BoardView, CornerCounts, StageColumn,
};
pub use export::export_csv;
pub use upcoming::{upcoming_combats, UpcomingCombat, COMING_SOON_WINDOW_MINUTES};
