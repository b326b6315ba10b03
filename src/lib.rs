//! Combat bracket board: library with models, board derivations, and the store.

pub mod board;
pub mod models;
pub mod store;

pub use board::{
    board_view, export_csv, flatten_entries, has_lost_before, upcoming_combats, visible_columns,
    BoardFilter, BoardView, UpcomingCombat,
};
pub use models::{
    entry_doc_id, CategoryMap, Combat, CombatId, CombatPatch, Corner, Discipline, FighterEntry,
    Stage, Status, WEIGHT_CATEGORIES,
};
pub use store::{prune_backups, BracketStore, FillReport, StoreError};
