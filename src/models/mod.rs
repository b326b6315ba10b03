//! Data structures for the bracket board: combats, fighter entries, disciplines.

mod combat;
mod discipline;
mod entry;

pub use combat::{Combat, CombatId, CombatPatch, Corner, Stage, Status};
pub use discipline::{CategoryMap, Discipline, WEIGHT_CATEGORIES};
pub use entry::{entry_doc_id, FighterEntry};
