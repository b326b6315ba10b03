//! FighterEntry: one document per fighter and discipline.

use serde::{Deserialize, Serialize};

use crate::models::combat::{Combat, CombatId};
use crate::models::discipline::Discipline;

/// All combats of one fighter in one discipline. Stored as a single document
/// whose id is `{discipline}_{fighter}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FighterEntry {
    pub discipline: Discipline,
    pub fighter: String,
    #[serde(default)]
    pub combats: Vec<Combat>,
}

impl FighterEntry {
    pub fn new(discipline: Discipline, fighter: impl Into<String>) -> Self {
        Self {
            discipline,
            fighter: fighter.into(),
            combats: Vec::new(),
        }
    }

    /// Document id for this entry.
    pub fn doc_id(&self) -> String {
        entry_doc_id(self.discipline, &self.fighter)
    }

    pub fn combat(&self, id: CombatId) -> Option<&Combat> {
        self.combats.iter().find(|c| c.id == id)
    }

    pub fn combat_mut(&mut self, id: CombatId) -> Option<&mut Combat> {
        self.combats.iter_mut().find(|c| c.id == id)
    }

    /// Stamp the entry's fighter name onto combats that omit it. Imported
    /// documents sometimes carry the name only at the entry level.
    pub fn stamp_combats(&mut self) {
        for c in &mut self.combats {
            if c.fighter.is_empty() {
                c.fighter = self.fighter.clone();
            }
        }
    }
}

/// Build the document id for a (discipline, fighter) pair.
pub fn entry_doc_id(discipline: Discipline, fighter: &str) -> String {
    format!("{}_{}", discipline.key(), fighter.trim())
}
