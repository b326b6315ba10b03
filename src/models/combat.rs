//! Combat (bout), Stage, Status, and Corner.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::discipline::Discipline;

/// Unique identifier for a combat.
pub type CombatId = Uuid;

/// Bracket stage, in fixed board order. `Tour2` and `Tour1` are the club's
/// qualifying rounds and come before the elimination tree proper.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Tour2,
    Tour1,
    Sixteenth,
    Eighth,
    Quarter,
    Semi,
    Final,
}

impl Stage {
    /// All stages in board order (one column per stage).
    pub const ORDER: [Stage; 7] = [
        Stage::Tour2,
        Stage::Tour1,
        Stage::Sixteenth,
        Stage::Eighth,
        Stage::Quarter,
        Stage::Semi,
        Stage::Final,
    ];

    /// Position in `ORDER`; "earlier stage" always means a lower index.
    pub fn index(self) -> usize {
        Self::ORDER.iter().position(|&s| s == self).unwrap_or(0)
    }

    /// Column heading shown on the board.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Tour2 => "Tour 2",
            Stage::Tour1 => "Tour 1",
            Stage::Sixteenth => "16th",
            Stage::Eighth => "8th",
            Stage::Quarter => "Quarter",
            Stage::Semi => "Semi",
            Stage::Final => "Final",
        }
    }
}

/// Result status of a combat.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotPlayed,
    Won,
    Lost,
}

impl Status {
    /// Label used in the exported report.
    pub fn label(self) -> &'static str {
        match self {
            Status::NotPlayed => "Not played",
            Status::Won => "Won",
            Status::Lost => "Lost",
        }
    }
}

/// Helmet corner colour of the club fighter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    Red,
    Blue,
}

impl Corner {
    pub fn label(self) -> &'static str {
        match self {
            Corner::Red => "Red",
            Corner::Blue => "Blue",
        }
    }
}

/// A single bout on the bracket. `fighter` is the club fighter the card
/// belongs to; `opponent` is whoever they face at this stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    /// Generated when an imported document does not carry one.
    #[serde(default = "Uuid::new_v4")]
    pub id: CombatId,
    pub fighter: String,
    pub stage: Stage,
    /// Bout number on the competition schedule.
    pub num: u32,
    pub discipline: Discipline,
    pub opponent: String,
    pub corner: Corner,
    /// Ring/mat area, free-form ("3", "A", ...).
    pub area: String,
    pub coach: String,
    /// Weight category ("-60kg"); empty until backfilled.
    #[serde(default)]
    pub category: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub status: Status,
    /// Set when the fighter lost an earlier stage; the board skips these
    /// without re-deriving the loss.
    #[serde(default)]
    pub hidden_after_loss: bool,
}

impl Combat {
    pub fn new(
        fighter: impl Into<String>,
        stage: Stage,
        num: u32,
        discipline: Discipline,
        opponent: impl Into<String>,
        corner: Corner,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fighter: fighter.into(),
            stage,
            num,
            discipline,
            opponent: opponent.into(),
            corner,
            area: String::new(),
            coach: String::new(),
            category: String::new(),
            date: None,
            time: None,
            status: Status::NotPlayed,
            hidden_after_loss: false,
        }
    }

    /// True once a result has been recorded either way.
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, Status::Won | Status::Lost)
    }
}

/// Partial update for the combat editor; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CombatPatch {
    pub opponent: Option<String>,
    pub num: Option<u32>,
    pub discipline: Option<Discipline>,
    pub corner: Option<Corner>,
    pub area: Option<String>,
    pub coach: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl CombatPatch {
    /// Apply the set fields to a combat.
    pub fn apply(&self, combat: &mut Combat) {
        if let Some(opponent) = &self.opponent {
            combat.opponent = opponent.clone();
        }
        if let Some(num) = self.num {
            combat.num = num;
        }
        if let Some(discipline) = self.discipline {
            combat.discipline = discipline;
        }
        if let Some(corner) = self.corner {
            combat.corner = corner;
        }
        if let Some(area) = &self.area {
            combat.area = area.clone();
        }
        if let Some(coach) = &self.coach {
            combat.coach = coach.clone();
        }
        if let Some(category) = &self.category {
            combat.category = category.clone();
        }
        if let Some(date) = self.date {
            combat.date = Some(date);
        }
        if let Some(time) = self.time {
            combat.time = Some(time);
        }
    }
}
