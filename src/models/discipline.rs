//! Kickboxing disciplines and weight categories.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Discipline a combat is fought under. Light-contact and full-contact
/// families are grouped separately in the board's filter dropdown.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    LightContact,
    KickLight,
    K1Light,
    FullContact,
    LowKick,
    K1,
}

impl Discipline {
    pub const LIGHT: [Discipline; 3] = [
        Discipline::LightContact,
        Discipline::KickLight,
        Discipline::K1Light,
    ];

    pub const FULL: [Discipline; 3] = [
        Discipline::FullContact,
        Discipline::LowKick,
        Discipline::K1,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Discipline::LightContact => "Light Contact",
            Discipline::KickLight => "Kick Light",
            Discipline::K1Light => "K1 Light",
            Discipline::FullContact => "Full Contact",
            Discipline::LowKick => "Low Kick",
            Discipline::K1 => "K1",
        }
    }

    /// Stable identifier, also used in document ids (`{discipline}_{fighter}`).
    pub fn key(self) -> &'static str {
        match self {
            Discipline::LightContact => "light_contact",
            Discipline::KickLight => "kick_light",
            Discipline::K1Light => "k1_light",
            Discipline::FullContact => "full_contact",
            Discipline::LowKick => "low_kick",
            Discipline::K1 => "k1",
        }
    }
}

/// Weight categories offered in the combat editor.
pub const WEIGHT_CATEGORIES: [&str; 7] =
    ["-37kg", "-50kg", "-55kg", "-60kg", "-65kg", "-70kg", "-75kg"];

/// Fighter name -> weight category, used to backfill combats entered without one.
pub type CategoryMap = HashMap<String, String>;
