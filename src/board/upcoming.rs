//! Upcoming/late sidebar: today's unresolved combats near the current time.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::models::Combat;

/// A combat is "coming soon" when its time falls within this many minutes.
pub const COMING_SOON_WINDOW_MINUTES: u32 = 60;

/// A visible combat annotated for the sidebar.
#[derive(Clone, Debug, Serialize)]
pub struct UpcomingCombat {
    #[serde(flatten)]
    pub combat: Combat,
    /// Scheduled time-of-day has already passed.
    pub is_late: bool,
    /// Scheduled within the next hour.
    pub is_coming_soon: bool,
}

fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Among today's unresolved combats with a scheduled time, keep those that are
/// late (time-of-day already passed) or coming soon (within the next 60
/// minutes), sorted by time-of-day.
///
/// `visible` should already have board visibility applied; `now` is the wall
/// clock the comparison is relative to.
pub fn upcoming_combats(visible: &[Combat], now: NaiveDateTime) -> Vec<UpcomingCombat> {
    let today = now.date();
    let now_minutes = minutes_of_day(now.time());

    let mut upcoming: Vec<UpcomingCombat> = visible
        .iter()
        .filter(|c| !c.is_resolved())
        .filter(|c| c.date == Some(today))
        .filter_map(|c| {
            let combat_minutes = minutes_of_day(c.time?);
            let is_late = combat_minutes < now_minutes;
            let is_coming_soon = combat_minutes >= now_minutes
                && combat_minutes <= now_minutes + COMING_SOON_WINDOW_MINUTES;
            if is_late || is_coming_soon {
                Some(UpcomingCombat {
                    combat: c.clone(),
                    is_late,
                    is_coming_soon,
                })
            } else {
                None
            }
        })
        .collect();

    upcoming.sort_by_key(|u| u.combat.time);
    upcoming
}
