//! Stage columns: flatten entries, apply filters, hide fighters who already
//! lost an earlier stage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Combat, Corner, Discipline, FighterEntry, Stage, Status};

/// Board query filters. All optional; an unset field matches everything.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BoardFilter {
    pub stage: Option<Stage>,
    pub corner: Option<Corner>,
    pub discipline: Option<Discipline>,
    /// Free-text search over fighter and opponent names.
    pub search: Option<String>,
}

/// One column of the board: every visible combat at one stage, in schedule order.
#[derive(Clone, Debug, Serialize)]
pub struct StageColumn {
    pub stage: Stage,
    pub label: &'static str,
    pub combats: Vec<Combat>,
}

/// Visible combats per corner colour (shown on the colour filter buttons).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CornerCounts {
    pub red: usize,
    pub blue: usize,
}

/// Full board response: one column per stage plus corner counts.
#[derive(Clone, Debug, Serialize)]
pub struct BoardView {
    pub columns: Vec<StageColumn>,
    pub corner_counts: CornerCounts,
}

/// Lowercase and strip the accents that appear in French fighter names, so
/// "Rémy" matches a search for "remy".
pub fn fold_search_text(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Flatten all entries into one combat list (the board works on this).
pub fn flatten_entries(entries: &HashMap<String, FighterEntry>) -> Vec<Combat> {
    entries
        .values()
        .flat_map(|e| e.combats.iter().cloned())
        .collect()
}

/// Elimination visibility rule: true if `fighter` has a recorded loss at any
/// stage strictly earlier than `stage` in the fixed stage order.
pub fn has_lost_before(combats: &[Combat], fighter: &str, stage: Stage) -> bool {
    let current = stage.index();
    if current == 0 {
        return false;
    }
    combats.iter().any(|c| {
        c.fighter == fighter && c.status == Status::Lost && c.stage.index() < current
    })
}

/// Schedule order within a column: date ascending (undated first), then
/// time-of-day ascending (untimed first).
fn schedule_key(c: &Combat) -> (Option<chrono::NaiveDate>, Option<chrono::NaiveTime>) {
    (c.date, c.time)
}

/// Derive the per-stage columns from the flat combat list.
///
/// A combat is visible when it passes every active filter, is not itself lost,
/// is not flagged `hidden_after_loss`, and its fighter has no loss at an
/// earlier stage.
pub fn visible_columns(combats: &[Combat], filter: &BoardFilter) -> Vec<StageColumn> {
    let term = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(fold_search_text);

    Stage::ORDER
        .iter()
        .map(|&stage| {
            let mut column: Vec<Combat> = combats
                .iter()
                .filter(|c| c.stage == stage)
                .filter(|c| filter.stage.map_or(true, |s| s == stage))
                .filter(|c| filter.corner.map_or(true, |k| c.corner == k))
                .filter(|c| filter.discipline.map_or(true, |d| c.discipline == d))
                .filter(|c| match &term {
                    Some(t) => {
                        fold_search_text(&c.fighter).contains(t.as_str())
                            || fold_search_text(&c.opponent).contains(t.as_str())
                    }
                    None => true,
                })
                .filter(|c| c.status != Status::Lost)
                .filter(|c| !c.hidden_after_loss)
                .filter(|c| !has_lost_before(combats, &c.fighter, stage))
                .cloned()
                .collect();
            column.sort_by_key(schedule_key);
            StageColumn {
                stage,
                label: stage.label(),
                combats: column,
            }
        })
        .collect()
}

/// Columns plus corner counts over the visible combats.
pub fn board_view(combats: &[Combat], filter: &BoardFilter) -> BoardView {
    let columns = visible_columns(combats, filter);
    let mut corner_counts = CornerCounts::default();
    for c in columns.iter().flat_map(|col| col.combats.iter()) {
        match c.corner {
            Corner::Red => corner_counts.red += 1,
            Corner::Blue => corner_counts.blue += 1,
        }
    }
    BoardView {
        columns,
        corner_counts,
    }
}
