//! CSV report of the visible combats (the printable board summary).

use crate::models::Combat;

/// Render the visible combats as a CSV report, sorted by date, then
/// discipline, then time-of-day.
pub fn export_csv(visible: &[Combat]) -> Result<Vec<u8>, csv::Error> {
    let mut sorted: Vec<&Combat> = visible.iter().collect();
    sorted.sort_by_key(|c| (c.date, c.discipline.key(), c.time));

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "fighter",
        "opponent",
        "category",
        "corner",
        "status",
        "date",
        "time",
        "area",
        "coach",
    ])?;
    for c in sorted {
        let date = c
            .date
            .map(|d| d.format("%d/%m").to_string())
            .unwrap_or_else(|| "-".to_string());
        let time = c
            .time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let area = if c.area.is_empty() { "-" } else { &c.area };
        let coach = if c.coach.is_empty() { "-" } else { &c.coach };
        wtr.write_record([
            c.fighter.as_str(),
            c.opponent.as_str(),
            c.category.as_str(),
            c.corner.label(),
            c.status.label(),
            date.as_str(),
            time.as_str(),
            area,
            coach,
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
