//! Integration tests for the document store: status propagation, category
//! backfill, and snapshot/backup/restore.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use combat_bracket_web::{
    entry_doc_id, prune_backups, BracketStore, Combat, Corner, Discipline, FighterEntry, Stage,
    Status, StoreError,
};

fn combat(fighter: &str, stage: Stage) -> Combat {
    Combat::new(fighter, stage, 1, Discipline::KickLight, "Opponent", Corner::Blue)
}

fn entry_with_stages(fighter: &str, stages: &[Stage]) -> FighterEntry {
    let mut entry = FighterEntry::new(Discipline::KickLight, fighter);
    entry.combats = stages.iter().map(|&s| combat(fighter, s)).collect();
    entry
}

/// Unique temp dir for file-backed store tests.
fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bracket_store_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn doc_id_is_discipline_and_fighter() {
    let entry = FighterEntry::new(Discipline::FullContact, "Ana");
    assert_eq!(entry.doc_id(), "full_contact_Ana");
    assert_eq!(entry_doc_id(Discipline::K1Light, " Ben "), "k1_light_Ben");
}

#[test]
fn recording_a_loss_hides_later_stages_only() {
    let mut store = BracketStore::new();
    let entry = entry_with_stages("Ana", &[Stage::Eighth, Stage::Quarter, Stage::Semi]);
    let quarter_id = entry.combats[1].id;
    let doc_id = store.upsert_entry(entry).expect("upsert");

    let updated = store
        .set_status(&doc_id, quarter_id, Status::Lost)
        .expect("set status");

    let by_stage: HashMap<Stage, &Combat> =
        updated.combats.iter().map(|c| (c.stage, c)).collect();
    assert_eq!(by_stage[&Stage::Quarter].status, Status::Lost);
    assert!(!by_stage[&Stage::Eighth].hidden_after_loss);
    assert!(!by_stage[&Stage::Quarter].hidden_after_loss);
    assert!(by_stage[&Stage::Semi].hidden_after_loss);
}

#[test]
fn lifting_a_loss_unhides_the_entry() {
    let mut store = BracketStore::new();
    let entry = entry_with_stages("Ana", &[Stage::Quarter, Stage::Semi]);
    let quarter_id = entry.combats[0].id;
    let doc_id = store.upsert_entry(entry).expect("upsert");

    store
        .set_status(&doc_id, quarter_id, Status::Lost)
        .expect("set lost");
    let updated = store
        .set_status(&doc_id, quarter_id, Status::Won)
        .expect("set won");

    assert!(updated.combats.iter().all(|c| !c.hidden_after_loss));
    assert_eq!(updated.combats[0].status, Status::Won);
}

#[test]
fn update_combat_applies_only_the_set_fields() {
    let mut store = BracketStore::new();
    let mut entry = entry_with_stages("Ana", &[Stage::Quarter]);
    entry.combats[0].area = "3".to_string();
    let combat_id = entry.combats[0].id;
    let doc_id = store.upsert_entry(entry).expect("upsert");

    let patch = combat_bracket_web::CombatPatch {
        opponent: Some("Martin".to_string()),
        num: Some(42),
        ..Default::default()
    };
    let updated = store
        .update_combat(&doc_id, combat_id, &patch)
        .expect("update");

    let c = &updated.combats[0];
    assert_eq!(c.opponent, "Martin");
    assert_eq!(c.num, 42);
    // Untouched fields survive the patch.
    assert_eq!(c.area, "3");
    assert_eq!(c.corner, Corner::Blue);
}

#[test]
fn set_status_on_unknown_combat_fails() {
    let mut store = BracketStore::new();
    let doc_id = store
        .upsert_entry(entry_with_stages("Ana", &[Stage::Quarter]))
        .expect("upsert");
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        store.set_status(&doc_id, missing, Status::Won),
        Err(StoreError::CombatNotFound(_))
    ));
    assert!(matches!(
        store.set_status("no_such_doc", missing, Status::Won),
        Err(StoreError::EntryNotFound(_))
    ));
}

#[test]
fn reset_statuses_clears_results_and_hidden_flags() {
    let mut store = BracketStore::new();
    let entry = entry_with_stages("Ana", &[Stage::Quarter, Stage::Semi]);
    let quarter_id = entry.combats[0].id;
    let doc_id = store.upsert_entry(entry).expect("upsert");
    store
        .set_status(&doc_id, quarter_id, Status::Lost)
        .expect("set lost");

    store.reset_statuses().expect("reset");

    let entry = store.get(&doc_id).expect("entry");
    assert!(entry
        .combats
        .iter()
        .all(|c| c.status == Status::NotPlayed && !c.hidden_after_loss));
}

#[test]
fn fill_categories_only_touches_missing_ones() {
    let mut store = BracketStore::new();
    let mut entry = entry_with_stages("Ana", &[Stage::Quarter, Stage::Semi]);
    entry.combats[0].category = "-65kg".to_string();
    let doc_id = store.upsert_entry(entry).expect("upsert");
    store
        .upsert_entry(entry_with_stages("Zoe", &[Stage::Quarter]))
        .expect("upsert");

    let mut map = HashMap::new();
    map.insert("Ana".to_string(), "-60kg".to_string());
    let report = store.fill_categories(&map).expect("fill");

    // Ana's semi gets -60kg; her quarter keeps -65kg; Zoe has no mapping.
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, 2);
    let entry = store.get(&doc_id).expect("entry");
    assert_eq!(entry.combats[0].category, "-65kg");
    assert_eq!(entry.combats[1].category, "-60kg");
}

#[test]
fn entries_survive_reopen() {
    let dir = temp_dir();
    let path = dir.join("brackets.json");
    {
        let mut store = BracketStore::open(&path).expect("open");
        store
            .upsert_entry(entry_with_stages("Ana", &[Stage::Quarter]))
            .expect("upsert");
    }
    let store = BracketStore::open(&path).expect("reopen");
    assert_eq!(store.len(), 1);
    assert!(store.get("kick_light_Ana").is_some());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_writes_a_backup_of_previous_contents() {
    let dir = temp_dir();
    let path = dir.join("brackets.json");
    let mut store = BracketStore::open(&path).expect("open");
    store
        .upsert_entry(entry_with_stages("Ana", &[Stage::Quarter]))
        .expect("upsert");

    let backup = store
        .replace_all_with_backup(vec![entry_with_stages("Ben", &[Stage::Semi])])
        .expect("import");

    let backup = backup.expect("backup written for non-empty store");
    assert!(backup.exists());
    assert_eq!(store.len(), 1);
    assert!(store.get("kick_light_Ben").is_some());
    assert!(store.get("kick_light_Ana").is_none());

    // The backup holds the pre-import contents and restores them.
    store.restore_from_file(&backup).expect("restore");
    assert!(store.get("kick_light_Ana").is_some());
    assert!(store.get("kick_light_Ben").is_none());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_into_empty_store_skips_the_backup() {
    let dir = temp_dir();
    let mut store = BracketStore::open(dir.join("brackets.json")).expect("open");
    let backup = store
        .replace_all_with_backup(vec![entry_with_stages("Ana", &[Stage::Quarter])])
        .expect("import");
    assert!(backup.is_none());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn prune_keeps_the_newest_backups() {
    let dir = temp_dir();
    for ts in [1000, 2000, 3000, 4000] {
        fs::write(dir.join(format!("brackets_backup_{ts}.json")), "[]").expect("write");
    }
    fs::write(dir.join("unrelated.json"), "{}").expect("write");

    let removed = prune_backups(&dir, 2).expect("prune");
    assert_eq!(removed, 2);
    assert!(!dir.join("brackets_backup_1000.json").exists());
    assert!(!dir.join("brackets_backup_2000.json").exists());
    assert!(dir.join("brackets_backup_3000.json").exists());
    assert!(dir.join("brackets_backup_4000.json").exists());
    assert!(dir.join("unrelated.json").exists());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn clear_all_reports_removed_count() {
    let mut store = BracketStore::new();
    store
        .upsert_entry(entry_with_stages("Ana", &[Stage::Quarter]))
        .expect("upsert");
    store
        .upsert_entry(entry_with_stages("Ben", &[Stage::Semi]))
        .expect("upsert");
    assert_eq!(store.clear_all().expect("clear"), 2);
    assert!(store.is_empty());
}
