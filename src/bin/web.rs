//! Single binary web server: board HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the board is reachable from the venue Wi-Fi.
//! Override with env: HOST, PORT, DATA_FILE (snapshot path), EDITOR_TOKENS (comma-separated).

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use chrono::{Local, NaiveDate, NaiveTime};
use combat_bracket_web::{
    board_view, export_csv, flatten_entries, prune_backups, upcoming_combats, BoardFilter,
    BracketStore, CategoryMap, Combat, CombatId, CombatPatch, Corner, Discipline, FighterEntry,
    Stage, Status, StoreError, WEIGHT_CATEGORIES,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

/// Shared state: the whole bracket collection behind one lock.
type AppState = Data<RwLock<BracketStore>>;

/// Keep this many backup files when pruning.
const BACKUPS_TO_KEEP: usize = 10;

/// Editor tokens accepted in the `X-Editor-Token` header. Empty list means
/// the board is read-only (auth provider integration is out of scope; this is
/// the allowed-editors check).
struct EditorConfig {
    tokens: Vec<String>,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct SetStatusBody {
    status: Status,
}

/// Fields for a new combat; schedule/coach details are optional at entry time.
#[derive(Deserialize)]
struct AddCombatBody {
    stage: Stage,
    num: u32,
    discipline: Discipline,
    opponent: String,
    corner: Corner,
    #[serde(default)]
    area: String,
    #[serde(default)]
    coach: String,
    #[serde(default)]
    category: String,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

#[derive(Deserialize)]
struct RestoreBody {
    /// Backup file name (no directories), resolved inside the backup dir.
    file: String,
}

/// Path segment: entry document id (e.g. /api/entries/{id})
#[derive(Deserialize)]
struct EntryPath {
    id: String,
}

/// Path segments: entry id and combat id (e.g. /api/entries/{id}/combats/{combat_id})
#[derive(Deserialize)]
struct EntryCombatPath {
    id: String,
    combat_id: CombatId,
}

fn json_error(msg: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": msg.to_string() })
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

fn store_error(e: StoreError) -> HttpResponse {
    match e {
        StoreError::EntryNotFound(_) | StoreError::CombatNotFound(_) => {
            HttpResponse::NotFound().json(json_error(e))
        }
        StoreError::Io(_) | StoreError::Json(_) => {
            HttpResponse::InternalServerError().json(json_error(e))
        }
    }
}

fn editor_authorized(req: &HttpRequest, cfg: &EditorConfig) -> bool {
    let Some(token) = req
        .headers()
        .get("X-Editor-Token")
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    cfg.tokens.iter().any(|t| t == token)
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(json_error("Editor token required"))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "combat-bracket-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Public board: per-stage columns and corner counts, with optional filters.
#[get("/api/board")]
async fn api_board(state: AppState, filter: Query<BoardFilter>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let combats = flatten_entries(g.entries());
    HttpResponse::Ok().json(board_view(&combats, &filter))
}

/// Sidebar: today's late / coming-soon combats among the visible ones.
#[get("/api/board/upcoming")]
async fn api_board_upcoming(state: AppState, filter: Query<BoardFilter>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let combats = flatten_entries(g.entries());
    let visible: Vec<Combat> = board_view(&combats, &filter)
        .columns
        .into_iter()
        .flat_map(|col| col.combats)
        .collect();
    let upcoming = upcoming_combats(&visible, Local::now().naive_local());
    HttpResponse::Ok().json(upcoming)
}

/// The single next combat (first of the upcoming list), 204 when there is none.
#[get("/api/board/next")]
async fn api_board_next(state: AppState, filter: Query<BoardFilter>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let combats = flatten_entries(g.entries());
    let visible: Vec<Combat> = board_view(&combats, &filter)
        .columns
        .into_iter()
        .flat_map(|col| col.combats)
        .collect();
    let mut upcoming = upcoming_combats(&visible, Local::now().naive_local());
    if upcoming.is_empty() {
        return HttpResponse::NoContent().finish();
    }
    HttpResponse::Ok().json(upcoming.remove(0))
}

/// CSV report of the visible combats (download).
#[get("/api/board/export.csv")]
async fn api_board_export(state: AppState, filter: Query<BoardFilter>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let combats = flatten_entries(g.entries());
    let visible: Vec<Combat> = board_view(&combats, &filter)
        .columns
        .into_iter()
        .flat_map(|col| col.combats)
        .collect();
    match export_csv(&visible) {
        Ok(data) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!(
                    "attachment; filename=\"bracket_{}.csv\"",
                    Local::now().date_naive().format("%Y-%m-%d")
                ),
            ))
            .body(data),
        Err(e) => HttpResponse::InternalServerError().json(json_error(e)),
    }
}

/// Weight categories for the editor dropdown.
#[get("/api/categories")]
async fn api_categories() -> impl Responder {
    HttpResponse::Ok().json(WEIGHT_CATEGORIES)
}

/// Disciplines grouped by family, for the board's filter dropdown.
#[get("/api/disciplines")]
async fn api_disciplines() -> impl Responder {
    let group = |family: &[Discipline]| -> Vec<serde_json::Value> {
        family
            .iter()
            .map(|d| serde_json::json!({ "value": d, "label": d.label() }))
            .collect()
    };
    HttpResponse::Ok().json(serde_json::json!({
        "light_contact": group(&Discipline::LIGHT),
        "full_contact": group(&Discipline::FULL),
    }))
}

/// List all entries (editor's "existing brackets" view). Raw entries carry
/// statuses and hidden flags the public board filters out, so reads are
/// token-guarded like the rest of the editor API.
#[get("/api/entries")]
async fn api_list_entries(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.entries())
}

/// Get one entry by document id (404 if not found).
#[get("/api/entries/{id}")]
async fn api_get_entry(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    path: Path<EntryPath>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(entry),
        None => HttpResponse::NotFound().json(json_error("No entry")),
    }
}

/// Insert or replace one fighter entry.
#[post("/api/entries")]
async fn api_upsert_entry(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    body: Json<FighterEntry>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    if body.fighter.trim().is_empty() {
        return HttpResponse::BadRequest().json(json_error("Fighter name required"));
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.upsert_entry(body.into_inner()) {
        Ok(doc_id) => match g.get(&doc_id) {
            Some(entry) => HttpResponse::Ok().json(serde_json::json!({
                "id": doc_id,
                "entry": entry,
            })),
            None => HttpResponse::InternalServerError().json(json_error("Entry vanished")),
        },
        Err(e) => store_error(e),
    }
}

/// Delete one entry.
#[delete("/api/entries/{id}")]
async fn api_delete_entry(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    path: Path<EntryPath>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.delete_entry(&path.id) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "deleted": path.id })),
        Err(e) => store_error(e),
    }
}

/// Delete every entry (the "clear all" admin action).
#[delete("/api/entries")]
async fn api_clear_entries(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.clear_all() {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({ "removed": removed })),
        Err(e) => store_error(e),
    }
}

/// Add a combat to an entry.
#[post("/api/entries/{id}/combats")]
async fn api_add_combat(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    path: Path<EntryPath>,
    body: Json<AddCombatBody>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let b = body.into_inner();
    let mut combat = Combat::new(String::new(), b.stage, b.num, b.discipline, b.opponent, b.corner);
    combat.area = b.area;
    combat.coach = b.coach;
    combat.category = b.category;
    combat.date = b.date;
    combat.time = b.time;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.add_combat(&path.id, combat) {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => store_error(e),
    }
}

/// Edit a combat's fields (partial update).
#[put("/api/entries/{id}/combats/{combat_id}")]
async fn api_update_combat(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    path: Path<EntryCombatPath>,
    body: Json<CombatPatch>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.update_combat(&path.id, path.combat_id, &body) {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => store_error(e),
    }
}

/// Remove a combat from an entry.
#[delete("/api/entries/{id}/combats/{combat_id}")]
async fn api_remove_combat(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    path: Path<EntryCombatPath>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.remove_combat(&path.id, path.combat_id) {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => store_error(e),
    }
}

/// Record a combat result. A loss hides the fighter's later-stage combats.
#[put("/api/entries/{id}/combats/{combat_id}/status")]
async fn api_set_status(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    path: Path<EntryCombatPath>,
    body: Json<SetStatusBody>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.set_status(&path.id, path.combat_id, body.status) {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => store_error(e),
    }
}

/// Reset every combat to not played (between competition days).
#[post("/api/reset-statuses")]
async fn api_reset_statuses(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.reset_statuses() {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "reset": true })),
        Err(e) => store_error(e),
    }
}

/// Backfill missing weight categories from a fighter -> category map.
#[post("/api/categories/fill")]
async fn api_fill_categories(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    body: Json<CategoryMap>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.fill_categories(&body) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => store_error(e),
    }
}

/// Replace the whole collection. A backup of the previous contents is written
/// first when the store is file-backed.
#[post("/api/import")]
async fn api_import(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    body: Json<Vec<FighterEntry>>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let entries = body.into_inner();
    let count = entries.len();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.replace_all_with_backup(entries) {
        Ok(backup) => HttpResponse::Ok().json(serde_json::json!({
            "imported": count,
            "backup": backup.map(|p| p.display().to_string()),
        })),
        Err(e) => store_error(e),
    }
}

/// Download the whole collection as snapshot JSON.
#[get("/api/backup")]
async fn api_backup(req: HttpRequest, state: AppState, cfg: Data<EditorConfig>) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.snapshot_json() {
        Ok(json) => HttpResponse::Ok()
            .content_type("application/json")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"brackets_backup.json\"",
            ))
            .body(json),
        Err(e) => store_error(e),
    }
}

/// Restore the collection from a previously written backup file.
#[post("/api/restore")]
async fn api_restore(
    req: HttpRequest,
    state: AppState,
    cfg: Data<EditorConfig>,
    body: Json<RestoreBody>,
) -> HttpResponse {
    if !editor_authorized(&req, &cfg) {
        return forbidden();
    }
    // File names only; the path is always resolved inside the backup dir.
    if body.file.contains('/') || body.file.contains('\\') || body.file.contains("..") {
        return HttpResponse::BadRequest().json(json_error("Invalid backup file name"));
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let Some(dir) = g.backup_dir() else {
        return HttpResponse::BadRequest().json(json_error("Store is not file-backed"));
    };
    match g.restore_from_file(&dir.join(&body.file)) {
        Ok(count) => HttpResponse::Ok().json(serde_json::json!({ "restored": count })),
        Err(e) => store_error(e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_file() -> String {
    "brackets.json".to_string()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let data_file =
        PathBuf::from(std::env::var("DATA_FILE").unwrap_or_else(|_| default_data_file()));
    let tokens: Vec<String> = std::env::var("EDITOR_TOKENS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if tokens.is_empty() {
        log::warn!("EDITOR_TOKENS not set: board is read-only");
    }

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = BracketStore::open(&data_file)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    log::info!("Loaded {} entries from {}", store.len(), data_file.display());
    let backup_dir = store.backup_dir();

    let state = Data::new(RwLock::new(store));
    let editor_cfg = Data::new(EditorConfig { tokens });

    // Background task: every hour, prune old backup files (keep the newest 10)
    if let Some(dir) = backup_dir {
        actix_web::rt::spawn(async move {
            let mut interval = actix_web::rt::time::interval(Duration::from_secs(60 * 60));
            loop {
                interval.tick().await;
                match prune_backups(&dir, BACKUPS_TO_KEEP) {
                    Ok(0) => {}
                    Ok(removed) => log::info!("Pruned {} old backup file(s)", removed),
                    Err(e) => log::warn!("Backup pruning failed: {}", e),
                }
            }
        });
    }

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(editor_cfg.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_board)
            .service(api_board_upcoming)
            .service(api_board_next)
            .service(api_board_export)
            .service(api_categories)
            .service(api_disciplines)
            .service(api_list_entries)
            .service(api_get_entry)
            .service(api_upsert_entry)
            .service(api_delete_entry)
            .service(api_clear_entries)
            .service(api_add_combat)
            .service(api_update_combat)
            .service(api_remove_combat)
            .service(api_set_status)
            .service(api_reset_statuses)
            .service(api_fill_categories)
            .service(api_import)
            .service(api_backup)
            .service(api_restore)
            .service(Files::new("/static", "static"))
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
