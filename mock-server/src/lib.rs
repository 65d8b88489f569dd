use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "test-token";
pub const TWITTER_PROFILE_ID: &str = "4eb854340acb04e870000010";
pub const FACEBOOK_PROFILE_ID: &str = "4eb854340acb04e870000011";

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub days: Vec<String>,
    pub times: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub service: String,
    pub formatted_username: String,
    pub schedules: Vec<ScheduleRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUpdate {
    pub id: String,
    pub profile_id: String,
    pub text: String,
    /// `buffer` while queued, `sent` once shared.
    pub status: String,
    pub shorten: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub media: BTreeMap<String, String>,
}

impl StoredUpdate {
    fn is_pending_for(&self, profile_id: &str) -> bool {
        self.profile_id == profile_id && self.status == "buffer"
    }
}

/// In-memory account state. Queue order is the order of `updates`.
#[derive(Debug, Default)]
pub struct Store {
    pub profiles: Vec<Profile>,
    pub updates: Vec<StoredUpdate>,
}

impl Store {
    pub fn seeded() -> Self {
        let weekdays = ["mon", "tue", "wed", "thu", "fri"].map(String::from).to_vec();
        let profile = |id: &str, service: &str, username: &str| Profile {
            id: id.to_string(),
            service: service.to_string(),
            formatted_username: username.to_string(),
            schedules: vec![ScheduleRecord {
                days: weekdays.clone(),
                times: vec!["12:00".to_string(), "17:00".to_string()],
            }],
        };
        Self {
            profiles: vec![
                profile(TWITTER_PROFILE_ID, "twitter", "@buffer"),
                profile(FACEBOOK_PROFILE_ID, "facebook", "Buffer"),
            ],
            updates: Vec::new(),
        }
    }

    fn profile(&self, id: &str) -> Result<&Profile, ApiFailure> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiFailure::not_found("profile"))
    }

    fn profile_mut(&mut self, id: &str) -> Result<&mut Profile, ApiFailure> {
        self.profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiFailure::not_found("profile"))
    }

    fn pending(&self, profile_id: &str) -> Vec<StoredUpdate> {
        self.updates
            .iter()
            .filter(|u| u.is_pending_for(profile_id))
            .cloned()
            .collect()
    }

    /// Replace a profile's queue with `queue`, keeping everything else.
    fn replace_pending(&mut self, profile_id: &str, queue: Vec<StoredUpdate>) {
        self.updates.retain(|u| !u.is_pending_for(profile_id));
        self.updates.extend(queue);
    }

    fn update_index(&self, id: &str) -> Result<usize, ApiFailure> {
        self.updates
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| ApiFailure::not_found("update"))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    token: Arc<str>,
}

/// JSON error body in the shape the real service uses.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: u16,
    message: String,
}

impl ApiFailure {
    fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: 404,
            message: format!("{what} not found"),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: 1004,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({"success": false, "code": self.code, "message": self.message});
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiFailure>;
type FormPairs = Vec<(String, String)>;

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::seeded())),
        token: Arc::from(token),
    };
    Router::new()
        .route("/1/user.json", get(get_user))
        .route("/1/profiles.json", get(list_profiles))
        .route("/1/profiles/{id}", get(get_profile))
        .route("/1/profiles/{id}/schedules.json", get(get_schedules))
        .route("/1/profiles/{id}/schedules/update.json", post(update_schedules))
        .route("/1/profiles/{id}/updates/pending.json", get(pending_updates))
        .route("/1/profiles/{id}/updates/sent.json", get(sent_updates))
        .route("/1/profiles/{id}/updates/reorder.json", post(reorder_updates))
        .route("/1/profiles/{id}/updates/shuffle.json", post(shuffle_updates))
        .route("/1/updates/create.json", post(create_update))
        .route("/1/updates/{id}", get(get_update))
        .route("/1/updates/{id}/interactions.json", get(update_interactions))
        .route("/1/updates/{id}/update.json", post(edit_update))
        .route("/1/updates/{id}/share.json", post(share_update))
        .route("/1/updates/{id}/destroy.json", post(destroy_update))
        .route("/1/updates/{id}/move_to_top.json", post(move_to_top))
        .route("/1/links/shares.json", get(link_shares))
        .route("/1/info/configuration.json", get(configuration))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_token(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

/// Accept `Authorization: Bearer <token>` or `?access_token=<token>`.
async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let header_ok = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    let query_ok = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(params)| params.get("access_token").cloned())
        .is_some_and(|t| t.as_str() == &*state.token);

    if !(header_ok || query_ok) {
        debug!(uri = %request.uri(), "rejecting unauthenticated request");
        return ApiFailure {
            status: StatusCode::UNAUTHORIZED,
            code: 401,
            message: "OAuth token is missing or invalid".to_string(),
        }
        .into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Form helpers for bracket-notation bodies
// ---------------------------------------------------------------------------

fn field<'a>(form: &'a FormPairs, key: &str) -> Option<&'a str> {
    form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn flag(form: &FormPairs, key: &str) -> Option<bool> {
    field(form, key).map(|v| v == "1" || v == "true")
}

/// Values of `prefix[0]`, `prefix[1]`, ... (or `prefix[]`) in body order.
fn list(form: &FormPairs, prefix: &str) -> Vec<String> {
    form.iter()
        .filter(|(k, _)| {
            k.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('['))
                .and_then(|rest| rest.strip_suffix(']'))
                .is_some_and(|index| index.chars().all(|c| c.is_ascii_digit()))
        })
        .map(|(_, v)| v.clone())
        .collect()
}

/// Entries of `prefix[name]` as a map.
fn map(form: &FormPairs, prefix: &str) -> BTreeMap<String, String> {
    form.iter()
        .filter_map(|(k, v)| {
            let name = k.strip_prefix(prefix)?.strip_prefix('[')?.strip_suffix(']')?;
            Some((name.to_string(), v.clone()))
        })
        .collect()
}

fn json_id(segment: &str) -> Result<&str, ApiFailure> {
    segment
        .strip_suffix(".json")
        .ok_or_else(|| ApiFailure::not_found("resource"))
}

fn new_update_id() -> String {
    Uuid::new_v4().simple().to_string()[..24].to_string()
}

// ---------------------------------------------------------------------------
// User, profiles and schedules
// ---------------------------------------------------------------------------

async fn get_user() -> Json<Value> {
    Json(json!({
        "id": "4f0c0a06512f7ef214000000",
        "plan": "free",
        "timezone": "Europe/London",
    }))
}

async fn list_profiles(State(state): State<AppState>) -> Json<Vec<Profile>> {
    Json(state.db.read().await.profiles.clone())
}

async fn get_profile(State(state): State<AppState>, Path(segment): Path<String>) -> Result<Json<Profile>, ApiFailure> {
    let id = json_id(&segment)?;
    let store = state.db.read().await;
    Ok(Json(store.profile(id)?.clone()))
}

async fn get_schedules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScheduleRecord>>, ApiFailure> {
    let store = state.db.read().await;
    Ok(Json(store.profile(&id)?.schedules.clone()))
}

async fn update_schedules(State(state): State<AppState>, Path(id): Path<String>, Form(form): Form<FormPairs>) -> ApiResult {
    let mut schedules = Vec::new();
    loop {
        let index = schedules.len();
        let days = list(&form, &format!("schedules[{index}][days]"));
        if days.is_empty() {
            break;
        }
        let times = list(&form, &format!("schedules[{index}][times]"));
        schedules.push(ScheduleRecord { days, times });
    }
    if schedules.is_empty() {
        return Err(ApiFailure::bad_request("schedules are required"));
    }

    let mut store = state.db.write().await;
    store.profile_mut(&id)?.schedules = schedules;
    info!(profile = %id, "schedules updated");
    Ok(Json(json!({"success": true, "message": "Schedules updated"})))
}

// ---------------------------------------------------------------------------
// Queue listings
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<usize>,
    pub count: Option<usize>,
    pub since: Option<i64>,
    pub utc: Option<String>,
    pub event: Option<String>,
}

fn paginate(updates: Vec<StoredUpdate>, query: &ListingQuery) -> Value {
    let total = updates.len();
    let count = query.count.unwrap_or(DEFAULT_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let items: Vec<StoredUpdate> = updates
        .into_iter()
        .skip((page - 1).saturating_mul(count))
        .take(count)
        .collect();
    json!({"total": total, "updates": items})
}

async fn pending_updates(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> ApiResult {
    let store = state.db.read().await;
    store.profile(&id)?;
    Ok(Json(paginate(store.pending(&id), &query)))
}

async fn sent_updates(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> ApiResult {
    let store = state.db.read().await;
    store.profile(&id)?;
    let sent = store
        .updates
        .iter()
        .filter(|u| u.profile_id == id && u.status == "sent")
        .cloned()
        .collect();
    Ok(Json(paginate(sent, &query)))
}

async fn reorder_updates(State(state): State<AppState>, Path(id): Path<String>, Form(form): Form<FormPairs>) -> ApiResult {
    let order = list(&form, "order");
    let offset: usize = field(&form, "offset").and_then(|o| o.parse().ok()).unwrap_or(0);

    let mut store = state.db.write().await;
    store.profile(&id)?;
    let (mut ordered, mut rest): (Vec<StoredUpdate>, Vec<StoredUpdate>) =
        store.pending(&id).into_iter().partition(|u| order.contains(&u.id));
    ordered.sort_by_key(|u| order.iter().position(|o| *o == u.id));

    let split = offset.min(rest.len());
    let tail = rest.split_off(split);
    let queue: Vec<StoredUpdate> = rest.into_iter().chain(ordered).chain(tail).collect();
    store.replace_pending(&id, queue.clone());
    Ok(Json(json!({"success": true, "updates": queue})))
}

/// Reverses the first `count` queued updates; deterministic so callers can
/// assert on the result.
async fn shuffle_updates(State(state): State<AppState>, Path(id): Path<String>, Form(form): Form<FormPairs>) -> ApiResult {
    let mut store = state.db.write().await;
    store.profile(&id)?;
    let mut queue = store.pending(&id);
    let count = field(&form, "count")
        .and_then(|c| c.parse().ok())
        .unwrap_or(queue.len())
        .min(queue.len());
    queue[..count].reverse();
    store.replace_pending(&id, queue.clone());
    Ok(Json(json!({"success": true, "updates": queue})))
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

async fn create_update(State(state): State<AppState>, Form(form): Form<FormPairs>) -> ApiResult {
    let profile_ids = list(&form, "profile_ids");
    if profile_ids.is_empty() {
        return Err(ApiFailure::bad_request("at least one profile_id is required"));
    }
    let now = flag(&form, "now").unwrap_or(false);
    let top = flag(&form, "top").unwrap_or(false);

    let mut store = state.db.write().await;
    // Unknown profile ids are ignored, like the real service does.
    let targets: Vec<String> = profile_ids
        .iter()
        .filter(|id| store.profile(id).is_ok())
        .cloned()
        .collect();
    let mut created = Vec::new();
    for profile_id in &targets {
        let update = StoredUpdate {
            id: new_update_id(),
            profile_id: profile_id.clone(),
            text: field(&form, "text").unwrap_or_default().to_string(),
            status: if now { "sent" } else { "buffer" }.to_string(),
            shorten: flag(&form, "shorten").unwrap_or(true),
            scheduled_at: field(&form, "scheduled_at").map(str::to_string),
            media: map(&form, "media"),
        };
        if top && !now {
            let mut queue = store.pending(profile_id);
            queue.insert(0, update.clone());
            store.replace_pending(profile_id, queue);
        } else {
            store.updates.push(update.clone());
        }
        created.push(update);
    }

    info!(count = created.len(), "updates created");
    let buffer_count: usize = profile_ids.iter().map(|id| store.pending(id).len()).sum();
    Ok(Json(json!({"success": true, "buffer_count": buffer_count, "updates": created})))
}

async fn get_update(State(state): State<AppState>, Path(segment): Path<String>) -> Result<Json<StoredUpdate>, ApiFailure> {
    let id = json_id(&segment)?;
    let store = state.db.read().await;
    let index = store.update_index(id)?;
    Ok(Json(store.updates[index].clone()))
}

async fn update_interactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> ApiResult {
    let store = state.db.read().await;
    store.update_index(&id)?;
    Ok(Json(json!({"total": 0, "event": query.event, "interactions": []})))
}

async fn edit_update(State(state): State<AppState>, Path(id): Path<String>, Form(form): Form<FormPairs>) -> ApiResult {
    let mut store = state.db.write().await;
    let index = store.update_index(&id)?;
    let update = &mut store.updates[index];
    if let Some(text) = field(&form, "text") {
        update.text = text.to_string();
    }
    let media = map(&form, "media");
    if !media.is_empty() {
        update.media = media;
    }
    if let Some(at) = field(&form, "scheduled_at") {
        update.scheduled_at = Some(at.to_string());
    }
    if flag(&form, "now").unwrap_or(false) {
        update.status = "sent".to_string();
    }
    Ok(Json(json!({"success": true, "update": update.clone()})))
}

async fn share_update(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let mut store = state.db.write().await;
    let index = store.update_index(&id)?;
    store.updates[index].status = "sent".to_string();
    Ok(Json(json!({"success": true})))
}

async fn destroy_update(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let mut store = state.db.write().await;
    let index = store.update_index(&id)?;
    store.updates.remove(index);
    info!(update = %id, "update destroyed");
    Ok(Json(json!({"success": true})))
}

async fn move_to_top(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let mut store = state.db.write().await;
    let index = store.update_index(&id)?;
    let update = store.updates[index].clone();
    if update.status != "buffer" {
        return Err(ApiFailure::bad_request("only queued updates can be moved"));
    }
    let mut queue: Vec<StoredUpdate> = store
        .pending(&update.profile_id)
        .into_iter()
        .filter(|u| u.id != update.id)
        .collect();
    queue.insert(0, update.clone());
    store.replace_pending(&update.profile_id, queue);
    Ok(Json(json!({"success": true, "update": update})))
}

// ---------------------------------------------------------------------------
// Links and configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    pub url: String,
}

async fn link_shares(State(state): State<AppState>, Query(query): Query<LinkQuery>) -> Json<Value> {
    let store = state.db.read().await;
    let shares = store
        .updates
        .iter()
        .filter(|u| u.media.get("link") == Some(&query.url))
        .count();
    Json(json!({"shares": shares}))
}

async fn configuration() -> Json<Value> {
    Json(json!({
        "services": {
            "twitter": {"types": {"profile": {"name": "Twitter"}}, "character_limit": 280},
            "facebook": {"types": {"profile": {"name": "Facebook"}}, "character_limit": 5000},
        },
        "media": {"picture_size_max": 5242880},
    }))
}
