use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_token, StoredUpdate, DEFAULT_TOKEN, FACEBOOK_PROFILE_ID, TWITTER_PROFILE_ID};
use serde_json::Value;
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
        .body(String::new())
        .unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn empty_post(uri: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
        .body(String::new())
        .unwrap()
}

type App = axum::routing::RouterIntoService<String>;

async fn call(app: &mut App, request: Request<String>) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

async fn create(app: &mut App, text: &str) -> StoredUpdate {
    let body = format!("text={text}&profile_ids%5B0%5D={TWITTER_PROFILE_ID}&shorten=1&now=0&top=0");
    let resp = call(app, form_post("/1/updates/create.json", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = body_json(resp).await;
    serde_json::from_value(created["updates"][0].clone()).unwrap()
}

async fn pending_ids(app: &mut App) -> Vec<String> {
    let resp = call(app, get(&format!("/1/profiles/{TWITTER_PROFILE_ID}/updates/pending.json"))).await;
    let listing: Value = body_json(resp).await;
    listing["updates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect()
}

// --- auth ---

#[tokio::test]
async fn missing_token_is_rejected() {
    let resp = app()
        .oneshot(Request::builder().uri("/1/user.json").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let resp = app_with_token("other")
        .oneshot(get("/1/user.json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn query_token_is_accepted() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(format!("/1/profiles.json?access_token={DEFAULT_TOKEN}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- profiles and schedules ---

#[tokio::test]
async fn profiles_are_seeded() {
    let resp = app().oneshot(get("/1/profiles.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let profiles: Vec<Value> = body_json(resp).await;
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[1]["id"], FACEBOOK_PROFILE_ID);
}

#[tokio::test]
async fn profile_lookup_by_id() {
    let resp = app()
        .oneshot(get(&format!("/1/profiles/{TWITTER_PROFILE_ID}.json")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let profile: Value = body_json(resp).await;
    assert_eq!(profile["service"], "twitter");

    let resp = app().oneshot(get("/1/profiles/nope.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedules_round_trip_through_form_body() {
    let mut app = app().into_service();
    let body = "schedules%5B0%5D%5Bdays%5D%5B0%5D=sat&schedules%5B0%5D%5Bdays%5D%5B1%5D=sun\
                &schedules%5B0%5D%5Btimes%5D%5B0%5D=10%3A30";
    let uri = format!("/1/profiles/{TWITTER_PROFILE_ID}/schedules/update.json");
    let resp = call(&mut app, form_post(&uri, body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, get(&format!("/1/profiles/{TWITTER_PROFILE_ID}/schedules.json"))).await;
    let schedules: Value = body_json(resp).await;
    assert_eq!(schedules, serde_json::json!([{"days": ["sat", "sun"], "times": ["10:30"]}]));
}

#[tokio::test]
async fn empty_schedule_update_is_a_bad_request() {
    let uri = format!("/1/profiles/{TWITTER_PROFILE_ID}/schedules/update.json");
    let resp = app().oneshot(form_post(&uri, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- updates ---

#[tokio::test]
async fn create_requires_profile_ids() {
    let resp = app()
        .oneshot(form_post("/1/updates/create.json", "text=hi"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_ignores_unknown_profiles_and_keeps_media() {
    let body = format!(
        "text=Lorem+ipsum&profile_ids%5B0%5D=bogus&profile_ids%5B1%5D={FACEBOOK_PROFILE_ID}\
         &shorten=1&now=0&top=0&media%5Blink%5D=http%3A%2F%2Fexample.com&scheduled_at=2013-12-23T02%3A00%3A00%2B0000"
    );
    let resp = app().oneshot(form_post("/1/updates/create.json", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let created: Value = body_json(resp).await;
    let updates = created["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["profile_id"], FACEBOOK_PROFILE_ID);
    assert_eq!(updates[0]["text"], "Lorem ipsum");
    assert_eq!(updates[0]["media"]["link"], "http://example.com");
    assert_eq!(updates[0]["scheduled_at"], "2013-12-23T02:00:00+0000");
    assert_eq!(created["buffer_count"], 1);
}

#[tokio::test]
async fn now_updates_go_straight_to_sent() {
    let mut app = app().into_service();
    let body = format!("text=now&profile_ids%5B0%5D={TWITTER_PROFILE_ID}&now=1");
    let resp = call(&mut app, form_post("/1/updates/create.json", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(pending_ids(&mut app).await.is_empty());
    let resp = call(&mut app, get(&format!("/1/profiles/{TWITTER_PROFILE_ID}/updates/sent.json"))).await;
    let sent: Value = body_json(resp).await;
    assert_eq!(sent["total"], 1);
}

#[tokio::test]
async fn queue_operations() {
    let mut app = app().into_service();
    let a = create(&mut app, "a").await;
    let b = create(&mut app, "b").await;
    let c = create(&mut app, "c").await;
    assert_eq!(pending_ids(&mut app).await, [a.id.as_str(), b.id.as_str(), c.id.as_str()]);

    // pagination
    let resp = call(
        &mut app,
        get(&format!("/1/profiles/{TWITTER_PROFILE_ID}/updates/pending.json?page=2&count=2")),
    )
    .await;
    let page: Value = body_json(resp).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["updates"][0]["id"], c.id.as_str());

    // reorder
    let uri = format!("/1/profiles/{TWITTER_PROFILE_ID}/updates/reorder.json");
    let body = format!("order%5B0%5D={}&order%5B1%5D={}", c.id, a.id);
    let resp = call(&mut app, form_post(&uri, &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(pending_ids(&mut app).await, [c.id.as_str(), a.id.as_str(), b.id.as_str()]);

    // reorder with offset
    let body = format!("order%5B0%5D={}&offset=1", b.id);
    call(&mut app, form_post(&uri, &body)).await;
    assert_eq!(pending_ids(&mut app).await, [c.id.as_str(), b.id.as_str(), a.id.as_str()]);

    // shuffle reverses the first `count`
    let uri = format!("/1/profiles/{TWITTER_PROFILE_ID}/updates/shuffle.json");
    call(&mut app, form_post(&uri, "count=2")).await;
    assert_eq!(pending_ids(&mut app).await, [b.id.as_str(), c.id.as_str(), a.id.as_str()]);

    // move to top
    let resp = call(&mut app, empty_post(&format!("/1/updates/{}/move_to_top.json", a.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(pending_ids(&mut app).await, [a.id.as_str(), b.id.as_str(), c.id.as_str()]);

    // share
    let resp = call(&mut app, empty_post(&format!("/1/updates/{}/share.json", a.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(pending_ids(&mut app).await, [b.id.as_str(), c.id.as_str()]);

    // destroy
    let resp = call(&mut app, empty_post(&format!("/1/updates/{}/destroy.json", b.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, get(&format!("/1/updates/{}.json", b.id))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_changes_only_sent_fields() {
    let mut app = app().into_service();
    let created = create(&mut app, "before").await;

    let uri = format!("/1/updates/{}/update.json", created.id);
    let resp = call(&mut app, form_post(&uri, "text=after&now=0")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, get(&format!("/1/updates/{}.json", created.id))).await;
    let fetched: StoredUpdate = body_json(resp).await;
    assert_eq!(fetched.text, "after");
    assert_eq!(fetched.profile_id, TWITTER_PROFILE_ID);
    assert_eq!(fetched.status, "buffer");
}

#[tokio::test]
async fn interactions_and_link_shares() {
    let mut app = app().into_service();
    let created = create(&mut app, "x").await;

    let resp = call(
        &mut app,
        get(&format!("/1/updates/{}/interactions.json?event=likes", created.id)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let interactions: Value = body_json(resp).await;
    assert_eq!(interactions["event"], "likes");

    let resp = call(&mut app, get("/1/links/shares.json?url=http%3A%2F%2Fnowhere.test")).await;
    let shares: Value = body_json(resp).await;
    assert_eq!(shares["shares"], 0);
}

#[tokio::test]
async fn unknown_update_is_not_found() {
    let resp = app().oneshot(get("/1/updates/missing.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 404);

    let resp = app().oneshot(empty_post("/1/updates/missing/share.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configuration_lists_services() {
    let resp = app().oneshot(get("/1/info/configuration.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let config: Value = body_json(resp).await;
    assert!(config["services"]["twitter"].is_object());
}
