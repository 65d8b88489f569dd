//! Payload builders and form encoding.
//!
//! # Design
//! Every write operation and every paginated read has a builder that maps
//! typed inputs to a serializable payload. Optional fields the caller did
//! not supply are skipped during serialization, never sent as null or
//! empty: the service treats an absent field and an empty one differently.
//!
//! Payloads are sent form-encoded. Nested values are flattened with
//! bracket notation (`profile_ids[0]=..`, `media[link]=..`,
//! `schedules[0][days][0]=..`) and booleans become `1`/`0`. Field order on
//! the wire follows struct declaration order.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ValidationError};
use crate::schedule::Schedule;
use crate::types::OneOrMany;
use crate::update::{MediaKey, Update};

/// Interaction kinds accepted by the `event` filter.
pub const INTERACTION_EVENTS: [&str; 12] = [
    "retweet", "retweets", "favorite", "favorites", "like", "likes", "comment", "comments", "mention",
    "mentions", "share", "shares",
];

/// Pagination for pending and sent update listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatesQuery {
    pub page: Option<u32>,
    pub count: Option<u32>,
    /// Unix timestamp; only updates after this instant are returned.
    pub since: Option<i64>,
    /// Return times in UTC instead of the profile's timezone.
    pub utc: bool,
}

impl UpdatesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn since(mut self, since: i64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }
}

/// Pagination and event filter for an update's interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionsQuery {
    pub page: Option<u32>,
    pub count: Option<u32>,
    pub event: Option<String>,
}

impl InteractionsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}

/// Query parameters shared by the listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

pub fn updates_query(query: &UpdatesQuery) -> ListingParams {
    ListingParams {
        page: query.page,
        count: query.count,
        since: query.since,
        utc: query.utc.then_some(true),
        event: None,
    }
}

/// Unrecognized event filters are dropped, not rejected.
pub fn interactions_query(query: &InteractionsQuery) -> ListingParams {
    let event = query.event.as_deref().and_then(|event| {
        if INTERACTION_EVENTS.contains(&event) {
            Some(event.to_string())
        } else {
            debug!(event, "dropping unrecognized interaction event filter");
            None
        }
    });
    ListingParams {
        page: query.page,
        count: query.count,
        since: None,
        utc: None,
        event,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulesPayload {
    pub schedules: Vec<Schedule>,
}

/// Only a single schedule is supported. A sequence, even of one, is
/// refused before anything is sent.
pub fn profile_schedules_payload(
    schedules: OneOrMany<Schedule>,
) -> Result<SchedulesPayload, ValidationError> {
    match schedules {
        OneOrMany::One(schedule) => Ok(SchedulesPayload {
            schedules: vec![schedule],
        }),
        OneOrMany::Many(_) => Err(ValidationError::MultipleSchedulesNotImplemented),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderPayload {
    pub order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc: Option<bool>,
}

pub fn reorder_payload(order: OneOrMany<String>, offset: Option<i64>, utc: bool) -> ReorderPayload {
    ReorderPayload {
        order: order.into_vec(),
        offset,
        utc: utc.then_some(true),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShufflePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc: Option<bool>,
}

pub fn shuffle_payload(count: Option<u32>, utc: bool) -> ShufflePayload {
    ShufflePayload {
        count,
        utc: utc.then_some(true),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateUpdatePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    pub profile_ids: &'a [String],
    pub shorten: bool,
    pub now: bool,
    pub top: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<&'a BTreeMap<MediaKey, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<&'a str>,
}

pub fn create_update_payload(update: &Update) -> CreateUpdatePayload<'_> {
    CreateUpdatePayload {
        text: update.text(),
        profile_ids: update.profiles(),
        shorten: update.shorten(),
        now: update.now(),
        top: update.top(),
        media: non_empty_media(update),
        scheduled_at: update.scheduled_at(),
    }
}

/// Edits never resend `profile_ids`, `shorten` or `top`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditUpdatePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    pub now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<&'a BTreeMap<MediaKey, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<&'a str>,
}

pub fn edit_update_payload(update: &Update) -> EditUpdatePayload<'_> {
    EditUpdatePayload {
        text: update.text(),
        now: update.now(),
        media: non_empty_media(update),
        scheduled_at: update.scheduled_at(),
    }
}

fn non_empty_media(update: &Update) -> Option<&BTreeMap<MediaKey, String>> {
    Some(update.media()).filter(|media| !media.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSharesParams<'a> {
    pub url: &'a str,
}

/// Flatten a payload into ordered key/value pairs using bracket notation.
pub fn to_form_pairs<T: Serialize>(payload: &T) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ApiError::Serialization(
            "form payloads must serialize to a map".to_string(),
        ));
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        flatten(key, value, &mut pairs);
    }
    Ok(pairs)
}

fn flatten(key: String, value: Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key, if b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s)),
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                flatten(format!("{key}[{index}]"), item, out);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields {
                flatten(format!("{key}[{name}]"), item, out);
            }
        }
    }
}

/// Form-encode a payload (`a=1&b%5B0%5D=x`). An empty payload yields "".
pub fn encode_form<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    let pairs = to_form_pairs(payload)?;
    Ok(url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(params: &ListingParams) -> String {
        encode_form(params).unwrap()
    }

    #[test]
    fn updates_query_with_only_count() {
        let params = updates_query(&UpdatesQuery::new().count(5));
        assert_eq!(query(&params), "count=5");
    }

    #[test]
    fn updates_query_with_only_utc() {
        let params = updates_query(&UpdatesQuery::new().utc(true));
        assert_eq!(query(&params), "utc=1");
    }

    #[test]
    fn updates_query_false_utc_is_omitted() {
        let params = updates_query(&UpdatesQuery::new().utc(false));
        assert_eq!(query(&params), "");
    }

    #[test]
    fn updates_query_keeps_field_order() {
        let params = updates_query(&UpdatesQuery::new().utc(true).since(2013).count(1).page(1));
        assert_eq!(query(&params), "page=1&count=1&since=2013&utc=1");
    }

    #[test]
    fn interactions_query_keeps_known_events() {
        for event in INTERACTION_EVENTS {
            let params = interactions_query(&InteractionsQuery::new().event(event));
            assert_eq!(params.event.as_deref(), Some(event));
        }
        let params = interactions_query(&InteractionsQuery::new().page(1).count(1).event("shares"));
        assert_eq!(query(&params), "page=1&count=1&event=shares");
    }

    #[test]
    fn interactions_query_silently_drops_unknown_events() {
        let params = interactions_query(&InteractionsQuery::new().count(3).event("pokes"));
        assert!(params.event.is_none());
        assert_eq!(query(&params), "count=3");

        let params = interactions_query(&InteractionsQuery::new().event("Shares"));
        assert_eq!(query(&params), "");
    }

    #[test]
    fn single_schedule_payload() {
        let schedule = Schedule::with(["mon", "tue"], ["09:00", "17:30"]).unwrap();
        let payload = profile_schedules_payload(schedule.into()).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"schedules": [{"days": ["mon", "tue"], "times": ["09:00", "17:30"]}]})
        );
        assert_eq!(
            encode_form(&payload).unwrap(),
            "schedules%5B0%5D%5Bdays%5D%5B0%5D=mon&schedules%5B0%5D%5Bdays%5D%5B1%5D=tue\
             &schedules%5B0%5D%5Btimes%5D%5B0%5D=09%3A00&schedules%5B0%5D%5Btimes%5D%5B1%5D=17%3A30"
        );
    }

    #[test]
    fn schedule_sequences_are_not_implemented() {
        let two = vec![Schedule::new(), Schedule::new()];
        assert_eq!(
            profile_schedules_payload(two.into()).unwrap_err(),
            ValidationError::MultipleSchedulesNotImplemented
        );
        let one = vec![Schedule::new()];
        assert!(profile_schedules_payload(one.into()).is_err());
    }

    #[test]
    fn reorder_coerces_scalar_order() {
        let payload = reorder_payload("abc".into(), None, false);
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"order": ["abc"]}));
        assert_eq!(encode_form(&payload).unwrap(), "order%5B0%5D=abc");
    }

    #[test]
    fn reorder_includes_offset_and_utc_when_given() {
        let payload = reorder_payload(vec!["a", "b"].into(), Some(0), true);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"order": ["a", "b"], "offset": 0, "utc": true})
        );
    }

    #[test]
    fn shuffle_gating() {
        assert_eq!(encode_form(&shuffle_payload(None, false)).unwrap(), "");
        assert_eq!(encode_form(&shuffle_payload(Some(10), true)).unwrap(), "count=10&utc=1");
    }

    #[test]
    fn create_payload_omits_empty_media_and_schedule() {
        let mut update = Update::new();
        update.set_text("Lorem ipsum").add_profile("p1");
        let value = serde_json::to_value(create_update_payload(&update)).unwrap();
        assert_eq!(
            value,
            json!({"text": "Lorem ipsum", "profile_ids": ["p1"], "shorten": true, "now": false, "top": false})
        );
        assert!(value.get("media").is_none());
        assert!(value.get("scheduled_at").is_none());
    }

    #[test]
    fn create_payload_includes_media_and_schedule_once_set() {
        let mut update = Update::new();
        update.set_text("Lorem ipsum").add_profile("p1");
        update.add_media("link", "http://example.com").unwrap();
        let value = serde_json::to_value(create_update_payload(&update)).unwrap();
        assert_eq!(value["media"], json!({"link": "http://example.com"}));
        assert!(value.get("scheduled_at").is_none());

        update.schedule(1387764000_i64).unwrap();
        let value = serde_json::to_value(create_update_payload(&update)).unwrap();
        assert_eq!(value["scheduled_at"], "2013-12-23T02:00:00+0000");
    }

    #[test]
    fn create_payload_form_encoding() {
        let mut update = Update::new();
        update.set_text("Lorem ipsum").add_profile("p1").add_profile("p2");
        update.add_media("picture", "http://example.com/a.png").unwrap();
        update.add_media("link", "http://example.com").unwrap();
        assert_eq!(
            encode_form(&create_update_payload(&update)).unwrap(),
            "text=Lorem+ipsum&profile_ids%5B0%5D=p1&profile_ids%5B1%5D=p2&shorten=1&now=0&top=0\
             &media%5Blink%5D=http%3A%2F%2Fexample.com&media%5Bpicture%5D=http%3A%2F%2Fexample.com%2Fa.png"
        );
    }

    #[test]
    fn edit_payload_never_resends_profile_fields() {
        let mut update = Update::new();
        update.set_text("Edited").add_profile("p1").set_top(true).set_shorten(false);
        let value = serde_json::to_value(edit_update_payload(&update)).unwrap();
        assert_eq!(value, json!({"text": "Edited", "now": false}));

        update.add_media("description", "d").unwrap();
        update.schedule("2013-12-23T02:00:00Z").unwrap();
        let value = serde_json::to_value(edit_update_payload(&update)).unwrap();
        assert_eq!(
            value,
            json!({
                "text": "Edited",
                "now": false,
                "media": {"description": "d"},
                "scheduled_at": "2013-12-23T02:00:00+0000"
            })
        );
    }

    #[test]
    fn missing_text_is_omitted_not_null() {
        let value = serde_json::to_value(create_update_payload(&Update::new())).unwrap();
        assert!(value.get("text").is_none());
        assert_eq!(encode_form(&create_update_payload(&Update::new())).unwrap(), "shorten=1&now=0&top=0");
    }

    #[test]
    fn link_shares_url_is_escaped() {
        let params = LinkSharesParams {
            url: "http://ipalaus.com",
        };
        assert_eq!(encode_form(&params).unwrap(), "url=http%3A%2F%2Fipalaus.com");
    }

    #[test]
    fn non_map_payloads_are_refused() {
        let err = encode_form(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }
}
