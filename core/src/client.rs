//! Request builders and dispatch for the Buffer API.
//!
//! # Design
//! `BufferClient` holds the base URL, one authorization strategy and one
//! injected transport, and carries no mutable state between calls. Each
//! remote operation is split into a `build_*` method that produces an
//! unauthorized `HttpRequest` and a public method that authorizes it, runs
//! it through the transport and decodes the JSON body. The `build_*` half
//! is deterministic and never touches the network, so validation failures
//! always surface before any request is sent.

use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::Authorization;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::payload::{
    self, InteractionsQuery, LinkSharesParams, ListingParams, UpdatesQuery,
};
use crate::schedule::Schedule;
use crate::transport::HttpTransport;
use crate::types::OneOrMany;
use crate::update::Update;

pub const DEFAULT_BASE_URL: &str = "https://api.bufferapp.com/1/";

/// Client for the Buffer v1 REST API.
#[derive(Debug)]
pub struct BufferClient<T> {
    base_url: String,
    auth: Box<dyn Authorization>,
    transport: T,
}

impl<T: HttpTransport> BufferClient<T> {
    pub fn new(auth: impl Authorization + 'static, transport: T) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, auth, transport)
    }

    /// Point the client at another deployment, e.g. a local mock server.
    pub fn with_base_url(base_url: &str, auth: impl Authorization + 'static, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Box::new(auth),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn url_with_query(&self, path: &str, params: &impl serde::Serialize) -> Result<String, ApiError> {
        let query = payload::encode_form(params)?;
        if query.is_empty() {
            Ok(self.url(path))
        } else {
            Ok(format!("{}?{query}", self.url(path)))
        }
    }

    fn form_post(&self, path: &str, body: &impl serde::Serialize) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::post_form(self.url(path), payload::encode_form(body)?))
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get_user(&self) -> HttpRequest {
        HttpRequest::get(self.url("user.json"))
    }

    pub fn build_get_profiles(&self) -> HttpRequest {
        HttpRequest::get(self.url("profiles.json"))
    }

    pub fn build_get_profile(&self, id: &str) -> HttpRequest {
        HttpRequest::get(self.url(&format!("profiles/{id}.json")))
    }

    pub fn build_get_profile_schedules(&self, id: &str) -> HttpRequest {
        HttpRequest::get(self.url(&format!("profiles/{id}/schedules.json")))
    }

    pub fn build_update_profile_schedules(
        &self,
        id: &str,
        schedules: OneOrMany<Schedule>,
    ) -> Result<HttpRequest, ApiError> {
        let body = payload::profile_schedules_payload(schedules)?;
        self.form_post(&format!("profiles/{id}/schedules/update.json"), &body)
    }

    pub fn build_get_update(&self, id: &str) -> HttpRequest {
        HttpRequest::get(self.url(&format!("updates/{id}.json")))
    }

    pub fn build_get_profile_pending_updates(
        &self,
        id: &str,
        query: &UpdatesQuery,
    ) -> Result<HttpRequest, ApiError> {
        let params: ListingParams = payload::updates_query(query);
        let url = self.url_with_query(&format!("profiles/{id}/updates/pending.json"), &params)?;
        Ok(HttpRequest::get(url))
    }

    pub fn build_get_profile_sent_updates(
        &self,
        id: &str,
        query: &UpdatesQuery,
    ) -> Result<HttpRequest, ApiError> {
        let params = payload::updates_query(query);
        let url = self.url_with_query(&format!("profiles/{id}/updates/sent.json"), &params)?;
        Ok(HttpRequest::get(url))
    }

    pub fn build_get_update_interactions(
        &self,
        id: &str,
        query: &InteractionsQuery,
    ) -> Result<HttpRequest, ApiError> {
        let params = payload::interactions_query(query);
        let url = self.url_with_query(&format!("updates/{id}/interactions.json"), &params)?;
        Ok(HttpRequest::get(url))
    }

    pub fn build_reorder_profile_updates(
        &self,
        id: &str,
        order: OneOrMany<String>,
        offset: Option<i64>,
        utc: bool,
    ) -> Result<HttpRequest, ApiError> {
        let body = payload::reorder_payload(order, offset, utc);
        self.form_post(&format!("profiles/{id}/updates/reorder.json"), &body)
    }

    pub fn build_shuffle_profile_updates(
        &self,
        id: &str,
        count: Option<u32>,
        utc: bool,
    ) -> Result<HttpRequest, ApiError> {
        let body = payload::shuffle_payload(count, utc);
        self.form_post(&format!("profiles/{id}/updates/shuffle.json"), &body)
    }

    pub fn build_create_update(&self, update: &Update) -> Result<HttpRequest, ApiError> {
        self.form_post("updates/create.json", &payload::create_update_payload(update))
    }

    pub fn build_edit_update(&self, id: &str, update: &Update) -> Result<HttpRequest, ApiError> {
        self.form_post(&format!("updates/{id}/update.json"), &payload::edit_update_payload(update))
    }

    pub fn build_share_update(&self, id: &str) -> HttpRequest {
        HttpRequest::post_empty(self.url(&format!("updates/{id}/share.json")))
    }

    pub fn build_destroy_update(&self, id: &str) -> HttpRequest {
        HttpRequest::post_empty(self.url(&format!("updates/{id}/destroy.json")))
    }

    pub fn build_move_update_to_top(&self, id: &str) -> HttpRequest {
        HttpRequest::post_empty(self.url(&format!("updates/{id}/move_to_top.json")))
    }

    pub fn build_get_link_shares(&self, url: &str) -> Result<HttpRequest, ApiError> {
        let url = self.url_with_query("links/shares.json", &LinkSharesParams { url })?;
        Ok(HttpRequest::get(url))
    }

    pub fn build_get_configuration_info(&self) -> HttpRequest {
        HttpRequest::get(self.url("info/configuration.json"))
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// The authenticated user.
    pub fn get_user(&self) -> Result<Value, ApiError> {
        self.send(self.build_get_user())
    }

    /// Social media profiles connected to the account.
    pub fn get_profiles(&self) -> Result<Value, ApiError> {
        self.send(self.build_get_profiles())
    }

    pub fn get_profile(&self, id: &str) -> Result<Value, ApiError> {
        self.send(self.build_get_profile(id))
    }

    /// Posting schedules of a profile.
    pub fn get_profile_schedules(&self, id: &str) -> Result<Value, ApiError> {
        self.send(self.build_get_profile_schedules(id))
    }

    /// Replace the posting schedule of a profile.
    ///
    /// Only a single `Schedule` is supported; passing a `Vec` fails with
    /// `ValidationError::MultipleSchedulesNotImplemented` without sending
    /// anything.
    pub fn update_profile_schedules(
        &self,
        id: &str,
        schedules: impl Into<OneOrMany<Schedule>>,
    ) -> Result<Value, ApiError> {
        self.send(self.build_update_profile_schedules(id, schedules.into())?)
    }

    pub fn get_update(&self, id: &str) -> Result<Value, ApiError> {
        self.send(self.build_get_update(id))
    }

    /// Updates currently queued for a profile.
    pub fn get_profile_pending_updates(&self, id: &str, query: &UpdatesQuery) -> Result<Value, ApiError> {
        self.send(self.build_get_profile_pending_updates(id, query)?)
    }

    /// Updates already sent from a profile's queue.
    pub fn get_profile_sent_updates(&self, id: &str, query: &UpdatesQuery) -> Result<Value, ApiError> {
        self.send(self.build_get_profile_sent_updates(id, query)?)
    }

    /// Individual interactions (retweets, likes, ...) with an update.
    pub fn get_update_interactions(&self, id: &str, query: &InteractionsQuery) -> Result<Value, ApiError> {
        self.send(self.build_get_update_interactions(id, query)?)
    }

    /// Set the order in which queued updates go out.
    pub fn reorder_profile_updates(
        &self,
        id: &str,
        order: impl Into<OneOrMany<String>>,
        offset: Option<i64>,
        utc: bool,
    ) -> Result<Value, ApiError> {
        self.send(self.build_reorder_profile_updates(id, order.into(), offset, utc)?)
    }

    /// Randomize the order of queued updates.
    pub fn shuffle_profile_updates(&self, id: &str, count: Option<u32>, utc: bool) -> Result<Value, ApiError> {
        self.send(self.build_shuffle_profile_updates(id, count, utc)?)
    }

    pub fn create_update(&self, update: &Update) -> Result<Value, ApiError> {
        self.send(self.build_create_update(update)?)
    }

    /// Edit an existing update. Profiles, `shorten` and `top` are not sent.
    pub fn edit_update(&self, id: &str, update: &Update) -> Result<Value, ApiError> {
        self.send(self.build_edit_update(id, update)?)
    }

    /// Share a queued update immediately.
    pub fn share_update(&self, id: &str) -> Result<Value, ApiError> {
        self.send(self.build_share_update(id))
    }

    /// Permanently delete an update.
    pub fn destroy_update(&self, id: &str) -> Result<Value, ApiError> {
        self.send(self.build_destroy_update(id))
    }

    pub fn move_update_to_top(&self, id: &str) -> Result<Value, ApiError> {
        self.send(self.build_move_update_to_top(id))
    }

    /// How many times a link has been shared through Buffer.
    pub fn get_link_shares(&self, url: &str) -> Result<Value, ApiError> {
        self.send(self.build_get_link_shares(url)?)
    }

    /// Supported services and their limits.
    pub fn get_configuration_info(&self) -> Result<Value, ApiError> {
        self.send(self.build_get_configuration_info())
    }

    /// Authorize, execute and decode one request.
    pub fn send(&self, request: HttpRequest) -> Result<Value, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending Buffer API request");
        let request = self.auth.attach(request);
        let response = self.transport.execute(request).inspect_err(|e| {
            warn!(error = %e, "Buffer API transport failure");
        })?;
        debug!(status = response.status, "received Buffer API response");
        Ok(parse_response(response)?)
    }
}

#[cfg(feature = "ureq")]
impl BufferClient<crate::transport::UreqTransport> {
    /// Bearer-token client over `ureq`, configured from `config`.
    pub fn from_config(config: &crate::config::ClientConfig) -> Self {
        let transport = match config.timeout {
            Some(timeout) => crate::transport::UreqTransport::with_timeout(timeout),
            None => crate::transport::UreqTransport::new(),
        };
        Self::with_base_url(
            &config.base_url,
            crate::auth::TokenAuthorization::new(config.access_token.clone()),
            transport,
        )
    }
}

/// Map a raw response onto the decoded JSON body or a transport error.
pub fn parse_response(response: HttpResponse) -> Result<Value, TransportError> {
    if response.status == 404 {
        warn!(status = response.status, "Buffer API resource not found");
        return Err(TransportError::NotFound);
    }
    if !response.is_success() {
        warn!(status = response.status, "Buffer API returned an error status");
        return Err(TransportError::Http {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| TransportError::Deserialization(e.to_string()))
}
