// WAPI session and request dispatcher
//
// Owns the base URL, the HTTP client (with its cookie jar) and the schema
// that doubles as the authentication flag. Every CRUD verb goes through
// `guard()` before touching the network and hands the transport response
// back unmodified. Login/logout live in `auth.rs`, paging in `pager.rs`.

use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ResponseInfo, Schema};
use crate::params::Params;
use crate::transport::TransportConfig;

/// An authenticated (or not yet authenticated) connection to a WAPI
/// endpoint such as `https://gm.example.com/wapi/v2.12`.
///
/// One session is one logical user context. All I/O takes `&mut self`,
/// so a session serves one request at a time; share work across tasks by
/// giving each task its own session.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    base_url: Option<Url>,
    schema: Schema,
    last_response: Option<ResponseInfo>,
}

impl Session {
    /// Create a session with no target endpoint yet.
    ///
    /// Call [`initialize`](Self::initialize) before logging in.
    pub fn new(transport: TransportConfig) -> Result<Self, Error> {
        Self::build(None, &transport)
    }

    /// Create a session targeting `base_url`.
    pub fn with_base_url(base_url: &str, transport: TransportConfig) -> Result<Self, Error> {
        Self::build(Some(parse_base_url(base_url)?), &transport)
    }

    fn build(base_url: Option<Url>, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: client_with_jar(transport)?,
            base_url,
            schema: Schema::default(),
            last_response: None,
        })
    }

    /// Set the target endpoint and trust configuration.
    ///
    /// Performs no I/O. Re-targeting discards the current login: the
    /// schema is cleared and the HTTP client is rebuilt with a fresh
    /// cookie jar, since the old auth cookie belongs to the old endpoint.
    pub fn initialize(&mut self, base_url: &str, transport: TransportConfig) -> Result<(), Error> {
        let base_url = parse_base_url(base_url)?;
        let http = client_with_jar(&transport)?;

        if self.is_authenticated() {
            debug!(
                old = ?self.base_url.as_ref().map(Url::as_str),
                new = %base_url,
                "re-initializing session, dropping current login"
            );
        }

        self.http = http;
        self.base_url = Some(base_url);
        self.schema.clear();
        Ok(())
    }

    /// Whether a base URL has been configured.
    pub fn is_initialized(&self) -> bool {
        self.base_url.is_some()
    }

    /// `true` iff the schema retrieved at login is non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.schema.is_empty()
    }

    /// The configured base URL.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The schema document from the last successful login.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Method, URL and status of the most recent HTTP exchange.
    pub fn last_response(&self) -> Option<&ResponseInfo> {
        self.last_response.as_ref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`.
    ///
    /// `path` is an object type (`record:host`), a reference
    /// (`record:host/ZG5z...:name/default`) or a fixed endpoint (`logout`).
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_ref().ok_or(Error::Uninitialized)?;
        let base = base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Guard ────────────────────────────────────────────────────────

    /// Fail fast, before any I/O, unless the session is logged in.
    pub(crate) fn guard(&self) -> Result<(), Error> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request, record it as the last response and return it as-is.
    pub(crate) async fn send(
        &mut self,
        method: Method,
        url: Url,
        builder: RequestBuilder,
    ) -> Result<Response, Error> {
        debug!("{method} {url}");
        let resp = builder.send().await?;
        self.last_response = Some(ResponseInfo {
            method,
            url,
            status: resp.status(),
        });
        Ok(resp)
    }

    // ── Dispatcher ───────────────────────────────────────────────────

    /// `GET {base}/{object_type}` with query parameters.
    ///
    /// Non-2xx statuses are returned, not raised; check `status()`.
    pub async fn get(&mut self, object_type: &str, params: &Params) -> Result<Response, Error> {
        self.guard()?;
        let url = self.url(object_type)?;
        let builder = self.http.get(url.clone()).query(params);
        self.send(Method::GET, url, builder).await
    }

    /// `GET {base}/{reference}`, typically with `_return_fields`.
    pub async fn get_by_reference(
        &mut self,
        reference: &str,
        params: &Params,
    ) -> Result<Response, Error> {
        self.guard()?;
        let url = self.url(reference)?;
        let builder = self.http.get(url.clone()).query(params);
        self.send(Method::GET, url, builder).await
    }

    /// `POST {base}/{object_type}` with a JSON body.
    ///
    /// Creates objects, and calls server-side functions when `params`
    /// carries `_function` (e.g. `fileop?_function=getgriddata`).
    pub async fn post(
        &mut self,
        object_type: &str,
        body: &(impl Serialize + Sync),
        params: &Params,
        headers: HeaderMap,
    ) -> Result<Response, Error> {
        self.guard()?;
        let url = self.url(object_type)?;
        let builder = self
            .http
            .post(url.clone())
            .headers(headers)
            .query(params)
            .json(body);
        self.send(Method::POST, url, builder).await
    }

    /// `PUT {base}/{reference}` with a (partial) JSON body.
    pub async fn put(
        &mut self,
        reference: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Response, Error> {
        self.guard()?;
        let url = self.url(reference)?;
        let builder = self.http.put(url.clone()).json(body);
        self.send(Method::PUT, url, builder).await
    }

    /// `DELETE {base}/{reference}`.
    pub async fn delete(&mut self, reference: &str) -> Result<Response, Error> {
        self.guard()?;
        let url = self.url(reference)?;
        let builder = self.http.delete(url.clone());
        self.send(Method::DELETE, url, builder).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, Error> {
    Ok(Url::parse(raw.trim_end_matches('/'))?)
}

/// Every client gets its own jar so a login never leaks across sessions.
fn client_with_jar(transport: &TransportConfig) -> Result<reqwest::Client, Error> {
    transport.clone().with_cookie_jar().build_client()
}
