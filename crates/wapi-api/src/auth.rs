// Session authentication
//
// Login fetches the schema document with basic credentials; the appliance
// answers with an auth cookie that lands in the session's jar and is
// replayed on every later call. The schema's presence is the login state.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Error;
use crate::session::Session;

/// Schema endpoint, relative to the base URL.
const SCHEMA_PATH: &str = "?_schema";
/// Logout endpoint, relative to the base URL.
const LOGOUT_PATH: &str = "logout";

impl Session {
    /// Log in with API-enabled credentials.
    ///
    /// An existing login is logged out first, so a second call replaces
    /// the first session rather than merging into it. On HTTP 200 the
    /// schema is stored and the session becomes authenticated. Any other
    /// status leaves it unauthenticated without raising; check
    /// [`is_authenticated`](Self::is_authenticated) afterwards.
    pub async fn login(&mut self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.url(SCHEMA_PATH)?;

        if self.is_authenticated() {
            debug!("already logged in, logging out first");
            self.logout().await?;
        }
        self.schema_mut().clear();

        debug!(username, "logging in at {}", url);

        let builder = self
            .http()
            .get(url.clone())
            .basic_auth(username, Some(password.expose_secret()));
        let resp = self.send(Method::GET, url, builder).await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            warn!(%status, username, "login rejected");
            return Ok(());
        }

        let body = resp.text().await?;
        let schema: Map<String, Value> =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))?;
        self.schema_mut().merge(schema);

        debug!(
            version = self.schema().requested_version().unwrap_or("?"),
            authenticated = self.is_authenticated(),
            "login complete"
        );
        Ok(())
    }

    /// End the current session.
    ///
    /// The schema is cleared before the request goes out, so the session
    /// is unauthenticated afterwards even if the transport fails. The
    /// response status is not inspected. Safe to call when logged out.
    pub async fn logout(&mut self) -> Result<(), Error> {
        let url = self.url(LOGOUT_PATH)?;
        self.schema_mut().clear();

        debug!("logging out at {}", url);

        let builder = self.http().post(url.clone());
        let _resp = self.send(Method::POST, url, builder).await?;

        debug!("logout complete");
        Ok(())
    }
}
