// DNS host record helpers
//
// `record:host` lookups, creation and partial updates built on the
// dispatcher. Reads interpret the response; writes return it unmodified
// like the dispatcher does.

use std::net::IpAddr;

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;
use crate::params::Params;
use crate::session::Session;

const HOST: &str = "record:host";
const HOST_IPV4ADDR: &str = "record:host_ipv4addr";
const DEFAULT_VIEW: &str = "default";

/// One entry of a host's `ipv4addrs` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostAddress {
    pub ipv4addr: String,
}

/// A host record to create.
#[derive(Debug, Clone, Serialize)]
pub struct NewHost {
    pub name: String,
    pub ipv4addrs: Vec<HostAddress>,
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewHost {
    /// A host in the default DNS view with the given addresses.
    pub fn new(name: impl Into<String>, addresses: &[&str]) -> Result<Self, Error> {
        Ok(Self {
            name: name.into(),
            ipv4addrs: host_addresses(addresses)?,
            view: DEFAULT_VIEW.into(),
            ttl: None,
            comment: None,
        })
    }

    /// Zero means "inherit", so it is not sent.
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = (ttl > 0).then_some(ttl);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = (!comment.is_empty()).then_some(comment);
        self
    }

    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = view.into();
        self
    }
}

/// Canonicalize IP strings into the `ipv4addrs` body format.
pub fn host_addresses(addresses: &[&str]) -> Result<Vec<HostAddress>, Error> {
    addresses
        .iter()
        .map(|raw| {
            let ip: IpAddr = raw.trim().parse().map_err(|e| Error::Validation {
                field: "ipv4addr".into(),
                reason: format!("{raw:?}: {e}"),
            })?;
            Ok(HostAddress {
                ipv4addr: ip.to_string(),
            })
        })
        .collect()
}

fn canonical_ip(raw: &str) -> Result<String, Error> {
    let mut parsed = host_addresses(&[raw])?;
    Ok(parsed.pop().map(|a| a.ipv4addr).unwrap_or_default())
}

impl Session {
    /// `true` if no host record in `network_view` holds `ip`.
    ///
    /// Only `record:host` addresses are checked; an `A` record on the
    /// same address is not detected.
    pub async fn is_ip_available(&mut self, ip: &str, network_view: &str) -> Result<bool, Error> {
        let params = Params::new()
            .with("ipv4addr", canonical_ip(ip)?)
            .with("network_view", network_view);
        debug!(ip, network_view, "checking host address");

        let resp = self.get(HOST_IPV4ADDR, &params).await?;
        let matches: Vec<Value> = json_body(resp).await?;
        Ok(matches.is_empty())
    }

    /// Read a host record, optionally limited to `fields`
    /// (comma-separated `_return_fields`). `None` on any non-200.
    pub async fn read_host(&mut self, reference: &str, fields: &str) -> Result<Option<Value>, Error> {
        let mut params = Params::new();
        if !fields.is_empty() {
            params.insert("_return_fields", fields);
        }
        let resp = self.get_by_reference(reference, &params).await?;
        if resp.status() != StatusCode::OK {
            debug!(reference, status = %resp.status(), "host read failed");
            return Ok(None);
        }
        json_body(resp).await.map(Some)
    }

    /// The IPv4 addresses currently assigned to a host record.
    pub async fn read_host_addresses(&mut self, reference: &str) -> Result<Vec<String>, Error> {
        let params = Params::new().with("_return_fields", "ipv4addrs");
        let resp = self.get_by_reference(reference, &params).await?;
        if resp.status() != StatusCode::OK {
            return Ok(Vec::new());
        }
        let host: Value = json_body(resp).await?;
        Ok(host
            .get("ipv4addrs")
            .and_then(Value::as_array)
            .map(|addrs| {
                addrs
                    .iter()
                    .map(|a| {
                        a.get("ipv4addr")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_owned()
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Create a host record (`POST record:host`).
    pub async fn create_host(&mut self, host: &NewHost) -> Result<Response, Error> {
        debug!(name = %host.name, "creating host record");
        self.post(HOST, host, &Params::new(), HeaderMap::new()).await
    }

    /// Search for a host by FQDN. The body holds zero or one records.
    pub async fn find_host(&mut self, name: &str, view: &str) -> Result<Response, Error> {
        let params = Params::new().with("name", name).with("view", view);
        self.get(HOST, &params).await
    }

    /// Replace the address list of a host record.
    pub async fn update_host_addresses(
        &mut self,
        reference: &str,
        addresses: &[&str],
    ) -> Result<Response, Error> {
        let body = json!({ "ipv4addrs": host_addresses(addresses)? });
        self.put(reference, &body).await
    }

    pub async fn update_host_ttl(&mut self, reference: &str, ttl: u32) -> Result<Response, Error> {
        self.put(reference, &json!({ "ttl": ttl })).await
    }

    pub async fn update_host_comment(
        &mut self,
        reference: &str,
        comment: &str,
    ) -> Result<Response, Error> {
        self.put(reference, &json!({ "comment": comment })).await
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_canonicalized() {
        let addrs = host_addresses(&["10.32.15.30", " 10.32.15.31 "]).unwrap();
        assert_eq!(
            addrs,
            vec![
                HostAddress {
                    ipv4addr: "10.32.15.30".into()
                },
                HostAddress {
                    ipv4addr: "10.32.15.31".into()
                },
            ]
        );
    }

    #[test]
    fn invalid_address_is_rejected() {
        assert!(matches!(
            host_addresses(&["10.32.15.300"]),
            Err(Error::Validation { .. })
        ));
        assert!(host_addresses(&["host.example.com"]).is_err());
    }

    #[test]
    fn new_host_omits_unset_fields() {
        let host = NewHost::new("ddi-host1.example.com", &["10.32.15.30"])
            .unwrap()
            .ttl(0)
            .comment("");
        let body = serde_json::to_value(&host).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "ddi-host1.example.com",
                "ipv4addrs": [{ "ipv4addr": "10.32.15.30" }],
                "view": "default",
            })
        );
    }

    #[test]
    fn new_host_with_ttl_and_comment() {
        let host = NewHost::new("ddi-host1.example.com", &["10.32.15.30"])
            .unwrap()
            .ttl(600)
            .comment("DDI Host 1")
            .view("internal");
        let body = serde_json::to_value(&host).unwrap();
        assert_eq!(body["ttl"], 600);
        assert_eq!(body["comment"], "DDI Host 1");
        assert_eq!(body["view"], "internal");
    }
}
