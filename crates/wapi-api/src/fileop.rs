// Grid backup download
//
// The `fileop` object exposes server-side functions selected with
// `_function`. A backup download is three calls: `getgriddata` hands out
// a token and a one-off download URL, the file is fetched from that URL,
// and `downloadcomplete` lets the grid master clean up.

use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::params::Params;
use crate::session::Session;

const FILEOP: &str = "fileop";
/// Prefix of the request-id path segment in download URLs.
const DOWNLOAD_PREFIX: &str = "req_id-DOWNLOAD-";

/// Token and download URL returned by `fileop?_function=getgriddata`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackupToken {
    pub token: String,
    pub url: String,
}

/// Split a download URL into its request id and file name.
///
/// `https://gm/http_direct_file_io/req_id-DOWNLOAD-0123abcd/database.bak`
/// yields `("0123abcd", "database.bak")`.
pub fn parse_file_url(file_url: &str) -> Result<(String, String), Error> {
    let url = Url::parse(file_url)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let invalid = || Error::Validation {
        field: "file url".into(),
        reason: format!("unexpected download URL layout: {file_url}"),
    };

    let [_, .., request, file] = segments.as_slice() else {
        return Err(invalid());
    };
    let request = request.strip_prefix(DOWNLOAD_PREFIX).unwrap_or(*request);
    Ok((request.to_owned(), (*file).to_owned()))
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

impl Session {
    /// Ask the grid master for a backup download token.
    pub async fn fetch_backup_token(&mut self) -> Result<BackupToken, Error> {
        let params = Params::new().with("_function", "getgriddata");
        let resp = self
            .post(FILEOP, &json!({ "type": "BACKUP" }), &params, json_headers())
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))
    }

    /// Download `file_url` to `dest`, ignoring the advertised MIME type.
    ///
    /// Uses the session's client, so the auth cookie and trust settings
    /// apply to the download as well.
    pub async fn download_file(&mut self, file_url: &str, dest: &Path) -> Result<u64, Error> {
        self.guard()?;
        let url = Url::parse(file_url)?;
        let builder = self
            .http()
            .get(url.clone())
            .header(CONTENT_TYPE, "application/force-download");
        let resp = self.send(reqwest::Method::GET, url, builder).await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("download failed: {body}"),
            });
        }

        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        debug!(dest = %dest.display(), size = bytes.len(), "download written");
        Ok(u64::try_from(bytes.len()).unwrap_or(u64::MAX))
    }

    /// Tell the grid master the download behind `token` is finished.
    pub async fn send_download_complete(&mut self, token: &str) -> Result<(), Error> {
        let params = Params::new().with("_function", "downloadcomplete");
        let resp = self
            .post(FILEOP, &json!({ "token": token }), &params, json_headers())
            .await?;

        let status = resp.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = resp.text().await?;
        Err(Error::Api {
            status: status.as_u16(),
            message: body,
        })
    }

    /// Download the grid backup into `folder/<request id>/<file name>`.
    ///
    /// Returns the path of the written file.
    pub async fn download_backup(&mut self, folder: &Path) -> Result<PathBuf, Error> {
        let token = self.fetch_backup_token().await?;
        debug!(url = %token.url, "backup token issued");

        let (request, file) = parse_file_url(&token.url)?;
        let directory = folder.join(request);
        tokio::fs::create_dir_all(&directory).await?;
        let dest = directory.join(file);

        let size = self.download_file(&token.url, &dest).await?;
        self.send_download_complete(&token.token).await?;

        info!(path = %dest.display(), size, "grid backup downloaded");
        Ok(dest)
    }
}
