// Cursor paging
//
// Walks the server's `next_page_id` cursor to rebuild one logical result
// set from several responses. The same page fetch drives both the
// materialized `collect()` and the lazy `into_stream()`; the stream only
// asks for page N+1 once the consumer has pulled every object of page N.

use async_stream::stream;
use futures_util::stream::BoxStream;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::models::PageEnvelope;
use crate::params::Params;
use crate::session::Session;

/// Page size requested when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const PAGING: &str = "_paging";
const RETURN_AS_OBJECT: &str = "_return_as_object";
const MAX_RESULTS: &str = "_max_results";
const PAGE_ID: &str = "_page_id";

/// Lazily fetched result objects, in server order.
pub type ObjectStream<'a> = BoxStream<'a, Result<Value, Error>>;

/// A page request that came back with something other than 200.
///
/// Paging stops there; objects from earlier pages remain valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltedPage {
    pub status: StatusCode,
    pub body: String,
    /// 1-based index of the failing page request.
    pub page: usize,
}

/// Every object collected by a paged query.
#[derive(Debug, Default)]
pub struct PageSet {
    pub objects: Vec<Value>,
    /// Number of page requests issued.
    pub pages: usize,
    /// Set when a non-200 page cut the result set short.
    pub halted: Option<HaltedPage>,
}

impl PageSet {
    /// Whether the cursor ran to its end.
    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }

    /// Return the objects, or an [`Error::Api`] if paging was halted.
    pub fn into_complete(self) -> Result<Vec<Value>, Error> {
        match self.halted {
            None => Ok(self.objects),
            Some(halted) => Err(Error::Api {
                status: halted.status.as_u16(),
                message: format!(
                    "paging halted at page {} after {} objects: {}",
                    halted.page,
                    self.objects.len(),
                    halted.body
                ),
            }),
        }
    }
}

/// Builder for a paged query against one object type.
///
/// Borrows the session mutably for as long as the query (or its stream)
/// lives.
pub struct Pager<'s> {
    session: &'s mut Session,
    object_type: String,
    params: Params,
    page_size: u32,
}

impl<'s> Pager<'s> {
    pub(crate) fn new(session: &'s mut Session, object_type: &str) -> Self {
        Self {
            session,
            object_type: object_type.to_owned(),
            params: Params::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Caller parameters (filters, `_return_fields`, ...). Paging
    /// parameters are layered on top and win on conflict.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Objects per page. A hint to the server; clamped to at least 1.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch every page and return the concatenated objects.
    pub async fn collect(self) -> Result<PageSet, Error> {
        self.session.guard()?;
        let mut params = paging_params(&self.params, self.page_size);
        let mut set = PageSet::default();

        loop {
            set.pages += 1;
            match fetch_page(self.session, &self.object_type, &params, set.pages).await? {
                Fetched::Halted(halted) => {
                    set.halted = Some(halted);
                    break;
                }
                Fetched::Page { objects, next } => {
                    set.objects.extend(objects);
                    match next {
                        Some(token) => {
                            params.insert(PAGE_ID, token);
                        }
                        None => break,
                    }
                }
            }
        }

        debug!(
            object_type = %self.object_type,
            objects = set.objects.len(),
            pages = set.pages,
            complete = set.is_complete(),
            "paged query finished"
        );
        Ok(set)
    }

    /// Turn the query into a lazy stream of objects.
    ///
    /// Fails immediately, before any request, if the session is not
    /// logged in. Dropping the stream stops paging; no page is ever
    /// prefetched. A non-200 page ends the stream quietly (logged at
    /// warn level); transport and envelope errors are yielded once as
    /// `Err` and end it.
    pub fn into_stream(self) -> Result<ObjectStream<'s>, Error> {
        self.session.guard()?;
        let Pager {
            session,
            object_type,
            params,
            page_size,
        } = self;
        let mut params = paging_params(&params, page_size);

        Ok(Box::pin(stream! {
            let mut page = 0;
            loop {
                page += 1;
                let fetched = match fetch_page(session, &object_type, &params, page).await {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };
                let Fetched::Page { objects, next } = fetched else {
                    break;
                };
                for object in objects {
                    yield Ok(object);
                }
                match next {
                    Some(token) => {
                        params.insert(PAGE_ID, token);
                    }
                    None => break,
                }
            }
        }))
    }
}

impl Session {
    /// Start a paged query against `object_type`.
    pub fn pager(&mut self, object_type: &str) -> Pager<'_> {
        Pager::new(self, object_type)
    }

    /// Fetch all objects of `object_type` across every page.
    ///
    /// A non-200 page truncates the result (logged at warn level); use
    /// [`pager`](Self::pager) and [`PageSet::halted`] to tell the
    /// difference.
    pub async fn get_paged(
        &mut self,
        object_type: &str,
        params: &Params,
        page_size: u32,
    ) -> Result<Vec<Value>, Error> {
        let set = self
            .pager(object_type)
            .params(params.clone())
            .page_size(page_size)
            .collect()
            .await?;
        Ok(set.objects)
    }

    /// Stream all objects of `object_type`, fetching pages on demand.
    pub fn stream(
        &mut self,
        object_type: &str,
        params: &Params,
        page_size: u32,
    ) -> Result<ObjectStream<'_>, Error> {
        self.pager(object_type)
            .params(params.clone())
            .page_size(page_size)
            .into_stream()
    }
}

// ── Page fetch ───────────────────────────────────────────────────────

enum Fetched {
    Page {
        objects: Vec<Value>,
        next: Option<String>,
    },
    Halted(HaltedPage),
}

fn paging_params(params: &Params, page_size: u32) -> Params {
    let mut merged = params.clone();
    merged
        .insert(PAGING, 1)
        .insert(RETURN_AS_OBJECT, 1)
        .insert(MAX_RESULTS, page_size);
    merged
}

async fn fetch_page(
    session: &mut Session,
    object_type: &str,
    params: &Params,
    page: usize,
) -> Result<Fetched, Error> {
    let resp = session.get(object_type, params).await?;
    let status = resp.status();
    let body = resp.text().await?;

    if status != StatusCode::OK {
        warn!(%status, object_type, page, "paging halted by non-success response");
        return Ok(Fetched::Halted(HaltedPage { status, body, page }));
    }

    let envelope: PageEnvelope =
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))?;

    trace!(
        object_type,
        page,
        count = envelope.result.len(),
        more = envelope.next_page_id.is_some(),
        "page fetched"
    );
    Ok(Fetched::Page {
        objects: envelope.result,
        next: envelope.next_page_id,
    })
}
