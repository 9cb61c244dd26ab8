// wapi-api: async client for session-authenticated appliance REST APIs (WAPI)
//
// A `Session` logs in by fetching the schema document, guards every CRUD
// call behind that login, and pages large result sets by following the
// server's `next_page_id` cursor, either all at once or as a stream.

pub mod auth;
pub mod error;
pub mod fileop;
pub mod hosts;
pub mod models;
pub mod pager;
pub mod params;
pub mod reference;
pub mod scope;
pub mod session;
pub mod transport;

pub use error::Error;
pub use fileop::{BackupToken, parse_file_url};
pub use hosts::{HostAddress, NewHost, host_addresses};
pub use models::{ResponseInfo, Schema};
pub use pager::{DEFAULT_PAGE_SIZE, HaltedPage, ObjectStream, PageSet, Pager};
pub use params::Params;
pub use reference::{Reference, reference_of};
pub use scope::ScopedSession;
pub use session::Session;
pub use transport::{TlsMode, TransportConfig};
