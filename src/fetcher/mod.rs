pub mod client;
pub mod decode;
pub mod errors;
pub mod types;

pub use client::{fetch_json, fetch_page, fetch_page_as, get_client, head_location};
pub use decode::decode_body;
pub use errors::FetchError;
pub use types::FetchedPage;
