pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{clean_title, is_http_url, is_plausible_title, resolve_link, title_length_ok};
