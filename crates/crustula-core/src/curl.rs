//! Extraction of the target URL and `Cookie:` header from a curl command.
//!
//! Input is what a browser's "Copy as cURL" produces: a single shell
//! command line, possibly continued over several lines with `\`. It is
//! tokenized with POSIX shell quoting rules. Only the URL and `-H 'Cookie: ...'`
//! are interpreted; every other flag is ignored.

use crate::error::{CrustulaError, Result};

const COOKIE_PREFIX: &str = "Cookie: ";

/// URL and raw cookie header pulled out of a curl command.
///
/// Either field is empty when the command did not contain it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurlRequest {
    pub url: String,
    pub cookie_header: String,
}

/// Tokenize `curl_cmd` and extract its URL and `Cookie:` header value.
///
/// The last `http://`/`https://` token wins, as does the last cookie header.
/// Unbalanced quoting is a hard error.
pub fn extract_curl_string(curl_cmd: &str) -> Result<CurlRequest> {
    let args = shlex::split(curl_cmd).ok_or_else(|| {
        CrustulaError::MalformedCurl("unbalanced quotes or trailing escape".to_string())
    })?;

    let mut request = CurlRequest::default();
    let mut iter = args.iter().enumerate();
    while let Some((i, arg)) = iter.next() {
        if i == 0 && arg == "curl" {
            continue;
        }
        if arg.starts_with("http://") || arg.starts_with("https://") {
            request.url = arg.clone();
        } else if arg == "-H" {
            // The header token is consumed here so it is never read as a flag.
            if let Some((_, header)) = iter.next() {
                if let Some(value) = header.strip_prefix(COOKIE_PREFIX) {
                    request.cookie_header = value.to_string();
                }
            }
        }
    }
    Ok(request)
}

/// Find the first already-split argument carrying a `Cookie: ` header.
///
/// Used by the `curl2cookies` binary, where the shell has done the
/// tokenizing and `-H` pairing is not checked.
pub fn cookie_header_from_args<S: AsRef<str>>(args: &[S]) -> Option<&str> {
    args.iter()
        .find_map(|arg| arg.as_ref().strip_prefix(COOKIE_PREFIX))
}
