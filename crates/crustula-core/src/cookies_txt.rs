//! Serialization of a `Cookie:` request header into Netscape cookie-jar text.
//!
//! A request header carries only names and values, so every record gets the
//! same unscoped attributes: empty domain, path `/`, not secure, no expiry.
//! Session cookies are written anyway; the jar is only useful if they are.
//!
//! Output layout (tab-separated, one record per line):
//!
//! ```text
//! # Netscape HTTP Cookie File
//! # http://curl.haxx.se/rfc/cookie_spec.html
//! # This is a generated file!  Do not edit.
//!
//! #HttpOnly_<domain> <flag> <path> <secure> <expires> <name> <value>
//! ```

use cookie::Cookie;

/// Fixed preamble identifying the file format.
pub const HEADER: &str = "# Netscape HTTP Cookie File\n\
# http://curl.haxx.se/rfc/cookie_spec.html\n\
# This is a generated file!  Do not edit.\n\n";

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One line of a cookie-jar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    /// Unix seconds; `None` for a session cookie.
    pub expires: Option<i64>,
    pub name: String,
    pub value: String,
    pub http_only: bool,
}

impl CookieRecord {
    /// Record for a cookie seen in a request header.
    fn unscoped(name: &str, value: &str) -> Self {
        Self {
            domain: String::new(),
            path: "/".to_string(),
            secure: false,
            expires: None,
            name: name.to_string(),
            value: value.to_string(),
            http_only: true,
        }
    }

    /// Render the tab-separated line, without a trailing newline.
    pub fn to_line(&self) -> String {
        let prefix = if self.http_only { HTTP_ONLY_PREFIX } else { "" };
        let domain_flag = bool_field(self.domain.starts_with('.'));
        let expires = self.expires.map(|e| e.to_string()).unwrap_or_default();
        format!(
            "{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
            prefix,
            self.domain,
            domain_flag,
            self.path,
            bool_field(self.secure),
            expires,
            self.name,
            self.value
        )
    }
}

fn bool_field(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Whether `s` can sit in a tab-separated record without breaking the line.
fn is_field_safe(s: &str) -> bool {
    !s.contains(['\t', '\r', '\n'])
}

/// Parse a `Cookie:` header value into records, in order of appearance.
///
/// Pairs split on `;`, then on the first `=`. Segments that are not a valid
/// `name=value` pair are skipped, as are pairs whose name or value holds a
/// tab or line break. A repeated name keeps its first position and takes
/// the later value.
pub fn parse_cookie_header(header: &str) -> Vec<CookieRecord> {
    let mut records: Vec<CookieRecord> = Vec::new();
    let cookies = Cookie::split_parse(header)
        .filter_map(Result::ok)
        .filter(|c| is_field_safe(c.name()) && is_field_safe(c.value()));
    for cookie in cookies {
        match records.iter_mut().find(|r| r.name == cookie.name()) {
            Some(existing) => existing.value = cookie.value().to_string(),
            None => records.push(CookieRecord::unscoped(cookie.name(), cookie.value())),
        }
    }
    records
}

/// Render records as a complete cookie-jar file.
pub fn render_cookies_txt(records: &[CookieRecord]) -> String {
    let mut out = String::from(HEADER);
    for record in records {
        out.push_str(&record.to_line());
        out.push('\n');
    }
    out
}

/// Convert a `Cookie:` header value straight to cookie-jar text.
///
/// Pure and deterministic. A header without any valid pair still yields a
/// valid, empty jar.
pub fn convert_header_to_cookies_str(header: &str) -> String {
    render_cookies_txt(&parse_cookie_header(header))
}
