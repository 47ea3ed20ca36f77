//! Data model shared by the store backends, the selector, and the HTTP API.
//!
//! Timestamps are UTC. A [`Call`] always carries a timestamp, so the
//! selector never has to cope with an unordered call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored cookie jar for one domain.
///
/// Created once per curl conversion and never mutated afterwards, only
/// deleted. `mtime` and `atime` are carried but no operation sets them yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jar {
    pub id: String,
    pub domain: String,
    /// Netscape cookie-jar text.
    pub cookies: String,
    pub ctime: DateTime<Utc>,
    pub mtime: Option<DateTime<Utc>>,
    pub atime: Option<DateTime<Utc>>,
}

impl Jar {
    pub fn new(domain: impl Into<String>, cookies: impl Into<String>, ctime: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            domain: domain.into(),
            cookies: cookies.into(),
            ctime,
            mtime: None,
            atime: None,
        }
    }
}

/// One attempt to use a jar for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub domain: String,
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// `None` while the outcome has not been reported.
    pub success: Option<bool>,
    pub jar_id: Option<String>,
}

impl Call {
    /// A pending call handing `jar` out for `url`.
    ///
    /// `domain` comes from the request URL, not from the jar.
    pub fn pending(domain: impl Into<String>, url: impl Into<String>, jar: &Jar, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            domain: domain.into(),
            url: Some(url.into()),
            timestamp: now,
            success: None,
            jar_id: Some(jar.id.clone()),
        }
    }

    pub fn is_reported(&self) -> bool {
        self.success.is_some()
    }
}

/// Outcome report for a call. Absent fields are left unchanged.
///
/// Has no `jar_id`: a call's jar never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallUpdate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub success: Option<bool>,
}

impl CallUpdate {
    pub fn apply(&self, call: &mut Call) {
        if let Some(url) = &self.url {
            call.url = Some(url.clone());
        }
        if let Some(ts) = self.timestamp {
            call.timestamp = ts;
        }
        if let Some(success) = self.success {
            call.success = Some(success);
        }
    }
}

/// A jar together with its full call history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JarWithCalls {
    #[serde(flatten)]
    pub jar: Jar,
    pub calls: Vec<Call>,
}

/// A freshly checked-out call with the jar it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallWithJar {
    #[serde(flatten)]
    pub call: Call,
    pub jar: Jar,
}

/// Per-domain overview: the jar a lookup would return now, plus recent calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub domain: String,
    pub active_jar: Option<Jar>,
    pub recent_calls: Vec<Call>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_pending_call_references_jar() {
        let jar = Jar::new("example.com", "", ts(100));
        let call = Call::pending("example.com", "https://example.com/a", &jar, ts(200));
        assert_eq!(call.jar_id.as_deref(), Some(jar.id.as_str()));
        assert_eq!(call.success, None);
        assert!(!call.is_reported());
        assert_eq!(call.timestamp, ts(200));
    }

    #[test]
    fn test_update_leaves_absent_fields() {
        let jar = Jar::new("example.com", "", ts(100));
        let mut call = Call::pending("example.com", "https://example.com/a", &jar, ts(200));
        CallUpdate {
            success: Some(false),
            ..Default::default()
        }
        .apply(&mut call);
        assert_eq!(call.success, Some(false));
        assert_eq!(call.url.as_deref(), Some("https://example.com/a"));
        assert_eq!(call.timestamp, ts(200));
    }

    #[test]
    fn test_update_deserializes_partial_body() {
        let update: CallUpdate = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(update.success, Some(true));
        assert!(update.url.is_none());
        assert!(update.timestamp.is_none());
    }

    #[test]
    fn test_call_with_jar_flattens_call_fields() {
        let jar = Jar::new("example.com", "", ts(100));
        let call = Call::pending("example.com", "https://example.com/a", &jar, ts(200));
        let value = serde_json::to_value(CallWithJar { call, jar }).unwrap();
        assert_eq!(value["domain"], "example.com");
        assert_eq!(value["jar"]["domain"], "example.com");
        assert!(value["success"].is_null());
    }
}
