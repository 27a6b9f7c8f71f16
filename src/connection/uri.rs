//! Plugin URI parsing
//!
//! ```text
//! scheme[+transport]://[user@]host[:port][/path][?key=value&...]
//! ```
//!
//! The scheme selects the plugin; everything else is handed to the plugin
//! verbatim during the session handshake.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use url::{Host, Url};

/// Parsed plugin URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginUri {
    url: Url,
    query: BTreeMap<String, String>,
}

impl PluginUri {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::InvalidUri(format!("{raw:?}: {e}")))?;
        let query = url.query_pairs().into_owned().collect();
        Ok(Self { url, query })
    }

    /// Full scheme, including any `+transport` suffix
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Plugin name: the scheme up to the first `+`
    pub fn plugin_name(&self) -> &str {
        let scheme = self.url.scheme();
        scheme.split_once('+').map_or(scheme, |(name, _)| name)
    }

    /// Percent-decoded user name, if any
    pub fn user(&self) -> Option<String> {
        let user = self.url.username();
        if user.is_empty() {
            return None;
        }
        Some(
            urlencoding::decode(user)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| user.to_string()),
        )
    }

    /// Host without IPv6 brackets
    pub fn host(&self) -> Option<String> {
        match self.url.host()? {
            Host::Domain(d) if d.is_empty() => None,
            Host::Domain(d) => Some(d.to_string()),
            Host::Ipv4(addr) => Some(addr.to_string()),
            Host::Ipv6(addr) => Some(addr.to_string()),
        }
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Look up a query parameter
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// All query parameters, decoded
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.query
    }
}

impl fmt::Display for PluginUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_minimal_uri() {
        let uri = PluginUri::parse("sim://").unwrap();
        assert_eq!(uri.scheme(), "sim");
        assert_eq!(uri.plugin_name(), "sim");
        assert!(uri.host().is_none());
        assert!(uri.user().is_none());
        assert!(uri.parameters().is_empty());
    }

    #[test]
    fn test_full_uri() {
        let uri = PluginUri::parse(
            "smispy+ssl://admin%40corp@array.example.com:5989/root/cimv2?namespace=root%2Femc&no_ssl_verify=yes",
        )
        .unwrap();
        assert_eq!(uri.scheme(), "smispy+ssl");
        assert_eq!(uri.plugin_name(), "smispy");
        assert_eq!(uri.user().as_deref(), Some("admin@corp"));
        assert_eq!(uri.host().as_deref(), Some("array.example.com"));
        assert_eq!(uri.port(), Some(5989));
        assert_eq!(uri.path(), "/root/cimv2");
        assert_eq!(uri.parameter("namespace"), Some("root/emc"));
        assert_eq!(uri.parameter("no_ssl_verify"), Some("yes"));
        assert_eq!(uri.parameter("missing"), None);
    }

    #[test]
    fn test_ipv6_host() {
        let uri = PluginUri::parse("ontap://root@[fe80::1]:443/").unwrap();
        assert_eq!(uri.host().as_deref(), Some("fe80::1"));
        assert_eq!(uri.port(), Some(443));
    }

    #[test]
    fn test_query_plus_is_space() {
        let uri = PluginUri::parse("sim://?label=gold+tier&empty").unwrap();
        assert_eq!(uri.parameter("label"), Some("gold tier"));
        assert_eq!(uri.parameter("empty"), Some(""));
    }

    #[test]
    fn test_invalid_uris() {
        assert_matches!(PluginUri::parse("no-scheme-here"), Err(Error::InvalidUri(_)));
        assert_matches!(PluginUri::parse("://host"), Err(Error::InvalidUri(_)));
        assert_matches!(PluginUri::parse("9sim://"), Err(Error::InvalidUri(_)));
        assert_matches!(PluginUri::parse("sim://host:99999"), Err(Error::InvalidUri(_)));
        assert_matches!(PluginUri::parse("s_m://"), Err(Error::InvalidUri(_)));
    }

    #[test]
    fn test_display_round_trip() {
        let uri = PluginUri::parse("nstor://root@10.1.1.1:2000?a=1").unwrap();
        assert_eq!(uri.to_string(), "nstor://root@10.1.1.1:2000?a=1");
        assert_eq!(PluginUri::parse(&uri.to_string()).unwrap(), uri);
    }
}
