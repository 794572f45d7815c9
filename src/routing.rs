//! Per-request routing metadata handed over by the tunnel transport.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Application protocol carried by a tunneled stream
///
/// Unknown tags parse into [`Protocol::Other`] so that a transport speaking
/// a newer protocol still reaches the dispatcher's fallback handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Opaque byte stream
    Raw,
    /// HTTP/1.x request/response
    Http,
    /// Any other tag, kept verbatim
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Raw => "raw",
            Protocol::Http => "http",
            Protocol::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "raw" | "tcp" => Protocol::Raw,
            "http" => Protocol::Http,
            _ => Protocol::Other(s.to_string()),
        })
    }
}

impl From<&str> for Protocol {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(protocol) => protocol,
            Err(never) => match never {},
        }
    }
}

/// Routing descriptor for a single tunneled request
///
/// # Examples
///
/// ```
/// use tunfixture::{Protocol, RoutingDescriptor};
///
/// let descriptor = RoutingDescriptor::http("/data/foo/bar.zip");
/// assert_eq!(descriptor.protocol, Protocol::Http);
/// assert_eq!(descriptor.to_string(), "http /data/foo/bar.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDescriptor {
    /// Protocol tag selecting the handler
    pub protocol: Protocol,
    /// URL path of the request, empty for non-HTTP streams
    pub url_path: String,
}

impl RoutingDescriptor {
    pub fn new(protocol: impl Into<Protocol>, url_path: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            url_path: url_path.into(),
        }
    }

    pub fn http(url_path: impl Into<String>) -> Self {
        Self::new(Protocol::Http, url_path)
    }

    pub fn raw() -> Self {
        Self::new(Protocol::Raw, String::new())
    }
}

impl fmt::Display for RoutingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url_path.is_empty() {
            write!(f, "{}", self.protocol)
        } else {
            write!(f, "{} {}", self.protocol, self.url_path)
        }
    }
}
