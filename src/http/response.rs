use crate::{FixtureError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use http::{StatusCode, Version};
use std::fmt;
use std::io::Read;

/// Body source of a response
pub enum Body {
    /// Bytes already in memory
    Bytes(Bytes),
    /// A reader drained fully at serialization time
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Body::Reader(_) => f.write_str("Reader"),
        }
    }
}

/// Description of an HTTP/1.x response, turned into wire bytes by
/// [`ResponseDescriptor::serialize`]
///
/// Headers keep their insertion order so that serialized fixtures compare
/// byte for byte. `Content-Length` is driven by [`content_length`] and the
/// body setters rather than by [`header`].
///
/// [`content_length`]: ResponseDescriptor::content_length
/// [`header`]: ResponseDescriptor::header
///
/// # Examples
///
/// ```
/// use tunfixture::ResponseDescriptor;
///
/// let bytes = ResponseDescriptor::ok()
///     .header("Content-Type", "text/plain")
///     .body("hello")
///     .serialize()
///     .unwrap();
///
/// assert_eq!(
///     &bytes[..],
///     b"HTTP/1.0 200 OK\r\nContent-Length: 5\r\nContent-Type: text/plain\r\n\r\nhello"
/// );
/// ```
#[derive(Debug)]
pub struct ResponseDescriptor {
    status: StatusCode,
    reason: Option<String>,
    version: Version,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    content_length: Option<u64>,
}

impl ResponseDescriptor {
    /// Creates an HTTP/1.0 response with no headers and no body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            version: Version::HTTP_10,
            headers: Vec::new(),
            body: None,
            content_length: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A bodiless 404 with an explicit zero content length
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND).content_length(Some(0))
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Overrides the canonical reason phrase of the status line
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets a header, replacing any existing header with the same name
    /// (compared case-insensitively) in its original position
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Sets an in-memory body and a matching content length
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.content_length = Some(body.len() as u64);
        self.body = Some(Body::Bytes(body));
        self
    }

    /// Sets a body read from `reader` when serialized; the content length is
    /// computed from the drained bytes unless set explicitly
    pub fn reader_body(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = Some(Body::Reader(Box::new(reader)));
        self
    }

    /// Sets or clears the declared content length. `None` with a body
    /// present produces read-until-close framing; without a body only
    /// `Some(0)` serializes.
    pub fn content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Serializes the response into its exact wire representation
    pub fn serialize(self) -> Result<Bytes> {
        let mut content_length = self.content_length;
        let body = match self.body {
            None => None,
            Some(Body::Bytes(bytes)) => Some(bytes),
            Some(Body::Reader(mut reader)) => {
                let mut drained = Vec::new();
                reader.read_to_end(&mut drained)?;
                content_length.get_or_insert(drained.len() as u64);
                Some(Bytes::from(drained))
            }
        };

        if let Some(declared) = content_length {
            let actual = body.as_ref().map_or(0, |body| body.len() as u64);
            if declared != actual {
                return Err(FixtureError::ContentLengthMismatch { declared, actual });
            }
        }

        let reason = self
            .reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("");
        let body_len = body.as_ref().map_or(0, Bytes::len);
        let mut out = BytesMut::with_capacity(128 + body_len);

        out.put_slice(version_str(self.version).as_bytes());
        out.put_u8(b' ');
        out.put_slice(self.status.as_str().as_bytes());
        out.put_u8(b' ');
        out.put_slice(reason.as_bytes());
        out.put_slice(b"\r\n");

        if let Some(len) = content_length {
            out.put_slice(format!("Content-Length: {len}\r\n").as_bytes());
        }
        for (name, value) in &self.headers {
            out.put_slice(name.as_bytes());
            out.put_slice(b": ");
            out.put_slice(value.as_bytes());
            out.put_slice(b"\r\n");
        }
        out.put_slice(b"\r\n");

        if let Some(body) = body {
            out.put_slice(&body);
        }

        Ok(out.freeze())
    }
}

fn version_str(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "HTTP/0.9"
    } else if version == Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == Version::HTTP_2 {
        "HTTP/2.0"
    } else if version == Version::HTTP_3 {
        "HTTP/3.0"
    } else {
        "HTTP/1.1"
    }
}
