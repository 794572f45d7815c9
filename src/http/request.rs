use crate::{FixtureError, Result};
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::Decoder;

/// Largest request head accepted before giving up on a stream
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

const MAX_HEADERS: usize = 64;

/// Upper bound on buffer growth per read while waiting for a declared body
const READ_CHUNK: usize = 64 * 1024;

/// How the body of a request is delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// No body follows the head
    None,
    /// Exactly this many bytes follow the head
    Length(u64),
    /// `Transfer-Encoding: chunked`
    Chunked,
}

/// Parsed request line and headers
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    /// Minor HTTP version, `0` for HTTP/1.0 and `1` for HTTP/1.1
    pub version: u8,
    pub headers: Vec<(String, Bytes)>,
    pub framing: BodyFraming,
}

impl RequestHead {
    /// First value of the named header, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }
}

/// A fully read request
#[derive(Debug, Clone)]
pub struct Request {
    pub head: RequestHead,
    /// `None` when the head declared no body, `Some` (possibly empty) otherwise
    pub body: Option<Bytes>,
}

/// Codec framing request heads out of a byte stream
#[derive(Debug, Default)]
pub struct RequestDecoder;

impl Decoder for RequestDecoder {
    type Item = RequestHead;
    type Error = FixtureError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RequestHead>> {
        match parse_head(src)? {
            Some((head, consumed)) => {
                src.advance(consumed);
                Ok(Some(head))
            }
            None => Ok(None),
        }
    }
}

/// Parses a request head from the start of `buf` without consuming it.
///
/// Returns the head and its length in bytes, or `None` if more input is
/// needed.
fn parse_head(buf: &[u8]) -> Result<Option<(RequestHead, usize)>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    let consumed = match req.parse(buf)? {
        httparse::Status::Complete(consumed) => consumed,
        httparse::Status::Partial => {
            if buf.len() > MAX_HEAD_SIZE {
                return Err(FixtureError::Parse(format!(
                    "request head exceeds {MAX_HEAD_SIZE} bytes"
                )));
            }
            return Ok(None);
        }
    };

    let headers: Vec<(String, Bytes)> = req
        .headers
        .iter()
        .map(|h| (h.name.to_string(), Bytes::copy_from_slice(h.value)))
        .collect();
    let framing = body_framing(&headers)?;

    let head = RequestHead {
        method: req.method.unwrap_or_default().to_string(),
        path: req.path.unwrap_or_default().to_string(),
        version: req.version.unwrap_or(1),
        headers,
        framing,
    };

    Ok(Some((head, consumed)))
}

fn body_framing(headers: &[(String, Bytes)]) -> Result<BodyFraming> {
    let transfer_encoding = headers
        .iter()
        .rfind(|(k, _)| k.eq_ignore_ascii_case("transfer-encoding"));
    if let Some((_, value)) = transfer_encoding {
        let last = value
            .rsplit(|b| *b == b',')
            .next()
            .map(|coding| coding.trim_ascii())
            .unwrap_or_default();
        if last.eq_ignore_ascii_case(b"chunked") {
            return Ok(BodyFraming::Chunked);
        }
        return Err(FixtureError::Parse(format!(
            "unsupported transfer encoding {:?}",
            String::from_utf8_lossy(value)
        )));
    }

    let mut length = None;
    for (_, value) in headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("content-length"))
    {
        let parsed = std::str::from_utf8(value)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                FixtureError::Parse(format!(
                    "invalid content length {:?}",
                    String::from_utf8_lossy(value)
                ))
            })?;
        match length {
            Some(existing) if existing != parsed => {
                return Err(FixtureError::Parse(
                    "conflicting content length headers".to_string(),
                ));
            }
            _ => length = Some(parsed),
        }
    }

    Ok(length.map_or(BodyFraming::None, BodyFraming::Length))
}

/// Reads more bytes from `source` into `buf`, failing if the stream ended
async fn fill<R>(source: &mut R, buf: &mut BytesMut) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    if source.read_buf(buf).await? == 0 {
        return Err(FixtureError::IncompleteRequest);
    }
    Ok(())
}

/// Reads a single request, head and body, from `source`.
///
/// Bytes after the request are left unread in the buffer and dropped.
pub async fn read_request<R>(source: &mut R) -> Result<Request>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::with_capacity(4096);
    let mut decoder = RequestDecoder;

    let head = loop {
        if let Some(head) = decoder.decode(&mut buf)? {
            break head;
        }
        fill(source, &mut buf).await?;
    };

    let body = match head.framing {
        BodyFraming::None => None,
        BodyFraming::Length(len) => {
            let len = usize::try_from(len)
                .map_err(|_| FixtureError::Parse(format!("content length {len} too large")))?;
            while buf.len() < len {
                buf.reserve((len - buf.len()).min(READ_CHUNK));
                fill(source, &mut buf).await?;
            }
            Some(buf.split_to(len).freeze())
        }
        BodyFraming::Chunked => Some(read_chunked(source, &mut buf).await?),
    };

    Ok(Request { head, body })
}

async fn read_chunked<R>(source: &mut R, buf: &mut BytesMut) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut body = BytesMut::new();

    loop {
        let (consumed, size) = loop {
            match httparse::parse_chunk_size(buf)
                .map_err(|_| FixtureError::Parse("invalid chunk size".to_string()))?
            {
                httparse::Status::Complete(parsed) => break parsed,
                httparse::Status::Partial => fill(source, buf).await?,
            }
        };
        buf.advance(consumed);

        if size == 0 {
            break;
        }

        let size = usize::try_from(size)
            .ok()
            .filter(|size| size.checked_add(2).is_some())
            .ok_or_else(|| FixtureError::Parse(format!("chunk size {size} too large")))?;
        while buf.len() < size + 2 {
            buf.reserve((size + 2 - buf.len()).min(READ_CHUNK));
            fill(source, buf).await?;
        }
        body.extend_from_slice(&buf[..size]);
        if &buf[size..size + 2] != b"\r\n" {
            return Err(FixtureError::Parse("chunk not terminated by CRLF".to_string()));
        }
        buf.advance(size + 2);
    }

    // Trailer section, ended by an empty line
    loop {
        match buf.windows(2).position(|w| w == b"\r\n") {
            Some(0) => {
                buf.advance(2);
                break;
            }
            Some(end) => buf.advance(end + 2),
            None => fill(source, buf).await?,
        }
    }

    Ok(body.freeze())
}

/// Reads a request head from `source` and returns its target path together
/// with every byte consumed so far, so the caller can replay them.
pub async fn read_request_target<R>(source: &mut R) -> Result<(String, Bytes)>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        if let Some((head, _)) = parse_head(&buf)? {
            return Ok((head.path, buf.freeze()));
        }
        fill(source, &mut buf).await?;
    }
}
