//! HTTP/1.x framing used by the echo handlers and the response library
//!
//! Requests are parsed with `httparse`; responses are serialized by hand so
//! that canned fixtures are byte-for-byte reproducible.

pub mod content_type;
pub mod request;
pub mod response;


pub use content_type::content_type_for;
pub use request::{BodyFraming, Request, RequestDecoder, RequestHead, read_request, read_request_target};
pub use response::{Body, ResponseDescriptor};
