use crate::http::{ResponseDescriptor, content_type_for};
use crate::{FixtureError, Result};
use bytes::Bytes;
use std::fs::File;
use std::path::Path;

/// Serializes `path` into a complete `200 OK` response with the file as its
/// body and a Content-Type resolved from the file extension.
///
/// The file is closed before this returns, whether or not serialization
/// succeeded.
pub fn file_to_response(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    let file_error = |source| FixtureError::File {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(file_error)?;

    ResponseDescriptor::ok()
        .header("Content-Type", content_type_for(path))
        .reader_body(file)
        .serialize()
        .map_err(|err| match err {
            FixtureError::Io(source) => file_error(source),
            other => other,
        })
}
