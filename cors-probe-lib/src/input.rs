//! Opening the URL source.

use crate::error::CorsProbeError;
use std::path::Path;
use tokio::io::AsyncRead;

/// A boxed line source: a file or standard input.
pub type InputSource = Box<dyn AsyncRead + Unpin + Send>;

/// Open the URL list at `path`, or standard input when `path` is `None`.
///
/// # Errors
///
/// Returns `CorsProbeError::FileError` if the file cannot be opened.
pub async fn open_input(path: Option<&Path>) -> Result<InputSource, CorsProbeError> {
    match path {
        None => Ok(Box::new(tokio::io::stdin())),
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                CorsProbeError::file_error(path.to_string_lossy(), e.to_string())
            })?;
            Ok(Box::new(file))
        }
    }
}
