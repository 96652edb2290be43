//! Fetching external schema documents.

use serde_json::Value;

use crate::Uri;
#[cfg(feature = "retrieve-file")]
use crate::UriString;

/// Resolves an absolute, fragmentless URI to a JSON document.
///
/// Implementations are free to cache, hit the network, or serve from a static
/// map. Failures surface as [`Error::Retrieve`](crate::Error::Retrieve) from
/// the registry.
pub trait Retrieve: Send + Sync {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

impl<F> Retrieve for F
where
    F: Fn(&Uri<String>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self(uri)
    }
}

/// The default retriever refuses everything: external references are opt-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetriever;

impl Retrieve for DefaultRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external resolution is not enabled for `{uri}`").into())
    }
}

/// Reads `file://` documents from the local filesystem.
///
/// The URI must not carry a host; Windows drive letters (`file:///c:/…`) are
/// supported.
#[cfg(feature = "retrieve-file")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRetriever;

#[cfg(feature = "retrieve-file")]
impl Retrieve for FileRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let path = file_uri_to_path(uri).ok_or_else(|| format!("not a file URI: `{uri}`"))?;
        tracing::debug!(uri = %uri, path = %path, "reading schema from disk");
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(feature = "retrieve-file")]
pub(crate) fn file_uri_to_path(uri: &UriString) -> Option<String> {
    if uri.scheme().as_str() != "file" {
        return None;
    }
    if let Some(authority) = uri.authority() {
        if !authority.host().is_empty() {
            return None;
        }
    }
    let decoded = percent_encoding::percent_decode_str(uri.path().as_str())
        .decode_utf8()
        .ok()?;
    let mut path = decoded.into_owned();
    // `file:///c:/schemas/x.json` carries the drive letter behind a leading slash.
    if cfg!(windows) {
        let bytes = path.as_bytes();
        if bytes.len() > 2 && bytes[0] == b'/' && bytes[2] == b':' {
            path.remove(0);
        }
    }
    Some(path)
}

/// Blocking HTTP retriever (`GET uri`, body parsed as JSON).
#[cfg(feature = "retrieve-http")]
#[derive(Debug, Default)]
pub struct HttpRetriever {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "retrieve-http")]
impl Retrieve for HttpRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(uri = %uri, "fetching schema over HTTP");
        let response = self.client.get(uri.as_str()).send()?.error_for_status()?;
        Ok(response.json()?)
    }
}

#[cfg(all(test, feature = "retrieve-file"))]
mod tests {
    use super::*;
    use crate::uri;

    #[test]
    fn file_paths() {
        let parsed = uri::parse("file:///tmp/a%20b.json").expect("valid");
        assert_eq!(file_uri_to_path(&parsed).as_deref(), Some("/tmp/a b.json"));
        let https = uri::parse("https://example.com/x.json").expect("valid");
        assert_eq!(file_uri_to_path(&https), None);
    }
}
