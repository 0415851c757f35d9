use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::BodyStream;
use hyper::body::Incoming;
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Uri, header};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::time::{Duration, Instant, timeout_at};
use tokio_util::io::StreamReader;

use crate::blob_store::config::{BLOBS_COLLECTION, BlobStoreConfig};
use crate::blob_store::error::{BlobStoreError, Result};
use crate::blob_store::multistatus::parse_multistatus;
use crate::blob_store::types::Blob;
use crate::common::compression::{add_accept_encoding, decompress_body, detect_encodings};
use crate::common::http::{
    HyperClient, RequestBody, build_hyper_client, empty_body, full_body, reader_body,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Characters left as-is in object names; everything else is percent-encoded.
/// `/` separates nested names and passes through.
static NAME_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:getcontentlength/>
    <D:getlastmodified/>
  </D:prop>
</D:propfind>"#;

/// Client for a blob collection served over WebDAV.
///
/// Each operation performs exactly one authenticated request. Configuration is
/// fixed at construction, so clones can be shared freely across tasks.
#[derive(Clone)]
pub struct DavBlobStore {
    config: BlobStoreConfig,
    base: Uri,
    client: HyperClient,
    auth_header: header::HeaderValue,
    timeout: Duration,
}

impl std::fmt::Debug for DavBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DavBlobStore")
            .field("base", &self.base)
            .field("username", &self.config.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DavBlobStore {
    /// Create a store client with the default 20 second request timeout.
    pub fn new(config: BlobStoreConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Create a store client whose requests fail with a transport error after `timeout`.
    pub fn with_timeout(config: BlobStoreConfig, timeout: Duration) -> Result<Self> {
        let base: Uri = config.base_url().parse().map_err(|e| {
            BlobStoreError::invalid_input(format!("invalid blob store address: {e}"))
        })?;

        let token = format!("{}:{}", config.username, config.password);
        let val = format!("Basic {}", B64.encode(token));
        let mut auth_header = header::HeaderValue::from_str(&val)
            .map_err(|e| BlobStoreError::invalid_input(format!("invalid credentials: {e}")))?;
        auth_header.set_sensitive(true);

        Ok(Self {
            config,
            base,
            client: build_hyper_client(),
            auth_header,
            timeout,
        })
    }

    pub fn config(&self) -> &BlobStoreConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve an object name against the blobs collection; an empty name is the collection itself.
    ///
    /// The name is percent-encoded, so `?`, `#`, `%` and spaces stay part of the object path.
    pub fn build_uri(&self, name: &str) -> Result<Uri> {
        let name = name.trim_start_matches('/');
        let path = if name.is_empty() {
            BLOBS_COLLECTION.to_string()
        } else {
            format!(
                "{BLOBS_COLLECTION}/{}",
                utf8_percent_encode(name, &NAME_ENCODE_SET)
            )
        };

        let mut parts = self.base.clone().into_parts();
        parts.path_and_query = Some(path.parse().map_err(|e| {
            BlobStoreError::invalid_input(format!("invalid object name {name:?}: {e}"))
        })?);
        Uri::from_parts(parts).map_err(|e| {
            BlobStoreError::invalid_input(format!("invalid object name {name:?}: {e}"))
        })
    }

    // ----------- Transport -----------

    /// Send one authenticated request and return the response with its body unread.
    ///
    /// Only the wait for response headers is bounded by the timeout; the body is left
    /// to the caller.
    pub async fn send(
        &self,
        method: Method,
        name: &str,
        headers: HeaderMap,
        body: Option<RequestBody>,
    ) -> Result<Response<Incoming>> {
        self.send_until(Instant::now() + self.timeout, method, name, headers, body)
            .await
    }

    async fn send_until(
        &self,
        deadline: Instant,
        method: Method,
        name: &str,
        headers: HeaderMap,
        body: Option<RequestBody>,
    ) -> Result<Response<Incoming>> {
        let uri = self.build_uri(name)?;

        let mut req_builder = Request::builder()
            .method(method.clone())
            .uri(uri.clone())
            .header(header::AUTHORIZATION, self.auth_header.clone());
        for (k, v) in headers.iter() {
            req_builder = req_builder.header(k, v);
        }

        let req = req_builder
            .body(body.unwrap_or_else(empty_body))
            .map_err(|e| BlobStoreError::invalid_input(format!("invalid request: {e}")))?;

        tracing::debug!(%method, %uri, "sending blob store request");
        let resp = timeout_at(deadline, self.client.request(req))
            .await
            .map_err(|_| BlobStoreError::timeout(self.timeout))?
            .map_err(BlobStoreError::transport)?;
        tracing::debug!(%method, %uri, status = %resp.status(), "blob store responded");

        Ok(resp)
    }

    // ----------- Operations -----------

    /// List the immediate children of the blobs collection with a `Depth: 1` PROPFIND.
    ///
    /// Only `207 Multi-Status` is accepted. The timeout covers the whole exchange,
    /// including reading the listing body.
    pub async fn list(&self) -> Result<Vec<Blob>> {
        let deadline = Instant::now() + self.timeout;

        let mut h = HeaderMap::new();
        h.insert("Depth", header::HeaderValue::from_static("1"));
        h.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/xml; charset=utf-8"),
        );
        add_accept_encoding(&mut h);

        let propfind = Method::from_bytes(b"PROPFIND")
            .map_err(|e| BlobStoreError::invalid_input(e.to_string()))?;
        let resp = self
            .send_until(
                deadline,
                propfind,
                "",
                h,
                Some(full_body(Bytes::from_static(PROPFIND_BODY.as_bytes()))),
            )
            .await?;

        if resp.status() != StatusCode::MULTI_STATUS {
            return Err(BlobStoreError::protocol(resp.status()));
        }

        let encodings = detect_encodings(resp.headers());
        let body = timeout_at(deadline, decompress_body(resp.into_body(), &encodings))
            .await
            .map_err(|_| BlobStoreError::timeout(self.timeout))?
            .map_err(BlobStoreError::transport)?;
        parse_multistatus(&body)
    }

    /// Stream `content` to `/blobs/<name>` with PUT. Any 2xx status is success.
    pub async fn upload<R>(&self, name: &str, content: R) -> Result<()>
    where
        R: AsyncRead + Send + 'static,
    {
        self.put(name, reader_body(content)).await
    }

    /// Upload an in-memory payload to `/blobs/<name>`.
    pub async fn upload_bytes(&self, name: &str, content: impl Into<Bytes>) -> Result<()> {
        self.put(name, full_body(content.into())).await
    }

    async fn put(&self, name: &str, body: RequestBody) -> Result<()> {
        let mut h = HeaderMap::new();
        h.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/octet-stream"),
        );
        let resp = self.send(Method::PUT, name, h, Some(body)).await?;
        expect_success(resp.status())
    }

    /// GET `/blobs/<name>` and hand back the body as a stream.
    ///
    /// The connection stays checked out until the returned reader is closed or dropped.
    pub async fn download(&self, name: &str) -> Result<BlobReader> {
        let resp = self.send(Method::GET, name, HeaderMap::new(), None).await?;
        expect_success(resp.status())?;
        Ok(BlobReader::new(resp))
    }

    /// DELETE `/blobs/<name>`. Any 2xx status (usually `204 No Content`) is success.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let resp = self
            .send(Method::DELETE, name, HeaderMap::new(), None)
            .await?;
        expect_success(resp.status())
    }
}

fn expect_success(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(BlobStoreError::protocol(status))
    }
}

type BodyStreamBox = Pin<Box<dyn futures_util::Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Streaming body of a downloaded blob.
pub struct BlobReader {
    content_length: Option<u64>,
    inner: StreamReader<BodyStreamBox, Bytes>,
}

impl BlobReader {
    fn new(resp: Response<Incoming>) -> Self {
        let content_length = resp
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let stream: BodyStreamBox = Box::pin(
            BodyStream::new(resp.into_body())
                .map_ok(|frame| frame.into_data().unwrap_or_default())
                .map_err(std::io::Error::other),
        );

        Self {
            content_length,
            inner: StreamReader::new(stream),
        }
    }

    /// Length announced by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Read the rest of the blob into memory.
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut out = Vec::with_capacity(self.content_length.unwrap_or(0) as usize);
        self.read_to_end(&mut out)
            .await
            .map_err(BlobStoreError::transport)?;
        Ok(Bytes::from(out))
    }

    /// Release the underlying connection.
    pub fn close(self) {}
}

impl AsyncRead for BlobReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
