use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Empty, Full, StreamBody, combinators::UnsyncBoxBody};
use hyper::body::Frame;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Request body accepted by the transport: empty, in-memory, or streamed from a reader.
pub type RequestBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Type alias for the Hyper client shared by every blob store operation.
pub type HyperClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, RequestBody>;

/// Build a Hyper client with connection pooling and a TLS connector
/// that prefers native roots but falls back to the bundled WebPKI store.
pub fn build_hyper_client() -> HyperClient {
    let https_builder = HttpsConnectorBuilder::new()
        .with_native_roots()
        .unwrap_or_else(|err| {
            tracing::debug!("falling back to webpki roots (native roots unavailable: {err})");
            HttpsConnectorBuilder::new().with_webpki_roots()
        });

    let https = https_builder
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(16)
        .build::<_, RequestBody>(https)
}

pub fn empty_body() -> RequestBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn full_body(data: Bytes) -> RequestBody {
    Full::new(data).map_err(|never| match never {}).boxed_unsync()
}

/// Stream `reader` as the request body without buffering it first.
pub fn reader_body<R>(reader: R) -> RequestBody
where
    R: AsyncRead + Send + 'static,
{
    let frames = ReaderStream::new(reader).map_ok(Frame::data);
    BodyExt::boxed_unsync(StreamBody::new(frames))
}
