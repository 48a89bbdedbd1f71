// Transport layer: the single seam between the session client and the
// network. `SessionClient` only ever talks to a `Transport`, so tests can
// hand it a stub that records requests and replays canned responses.

use reqwest::blocking::{multipart, Client};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

/// Failure to complete an HTTP exchange at all (as opposed to the server
/// answering with an unexpected status).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout or a broken response body.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local I/O failure underneath the exchange.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request body shapes the qBittorrent Web API needs. Fields stay
/// structured until the transport encodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `multipart/form-data` with text fields only
    Multipart(Vec<(String, String)>),
}

impl RequestBody {
    /// Look up the first field named `name`, whatever the encoding.
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match self {
            RequestBody::Form(fields) | RequestBody::Multipart(fields) => fields,
        };
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// What came back. The body is read eagerly as text; the API only
/// answers with short plain-text messages ("Ok.", "Fails.").
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Performs exactly one blocking request/response exchange per call.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Production transport backed by `reqwest`'s blocking client.
///
/// The underlying client is built without a cookie store: cookies are
/// owned by the `SessionClient` so that they are visible to any transport,
/// real or stubbed.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport, optionally bounding every request by `timeout`.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.client.request(method, url).headers(headers);
        let builder = match body {
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(fields) => {
                let form = fields
                    .into_iter()
                    .fold(multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    });
                builder.multipart(form)
            }
        };

        let res = builder.send()?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.text()?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_works_for_both_encodings() {
        let form = RequestBody::Form(vec![
            ("username".into(), "admin".into()),
            ("password".into(), "secret".into()),
        ]);
        assert_eq!(form.field("password"), Some("secret"));
        assert_eq!(form.field("urls"), None);

        let multipart = RequestBody::Multipart(vec![("urls".into(), "magnet:?xt=1".into())]);
        assert_eq!(multipart.field("urls"), Some("magnet:?xt=1"));
    }

    #[test]
    fn builds_with_and_without_timeout() {
        assert!(ReqwestTransport::new(None).is_ok());
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5))).is_ok());
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let transport = ReqwestTransport::new(Some(Duration::from_secs(2))).unwrap();
        // Port 9 on loopback (discard) is closed on any sane test machine.
        let request = HttpRequest {
            method: Method::POST,
            url: Url::parse("http://127.0.0.1:9/api/v2/auth/login").unwrap(),
            headers: HeaderMap::new(),
            body: RequestBody::Form(vec![]),
        };
        let err = transport.execute(request).unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}
