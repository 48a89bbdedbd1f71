// API client module: a small blocking client for the qBittorrent Web API.
// It logs in once, keeps the session cookie the server hands back, and
// uses that session to add magnet links.

use crate::error::{body_preview, ClientError};
use crate::transport::{HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Method, StatusCode, Url};
use std::fmt;
use tracing::{debug, info};

const LOGIN_PATH: &str = "/api/v2/auth/login";
const ADD_PATH: &str = "/api/v2/torrents/add";

/// Cookie state for one client. Filled from `Set-Cookie` headers of the
/// login response and replayed on every later request.
#[derive(Debug, Default)]
pub struct Session {
    jar: Jar,
    established: bool,
}

impl Session {
    /// Store whatever cookies `headers` carries for `url`.
    fn capture(&mut self, url: &Url, headers: &HeaderMap) {
        let mut cookies = headers.get_all(SET_COOKIE).iter().peekable();
        if cookies.peek().is_some() {
            self.jar.set_cookies(&mut cookies, url);
        }
    }

    /// Add the `Cookie` header matching `url`, if any cookie applies.
    fn attach(&self, url: &Url, headers: &mut HeaderMap) {
        if let Some(value) = self.jar.cookies(url) {
            headers.insert(reqwest::header::COOKIE, value);
        }
    }
}

/// Client bound to one qBittorrent host and one credential pair for its
/// whole lifetime.
///
/// `login` must be called before `add_magnet` for the add to be accepted,
/// but this is not checked locally: an add without a session is sent
/// anyway and the server's rejection comes back as
/// [`ClientError::Submission`].
pub struct SessionClient<T = ReqwestTransport> {
    transport: T,
    host: String,
    username: String,
    password: String,
    session: Session,
}

impl<T: Transport> SessionClient<T> {
    /// Create a client for `host` (trailing slashes are dropped). Fails
    /// only if `host` is not a valid base URL; credentials are taken as-is.
    pub fn new(
        host: &str,
        username: &str,
        password: &str,
        transport: T,
    ) -> Result<Self, ClientError> {
        let host = host.trim_end_matches('/').to_string();
        if let Err(reason) = check_base_url(&host) {
            return Err(ClientError::InvalidHost { host, reason });
        }
        Ok(SessionClient {
            transport,
            host,
            username: username.to_string(),
            password: password.to_string(),
            session: Session::default(),
        })
    }

    /// Normalized host this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether a login has succeeded on this client.
    pub fn has_session(&self) -> bool {
        self.session.established
    }

    /// Authenticate with the form-encoded credentials. On a 200 the session
    /// cookie is kept for every later request; any other status is an
    /// [`ClientError::Auth`].
    pub fn login(&mut self) -> Result<(), ClientError> {
        let url = self.endpoint(LOGIN_PATH)?;
        let body = RequestBody::Form(vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ]);

        debug!(url = %url, username = %self.username, "login request");
        let res = self.send(url.clone(), body)?;

        if res.status != StatusCode::OK {
            return Err(ClientError::Auth {
                status: res.status,
                body: body_preview(&res.body),
            });
        }

        self.session.capture(&url, &res.headers);
        self.session.established = true;
        info!(host = %self.host, "logged in to qBittorrent");
        Ok(())
    }

    /// Submit `magnet` as the single multipart field `urls`. An empty
    /// magnet is rejected before anything is sent.
    pub fn add_magnet(&self, magnet: &str) -> Result<(), ClientError> {
        if magnet.is_empty() {
            return Err(ClientError::Validation("magnet is empty".into()));
        }
        if !self.session.established {
            debug!(host = %self.host, "adding magnet without a logged-in session");
        }

        let url = self.endpoint(ADD_PATH)?;
        let body = RequestBody::Multipart(vec![("urls".to_string(), magnet.to_string())]);

        debug!(url = %url, magnet, "add request");
        let res = self.send(url, body)?;

        if res.status != StatusCode::OK {
            return Err(ClientError::Submission {
                status: res.status,
                body: body_preview(&res.body),
            });
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        // `join` would drop any path prefix on the host (reverse proxies
        // often mount the Web UI under one), so concatenate instead.
        let raw = format!("{}{}", self.host, path);
        Url::parse(&raw).map_err(|e| ClientError::InvalidHost {
            host: self.host.clone(),
            reason: e.to_string(),
        })
    }

    fn send(&self, url: Url, body: RequestBody) -> Result<HttpResponse, ClientError> {
        let mut headers = HeaderMap::new();
        self.session.attach(&url, &mut headers);
        let res = self.transport.execute(HttpRequest {
            method: Method::POST,
            url,
            headers,
            body,
        })?;
        debug!(status = res.status.as_u16(), body = %res.body.trim(), "response");
        Ok(res)
    }
}

/// `host` must be an absolute http(s) URL. `localhost:8080` parses, but as
/// an opaque URL with scheme `localhost`, so it is rejected here.
fn check_base_url(host: &str) -> Result<(), String> {
    let url = Url::parse(host).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("not a base URL; include the scheme, e.g. http://host:port".into());
    }
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme {other:?}; use http or https")),
    }
}

impl<T> fmt::Debug for SessionClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// What the command-line flow needs from a qBittorrent client. The binary
/// hands a concrete client in; tests hand in a mock.
#[cfg_attr(test, mockall::automock)]
pub trait TorrentClient {
    fn login(&mut self) -> Result<(), ClientError>;
    fn add_magnet(&self, magnet: &str) -> Result<(), ClientError>;
}

impl<T: Transport> TorrentClient for SessionClient<T> {
    fn login(&mut self) -> Result<(), ClientError> {
        SessionClient::login(self)
    }

    fn add_magnet(&self, magnet: &str) -> Result<(), ClientError> {
        SessionClient::add_magnet(self, magnet)
    }
}
