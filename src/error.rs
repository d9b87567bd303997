use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The router rejected the credentials, either via HTTP status or via an
    /// error message embedded in the response page.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The login succeeded but the redirect script did not contain a session
    /// token. Usually a wrong model or unexpected firmware revision.
    #[error("no session token found in login response")]
    SessionTokenNotFound,

    /// An authenticated page request was answered with the firmware's
    /// "no authority" page; the session token is stale or invalid.
    #[error("router refused the session token")]
    Unauthorized,

    /// Operation requires a prior successful login on this device instance.
    #[error("not logged in")]
    NotLoggedIn,

    /// The wire format for this operation is not known for this model.
    #[error("operation not implemented for this model: {0}")]
    NotImplemented(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed http response: {0}")]
    Http(#[from] httparse::Error),

    #[error("unexpected response: {0}")]
    MalformedResponse(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
