//! Control consumer Wi-Fi routers through their HTML admin interfaces.
//!
//! Router admin panels of this era are quirky: auth failures come back as
//! HTTP 200 with the error buried in the page text, and the session token is
//! embedded in a client-side redirect script. Each supported model encodes
//! its own login scheme behind the [`Device`] trait.

pub mod devices;
pub mod error;
pub mod http;

pub use devices::{Device, HttpDevice, WifiStatus};
pub use error::Error;
pub use http::{HttpResponse, HttpSession, TcpTransport, Transport};

pub type Result<T> = std::result::Result<T, Error>;
