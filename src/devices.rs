pub mod tp_link;

use crate::http::{HttpResponse, HttpSession};
use crate::Result;

/// Snapshot of a radio's state, read fresh from the device on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiStatus {
    pub enabled: bool,
    pub ssid: String,
    pub channel: u16,
}

/// The capability contract every supported router model provides.
///
/// One instance is one logical admin session against one device; calls must
/// be serialized by the caller because `login` replaces the session token the
/// other operations consume.
pub trait Device {
    /// Authenticate against the admin interface. On success the device holds
    /// a session token used by all later calls; a failed login leaves no
    /// token behind.
    fn login(&mut self, user: &str, password: &str) -> Result<()>;

    /// Read the radio state. Requires a prior successful login.
    fn wifi_status(&mut self) -> Result<WifiStatus>;

    fn wifi_turn_on(&mut self) -> Result<()>;

    fn wifi_turn_off(&mut self) -> Result<()>;
}

/// Shared shape of devices reached over plain HTTP: a host address plus a
/// cookie-bearing session owned for the life of the device.
pub trait HttpDevice: Device {
    fn host(&self) -> &str;

    fn session(&mut self) -> &mut HttpSession;

    /// Decide from a response whether authentication failed. Firmware of
    /// this era often answers 200 with the error only in the HTML text, so
    /// this cannot be a generic status-code check.
    fn is_bad_login(&self, response: &HttpResponse) -> bool;
}
