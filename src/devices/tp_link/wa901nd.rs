//! TP-Link TL-WA901ND access point.
//!
//! Login mimics the firmware's `encrypt.js`: the password is md5-hashed,
//! `user:hexdigest` is base64-encoded and sent as an `Authorization` cookie
//! on every request. A successful login answers with a tiny page whose
//! redirect script leaks the session token that all later pages expect as a
//! URL path segment.

use std::time::Duration;

use base64::prelude::*;
use md5::{Digest, Md5};
use regex::Regex;
use url::Url;

use crate::devices::{Device, HttpDevice, WifiStatus};
use crate::error::Error;
use crate::http::{HttpResponse, HttpSession, TcpTransport, Transport};
use crate::Result;

pub struct Wa901nd {
    host: String,
    session: HttpSession,
    session_token: Option<String>,
}

impl Wa901nd {
    const BAD_LOGIN_MARKER: &'static str = "username or password is incorrect";
    const NO_AUTHORITY_MARKER: &'static str = "you have no authority to access this router";

    pub fn new(host: impl Into<String>) -> Self {
        Self::with_transport(host, Box::new(TcpTransport::new()))
    }

    pub fn with_timeout(host: impl Into<String>, timeout: Duration) -> Self {
        Self::with_transport(host, Box::new(TcpTransport::with_timeout(timeout)))
    }

    pub fn with_transport(host: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            host: host.into(),
            session: HttpSession::new(transport),
            session_token: None,
        }
    }

    /// Token from the last successful login, if any.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Credential encoding the firmware's login page performs client-side:
    /// `Basic base64(user + ":" + md5hex(password))`. Not a security
    /// mechanism, just the scheme the device expects.
    pub fn format_auth(user: &str, password: &str) -> String {
        let digest = Md5::digest(password.as_bytes())
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect::<String>();
        let auth = BASE64_STANDARD.encode(format!("{}:{}", user, digest));
        format!("Basic {}", auth)
    }

    /// Pull the session token out of the login page's redirect script, e.g.
    /// `window.parent.location.href = "http://192.168.1.2/HLTBQVGBHHZTWXBB/userRpm/Index.htm"`.
    fn parse_session_token(&self, html: &str) -> Result<String> {
        let pattern = format!(r"http://{}/(.+)/userRpm/Index\.htm", regex::escape(&self.host));
        let regex = Regex::new(&pattern).expect("host is escaped, pattern is valid");
        regex
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str().to_string())
            .ok_or(Error::SessionTokenNotFound)
    }

    fn login_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("http://{}/userRpm/LoginRpm.htm", self.host))?;
        url.query_pairs_mut().append_pair("Save", "Save");
        Ok(url)
    }

    fn wifi_url(&self, token: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "http://{}/{}/userRpm/WlanNetworkRpm.htm",
            self.host, token
        ))?)
    }
}

impl Device for Wa901nd {
    fn login(&mut self, user: &str, password: &str) -> Result<()> {
        // Replaced only after the new login is verified; a rejected login
        // must not leave a stale token behind.
        self.session_token = None;

        self.session
            .set_cookie("Authorization", Self::format_auth(user, password));

        tracing::debug!(host = %self.host, "logging in");
        let url = self.login_url()?;
        let response = self.session.get(&url)?;

        if self.is_bad_login(&response) {
            return Err(Error::LoginFailed(
                "router rejected the credentials; check user and password".to_string(),
            ));
        }

        let token = self.parse_session_token(&response.body)?;
        tracing::debug!(host = %self.host, "login ok");
        self.session_token = Some(token);
        Ok(())
    }

    fn wifi_status(&mut self) -> Result<WifiStatus> {
        let token = self.session_token.clone().ok_or(Error::NotLoggedIn)?;
        let url = self.wifi_url(&token)?;
        let response = self.session.get(&url)?;

        // The firmware answers 200 with a "no authority" page when the token
        // is stale or fabricated.
        if response.status != 200
            || response
                .body
                .to_lowercase()
                .contains(Self::NO_AUTHORITY_MARKER)
        {
            return Err(Error::Unauthorized);
        }

        parse_wifi_status(&response.body)
    }

    fn wifi_turn_on(&mut self) -> Result<()> {
        // The save-settings request shape is undocumented for this firmware.
        Err(Error::NotImplemented("wifi_turn_on"))
    }

    fn wifi_turn_off(&mut self) -> Result<()> {
        Err(Error::NotImplemented("wifi_turn_off"))
    }
}

impl HttpDevice for Wa901nd {
    fn host(&self) -> &str {
        &self.host
    }

    fn session(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    fn is_bad_login(&self, response: &HttpResponse) -> bool {
        // A non-200 status alone is a failure; a 200 can still be one if the
        // page text says so.
        response.status != 200
            || response
                .body
                .to_lowercase()
                .contains(Self::BAD_LOGIN_MARKER)
    }
}

/// Decode the radio state from the settings page's `wlanPara` script array:
/// element 0 is the radio-enabled flag, element 1 the quoted SSID, element 2
/// the channel.
fn parse_wifi_status(html: &str) -> Result<WifiStatus> {
    let regex =
        Regex::new(r"var wlanPara = new Array\(\s*([^)]+?)\s*\)").expect("pattern is valid");
    let captures = regex
        .captures(html)
        .ok_or_else(|| Error::MalformedResponse("wireless settings block not found".to_string()))?;
    let fields = split_script_fields(&captures[1]);

    let enabled = fields
        .first()
        .map(|flag| flag == "1")
        .ok_or_else(|| Error::MalformedResponse("missing radio flag".to_string()))?;
    let ssid = fields
        .get(1)
        .map(|ssid| ssid.trim_matches('"').to_string())
        .ok_or_else(|| Error::MalformedResponse("missing ssid".to_string()))?;
    let channel = fields
        .get(2)
        .and_then(|channel| channel.parse::<u16>().ok())
        .ok_or_else(|| Error::MalformedResponse("missing channel".to_string()))?;

    Ok(WifiStatus {
        enabled,
        ssid,
        channel,
    })
}

/// Split a JavaScript argument list on commas, keeping quoted strings (the
/// SSID may contain a comma) in one piece.
fn split_script_fields(list: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for character in list.chars() {
        match character {
            '"' => {
                in_quotes = !in_quotes;
                current.push(character);
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(character),
        }
    }
    if !current.trim().is_empty() {
        fields.push(current.trim().to_string());
    }
    fields
}
