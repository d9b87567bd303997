//! Minimal blocking HTTP plumbing for talking to router firmware.
//!
//! These pages predate anything resembling a well-behaved web API, so the
//! client stays equally primitive: one GET per TCP connection, response read
//! to EOF, body treated as text. [`Transport`] is the seam test code swaps
//! out for canned responses.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use cookie::{Cookie, CookieJar};
use httparse::Status;
use url::Url;

use crate::error::Error;
use crate::Result;

/// What a firmware page gives us back: a status code and a text body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Issues a single GET request. Implemented by [`TcpTransport`] for real
/// devices and by fakes in tests.
pub trait Transport {
    fn get(&mut self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse>;
}

/// Blocking HTTP/1.0 GET over a fresh TCP connection per request.
///
/// HTTP/1.0 so the firmware closes the connection and reading to EOF
/// terminates. An optional timeout covers connect, read and write.
#[derive(Debug, Default)]
pub struct TcpTransport {
    timeout: Option<Duration>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn connect(&self, url: &Url) -> Result<TcpStream> {
        let addrs = url.socket_addrs(|| Some(80))?;
        let addr = addrs
            .first()
            .ok_or_else(|| Error::MalformedResponse(format!("no address for {url}")))?;
        let stream = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        Ok(stream)
    }
}

impl Transport for TcpTransport {
    fn get(&mut self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut stream = self.connect(url)?;

        let host = url
            .host_str()
            .ok_or_else(|| Error::MalformedResponse(format!("url has no host: {url}")))?;
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let mut lines = vec![
            format!("GET {} HTTP/1.0", target),
            format!("Host: {}", host),
            "User-Agent: wifictl/0.1.0".to_string(),
            "Accept: */*".to_string(),
        ];
        for (name, value) in headers {
            lines.push(format!("{}: {}", name, value));
        }
        lines.push(String::new());
        lines.push(String::new());
        let request = lines.join("\r\n");

        stream.write_all(request.as_bytes())?;
        stream.flush()?;

        let mut payload = Vec::new();
        stream.read_to_end(&mut payload)?;

        let mut header_buf = [httparse::EMPTY_HEADER; 64];
        let mut response = httparse::Response::new(&mut header_buf);
        let size = match response.parse(&payload)? {
            Status::Complete(size) => size,
            Status::Partial => {
                return Err(Error::MalformedResponse(
                    "truncated response head".to_string(),
                ))
            }
        };
        let status = response
            .code
            .ok_or_else(|| Error::MalformedResponse("response without status code".to_string()))?;
        let body = String::from_utf8_lossy(&payload[size..]).into_owned();

        Ok(HttpResponse { status, body })
    }
}

/// Cookie-bearing session owned by exactly one device instance.
///
/// The jar is sent as a `Cookie` header on every request; WA901ND-era
/// firmware recognizes the session purely from the client-set
/// `Authorization` cookie, so nothing from the response is fed back in.
pub struct HttpSession {
    transport: Box<dyn Transport>,
    jar: CookieJar,
}

impl HttpSession {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            jar: CookieJar::new(),
        }
    }

    /// Set (or replace) a cookie sent with every subsequent request.
    pub fn set_cookie(&mut self, name: &str, value: String) {
        self.jar.add(Cookie::new(name.to_string(), value));
    }

    pub fn get(&mut self, url: &Url) -> Result<HttpResponse> {
        let mut headers = Vec::new();
        let cookies = self
            .jar
            .iter()
            .map(|cookie| cookie.encoded().stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        if !cookies.is_empty() {
            headers.push(("Cookie".to_string(), cookies));
        }
        tracing::debug!(%url, "GET");
        self.transport.get(url, &headers)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use url::Url;

    use super::{HttpResponse, Transport};
    use crate::Result;

    pub(crate) type RequestLog = Rc<RefCell<Vec<(String, Vec<(String, String)>)>>>;

    /// Replays canned responses in order and logs every request, so tests can
    /// inspect what was sent even after the transport is boxed into a device.
    pub(crate) struct FakeTransport {
        responses: VecDeque<HttpResponse>,
        log: RequestLog,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self {
                responses: VecDeque::new(),
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub(crate) fn single(status: u16, body: &str) -> Self {
            let mut transport = Self::new();
            transport.push(status, body);
            transport
        }

        pub(crate) fn push(&mut self, status: u16, body: &str) {
            self.responses.push_back(HttpResponse {
                status,
                body: body.to_string(),
            });
        }

        pub(crate) fn log(&self) -> RequestLog {
            Rc::clone(&self.log)
        }
    }

    impl Transport for FakeTransport {
        fn get(&mut self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse> {
            self.log.borrow_mut().push((url.to_string(), headers.to_vec()));
            Ok(self
                .responses
                .pop_front()
                .expect("FakeTransport ran out of canned responses"))
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::testing::FakeTransport;
    use super::HttpSession;

    #[test]
    fn session_sends_cookies_percent_encoded() {
        let transport = FakeTransport::single(200, "");
        let log = transport.log();
        let mut session = HttpSession::new(Box::new(transport));
        session.set_cookie("Authorization", "Basic abc def".to_string());

        let url = Url::parse("http://192.168.1.2/userRpm/LoginRpm.htm").unwrap();
        session.get(&url).unwrap();

        let requests = log.borrow();
        let (_, headers) = &requests[0];
        assert_eq!(
            headers,
            &vec![(
                "Cookie".to_string(),
                "Authorization=Basic%20abc%20def".to_string()
            )]
        );
    }

    #[test]
    fn session_without_cookies_sends_no_cookie_header() {
        let transport = FakeTransport::single(200, "ok");
        let log = transport.log();
        let mut session = HttpSession::new(Box::new(transport));

        let url = Url::parse("http://192.168.1.2/userRpm/LoginRpm.htm").unwrap();
        let response = session.get(&url).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");

        let requests = log.borrow();
        assert!(requests[0].1.is_empty());
    }
}
