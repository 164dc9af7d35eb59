use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::TcpStream;

use fetch_logging::{fetch_debug, fetch_trace};
use url::{Position, Url};

use super::{split_lines, Transport, TransportError};
use crate::{FetchSettings, HeaderMap};

const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Plain-TCP HTTP/1.1 client that sends one GET per connection.
#[derive(Debug, Clone)]
pub struct SocketTransport {
    settings: FetchSettings,
}

impl SocketTransport {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    /// Connects to the URL's host and port, trying each resolved address in turn.
    pub fn open_connection(&self, url: &Url) -> Result<TcpStream, TransportError> {
        if url.scheme() != "http" {
            return Err(TransportError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(TransportError::MissingHost(url.to_string()));
        }

        let addrs = url.socket_addrs(|| None).map_err(TransportError::Connect)?;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.settings.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.settings.request_timeout))?;
                    stream.set_write_timeout(Some(self.settings.request_timeout))?;
                    fetch_debug!("connected to {addr} for {url}");
                    return Ok(stream);
                }
                Err(err) => {
                    fetch_debug!("connect to {addr} failed: {err}");
                    last_err = Some(err);
                }
            }
        }

        Err(match last_err {
            Some(err) if is_timeout(&err) => TransportError::Timeout(self.settings.connect_timeout),
            Some(err) => TransportError::Connect(err),
            None => TransportError::Connect(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses resolved for {url}"),
            )),
        })
    }

    pub fn write_get_request<W: Write>(&self, writer: &mut W, url: &Url) -> io::Result<()> {
        let target = &url[Position::BeforePath..Position::AfterQuery];
        let target = if target.is_empty() { "/" } else { target };
        let host = url.host_str().unwrap_or_default();
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        write!(writer, "GET {target} HTTP/1.1\r\n")?;
        write!(writer, "Host: {host}\r\n")?;
        write!(writer, "User-Agent: {}\r\n", self.settings.user_agent)?;
        write!(writer, "Connection: close\r\n\r\n")?;
        writer.flush()
    }

    /// Reads the status line and header block up to the blank separator line.
    pub fn read_header_fields<R: BufRead>(&self, reader: &mut R) -> Result<HeaderMap, TransportError> {
        let status = self.read_line(reader)?.ok_or_else(|| {
            TransportError::Protocol("connection closed before status line".into())
        })?;
        if status.trim().is_empty() {
            return Err(TransportError::Protocol("empty status line".into()));
        }
        fetch_trace!("status line {status:?}");

        let mut headers = HeaderMap::with_status_line(status);
        let mut header_bytes = 0;
        loop {
            let line = self.read_line(reader)?.ok_or_else(|| {
                TransportError::Protocol("connection closed inside header block".into())
            })?;
            if line.is_empty() {
                break;
            }
            header_bytes += line.len();
            if header_bytes > MAX_HEADER_BYTES {
                return Err(TransportError::Protocol(format!(
                    "header block exceeds {MAX_HEADER_BYTES} bytes"
                )));
            }
            let (name, value) = line.split_once(':').ok_or_else(|| {
                TransportError::Protocol(format!("header line without colon: {line:?}"))
            })?;
            headers.insert(name.trim(), value.trim());
        }
        Ok(headers)
    }

    /// Reads the body framed by `Transfer-Encoding`, `Content-Length`, or EOF,
    /// in that order of precedence, and splits it into lines.
    pub fn read_content<R: BufRead>(
        &self,
        reader: &mut R,
        headers: &HeaderMap,
    ) -> Result<Vec<String>, TransportError> {
        let max_bytes = self.settings.max_bytes;
        let body = if is_chunked(headers) {
            self.read_chunked(reader)?
        } else if let Some(len) = content_length(headers)? {
            if len > max_bytes {
                return Err(TransportError::TooLarge {
                    max_bytes,
                    actual: Some(len),
                });
            }
            let mut body = vec![0; len as usize];
            reader.read_exact(&mut body).map_err(|err| {
                if err.kind() == io::ErrorKind::UnexpectedEof {
                    TransportError::Protocol(format!("body shorter than Content-Length {len}"))
                } else {
                    self.io_error(err)
                }
            })?;
            body
        } else {
            let mut body = Vec::new();
            (&mut *reader)
                .take(max_bytes.saturating_add(1))
                .read_to_end(&mut body)
                .map_err(|err| self.io_error(err))?;
            if body.len() as u64 > max_bytes {
                return Err(TransportError::TooLarge {
                    max_bytes,
                    actual: None,
                });
            }
            body
        };
        Ok(split_lines(&body))
    }

    fn read_chunked<R: BufRead>(&self, reader: &mut R) -> Result<Vec<u8>, TransportError> {
        let max_bytes = self.settings.max_bytes;
        let mut body = Vec::new();
        loop {
            let size_line = self.read_line(reader)?.ok_or_else(|| {
                TransportError::Protocol("connection closed inside chunked body".into())
            })?;
            let size_hex = size_line.split(';').next().unwrap_or_default().trim();
            let size = u64::from_str_radix(size_hex, 16).map_err(|_| {
                TransportError::Protocol(format!("invalid chunk size {size_hex:?}"))
            })?;
            if size == 0 {
                // Trailer fields are read and discarded.
                while let Some(line) = self.read_line(reader)? {
                    if line.is_empty() {
                        break;
                    }
                }
                return Ok(body);
            }

            let next_len = (body.len() as u64).checked_add(size);
            match next_len {
                Some(next_len) if next_len <= max_bytes => {}
                actual => return Err(TransportError::TooLarge { max_bytes, actual }),
            }
            let start = body.len();
            body.resize(start + size as usize, 0);
            reader
                .read_exact(&mut body[start..])
                .map_err(|err| self.io_error(err))?;
            self.read_line(reader)?;
        }
    }

    fn read_line<R: BufRead>(&self, reader: &mut R) -> Result<Option<String>, TransportError> {
        let mut buf = Vec::new();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| self.io_error(err))?;
        if read == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    fn io_error(&self, err: io::Error) -> TransportError {
        if is_timeout(&err) {
            TransportError::Timeout(self.settings.request_timeout)
        } else {
            TransportError::Io(err)
        }
    }
}

impl Transport for SocketTransport {
    fn fetch_url(&self, url: &Url) -> Result<HeaderMap, TransportError> {
        let stream = self.open_connection(url)?;
        {
            let mut writer = BufWriter::new(&stream);
            self.write_get_request(&mut writer, url)
                .map_err(|err| self.io_error(err))?;
        }

        let mut reader = BufReader::new(&stream);
        let mut headers = self.read_header_fields(&mut reader)?;
        let content = self.read_content(&mut reader, &headers)?;
        fetch_debug!(
            "{url}: {:?} with {} body lines",
            headers.status_line().unwrap_or_default(),
            content.len()
        );
        headers.set_content(content);
        Ok(headers)
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers.get("Transfer-Encoding").is_some_and(|values| {
        values
            .iter()
            .any(|value| value.to_ascii_lowercase().contains("chunked"))
    })
}

fn content_length(headers: &HeaderMap) -> Result<Option<u64>, TransportError> {
    headers
        .first("Content-Length")
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| {
                TransportError::Protocol(format!("invalid Content-Length {value:?}"))
            })
        })
        .transpose()
}
