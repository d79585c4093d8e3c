use core::fmt::{self, Write};
use core::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    HeadTooLarge,
    MalformedStatusLine,
    MalformedHeader,
    InvalidContentLength,
    MalformedChunk,
    /// Content-Length beyond what the response buffer holds
    BodyTooLarge,
    /// Connection closed before Content-Length bytes arrived
    IncompleteBody,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeadTooLarge => write!(f, "request head does not fit the buffer"),
            Self::MalformedStatusLine => write!(f, "malformed status line"),
            Self::MalformedHeader => write!(f, "malformed header line"),
            Self::InvalidContentLength => write!(f, "invalid Content-Length"),
            Self::MalformedChunk => write!(f, "malformed chunked body"),
            Self::BodyTooLarge => write!(f, "body larger than the response buffer"),
            Self::IncompleteBody => write!(f, "body shorter than its Content-Length"),
        }
    }
}

/// Write the head of a `POST` carrying a JSON body of `content_length` bytes.
/// The port is left out of the `Host` header when it is the HTTP default.
pub fn write_post_head<W: Write>(
    w: &mut W,
    host: &str,
    port: u16,
    path: &str,
    content_length: usize,
    user_agent: &str,
) -> Result<(), HttpError> {
    write_post_head_inner(w, host, port, path, content_length, user_agent)
        .map_err(|_| HttpError::HeadTooLarge)
}

fn write_post_head_inner<W: Write>(
    w: &mut W,
    host: &str,
    port: u16,
    path: &str,
    content_length: usize,
    user_agent: &str,
) -> fmt::Result {
    write!(w, "POST {path} HTTP/1.1\r\n")?;
    if port == 80 {
        write!(w, "Host: {host}\r\n")?;
    } else {
        write!(w, "Host: {host}:{port}\r\n")?;
    }
    write!(w, "User-Agent: {user_agent}\r\n")?;
    w.write_str("Accept: application/json\r\n")?;
    w.write_str("Content-Type: application/json\r\n")?;
    write!(w, "Content-Length: {content_length}\r\n")?;
    w.write_str("Connection: close\r\n\r\n")
}

/// Offset of the first body byte, once the blank line ending the head has
/// been received
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_length: Option<usize>,
    pub chunked: bool,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Where a Content-Length delimited body starting at `start` ends, in a
    /// buffer of `capacity` bytes. `None` when the body runs until the
    /// connection closes.
    pub fn body_end(&self, start: usize, capacity: usize) -> Result<Option<usize>, HttpError> {
        match self.content_length {
            Some(len) if !self.chunked => start
                .checked_add(len)
                .filter(|end| *end <= capacity)
                .map(Some)
                .ok_or(HttpError::BodyTooLarge),
            _ => Ok(None),
        }
    }
}

/// Locate the body of a response once everything has been received into
/// `buf`, decoding a chunked body in place. `start` is the end of the head.
pub fn body_range(
    head: &ResponseHead,
    start: usize,
    buf: &mut [u8],
) -> Result<Range<usize>, HttpError> {
    let received = buf.get_mut(start..).ok_or(HttpError::IncompleteBody)?;
    let len = if head.chunked {
        decode_chunked(received)?
    } else {
        match head.content_length {
            Some(len) if len > received.len() => return Err(HttpError::IncompleteBody),
            Some(len) => len,
            None => received.len(),
        }
    };
    // len never exceeds what follows start
    Ok(start..start + len)
}

/// Parse the status line and the headers this client cares about.
/// `head` is everything before the body, as located by [`find_header_end`].
pub fn parse_response_head(head: &[u8]) -> Result<ResponseHead, HttpError> {
    let head = core::str::from_utf8(head).map_err(|_| HttpError::MalformedStatusLine)?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().ok_or(HttpError::MalformedStatusLine)?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().ok_or(HttpError::MalformedStatusLine)?;
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::MalformedStatusLine);
    }
    let status = parts
        .next()
        .filter(|code| code.len() == 3)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(HttpError::MalformedStatusLine)?;

    let mut response = ResponseHead {
        status,
        content_length: None,
        chunked: false,
    };

    for line in lines.filter(|line| !line.is_empty()) {
        let (name, value) = line.split_once(':').ok_or(HttpError::MalformedHeader)?;
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            let length = value
                .parse::<usize>()
                .map_err(|_| HttpError::InvalidContentLength)?;
            response.content_length = Some(length);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            response.chunked = value
                .rsplit(',')
                .next()
                .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        }
    }

    Ok(response)
}

/// Decode a complete chunked body in place, returning the decoded length.
pub fn decode_chunked(body: &mut [u8]) -> Result<usize, HttpError> {
    let mut read = 0;
    let mut written = 0;

    loop {
        let line_end = body[read..]
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or(HttpError::MalformedChunk)?
            + read;
        let size_line =
            core::str::from_utf8(&body[read..line_end]).map_err(|_| HttpError::MalformedChunk)?;
        // chunk extensions follow a ';'
        let size_field = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_field, 16).map_err(|_| HttpError::MalformedChunk)?;
        read = line_end + 2;

        if size == 0 {
            return Ok(written);
        }

        let chunk_end = read.checked_add(size).ok_or(HttpError::MalformedChunk)?;
        let trailer_end = chunk_end.checked_add(2).ok_or(HttpError::MalformedChunk)?;
        if body.get(chunk_end..trailer_end) != Some(&b"\r\n"[..]) {
            return Err(HttpError::MalformedChunk);
        }
        body.copy_within(read..chunk_end, written);
        written += size;
        read = trailer_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    #[test]
    fn post_head_layout() {
        let mut head: String<256> = String::new();
        write_post_head(
            &mut head,
            "192.168.178.27",
            3005,
            "/tags/validate",
            42,
            "nfc-door-client/0.1.0",
        )
        .unwrap();
        assert_eq!(
            head.as_str(),
            "POST /tags/validate HTTP/1.1\r\n\
             Host: 192.168.178.27:3005\r\n\
             User-Agent: nfc-door-client/0.1.0\r\n\
             Accept: application/json\r\n\
             Content-Type: application/json\r\n\
             Content-Length: 42\r\n\
             Connection: close\r\n\r\n"
        );
    }

    #[test]
    fn default_port_is_omitted_from_host() {
        let mut head: String<256> = String::new();
        write_post_head(&mut head, "doors.local", 80, "/api/alarm/tamper", 0, "x").unwrap();
        assert!(head.contains("Host: doors.local\r\n"));
        assert!(head.starts_with("POST /api/alarm/tamper HTTP/1.1\r\n"));
    }

    #[test]
    fn head_overflow_is_reported() {
        let mut head: String<32> = String::new();
        assert_eq!(
            write_post_head(&mut head, "doors.local", 80, "/tags/validate", 10, "x"),
            Err(HttpError::HeadTooLarge)
        );
    }

    #[test]
    fn response_head_of_nest_reply() {
        let raw = b"HTTP/1.1 201 Created\r\nX-Powered-By: Express\r\n\
                    Content-Type: application/json; charset=utf-8\r\n\
                    Content-Length: 27\r\nConnection: close\r\n\r\n\
                    {\"allowed\":true,\"doorId\":1}";
        let body_start = find_header_end(raw).unwrap();
        assert_eq!(&raw[body_start..], b"{\"allowed\":true,\"doorId\":1}");

        let head = parse_response_head(&raw[..body_start]).unwrap();
        assert_eq!(head.status, 201);
        assert!(head.is_success());
        assert_eq!(head.content_length, Some(27));
        assert!(!head.chunked);
    }

    #[test]
    fn error_status_and_chunked() {
        let head = parse_response_head(
            b"HTTP/1.1 400 Bad Request\r\ntransfer-encoding: gzip, chunked\r\n\r\n",
        )
        .unwrap();
        assert_eq!(head.status, 400);
        assert!(!head.is_success());
        assert!(head.chunked);
        assert_eq!(head.content_length, None);
    }

    #[test]
    fn malformed_heads() {
        assert_eq!(
            parse_response_head(b"SIP/2.0 200 OK\r\n\r\n"),
            Err(HttpError::MalformedStatusLine)
        );
        assert_eq!(
            parse_response_head(b"HTTP/1.1 2000 OK\r\n\r\n"),
            Err(HttpError::MalformedStatusLine)
        );
        assert_eq!(
            parse_response_head(b"HTTP/1.1 200 OK\r\nbroken header\r\n\r\n"),
            Err(HttpError::MalformedHeader)
        );
        assert_eq!(
            parse_response_head(b"HTTP/1.1 200 OK\r\nContent-Length: many\r\n\r\n"),
            Err(HttpError::InvalidContentLength)
        );
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n"), None);
    }

    #[test]
    fn chunked_body_is_reassembled() {
        let mut body = *b"7\r\n{\"allow\r\n15;ext=1\r\ned\":false,\"doorId\":3}\r\n0\r\n\r\n";
        let n = decode_chunked(&mut body).unwrap();
        assert_eq!(&body[..n], b"{\"allowed\":false,\"doorId\":3}");
    }

    #[test]
    fn truncated_chunk_is_rejected() {
        let mut body = *b"10\r\nshort\r\n";
        assert_eq!(decode_chunked(&mut body), Err(HttpError::MalformedChunk));
        let mut body = *b"zz\r\n";
        assert_eq!(decode_chunked(&mut body), Err(HttpError::MalformedChunk));
    }

    #[test]
    fn chunk_size_near_usize_max_is_rejected() {
        let mut body = *b"FFFFFFFFFFFFFFED\r\n";
        assert_eq!(decode_chunked(&mut body), Err(HttpError::MalformedChunk));
        let mut body = *b"FFFFFFFFFFFFFFFF\r\nabc\r\n";
        assert_eq!(decode_chunked(&mut body), Err(HttpError::MalformedChunk));
    }

    fn head(content_length: Option<usize>, chunked: bool) -> ResponseHead {
        ResponseHead {
            status: 201,
            content_length,
            chunked,
        }
    }

    #[test]
    fn content_length_must_fit_the_buffer() {
        let huge = parse_response_head(
            b"HTTP/1.1 201 Created\r\nContent-Length: 18446744073709551615\r\n\r\n",
        );
        // too large for usize on 32 bit targets, accepted on 64 bit hosts
        if let Ok(huge) = huge {
            assert_eq!(huge.body_end(40, 512), Err(HttpError::BodyTooLarge));
        }
        assert_eq!(
            head(Some(usize::MAX), false).body_end(40, 512),
            Err(HttpError::BodyTooLarge)
        );
        assert_eq!(
            head(Some(473), false).body_end(40, 512),
            Err(HttpError::BodyTooLarge)
        );
        assert_eq!(head(Some(472), false).body_end(40, 512), Ok(Some(512)));
        assert_eq!(head(Some(10), false).body_end(40, 512), Ok(Some(50)));
        assert_eq!(head(None, false).body_end(40, 512), Ok(None));
        assert_eq!(head(Some(10), true).body_end(40, 512), Ok(None));
    }

    #[test]
    fn body_range_by_framing() {
        let mut buf = *b"HEAD{\"allowed\":true}trailing";
        assert_eq!(body_range(&head(Some(16), false), 4, &mut buf), Ok(4..20));
        assert_eq!(body_range(&head(None, false), 4, &mut buf), Ok(4..buf.len()));
        assert_eq!(
            body_range(&head(Some(100), false), 4, &mut buf),
            Err(HttpError::IncompleteBody)
        );
        assert_eq!(
            body_range(&head(Some(usize::MAX), false), 4, &mut buf),
            Err(HttpError::IncompleteBody)
        );
        assert_eq!(
            body_range(&head(None, false), buf.len() + 1, &mut buf),
            Err(HttpError::IncompleteBody)
        );

        let mut buf = *b"HEAD4\r\nabcd\r\n0\r\n\r\n";
        let range = body_range(&head(None, true), 4, &mut buf).unwrap();
        assert_eq!(range, 4..8);
        assert_eq!(&buf[range], b"abcd");
    }

    #[test]
    fn success_statuses() {
        assert!(head(None, false).is_success());
        assert!(!ResponseHead {
            status: 302,
            ..head(None, false)
        }
        .is_success());
    }
}
