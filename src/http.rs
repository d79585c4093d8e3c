use core::fmt::Write as _;
use core::ops::Range;

use embassy_net::Stack;
use embassy_time::{with_timeout, Duration, Timer};
use heapless::String;

use door_core::http::{
    body_range, find_header_end, parse_response_head, write_post_head, HttpError, ResponseHead,
};

use crate::config::ServerEndpoint;
use crate::constants::{
    HTTP_CONNECT_ATTEMPTS, HTTP_HEAD_BUFFER_SIZE, HTTP_RETRY_DELAY_MS, RX_BUFFER_SIZE,
    TX_BUFFER_SIZE, USER_AGENT,
};
use crate::transport::{self, Transport};

const MAX_PATH_LEN: usize = 128;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    Transport(transport::Error),
    #[allow(dead_code)]
    Http(HttpError),
    PathTooLong,
    ResponseTooLarge,
    IncompleteResponse,
    Timeout,
}

pub struct Response<'b> {
    pub head: ResponseHead,
    pub body: &'b [u8],
}

/// Minimal HTTP/1.1 client: one `Connection: close` request per exchange
pub struct HttpClient {
    stack: Stack<'static>,
    rx_buffer: &'static mut [u8; RX_BUFFER_SIZE],
    tx_buffer: &'static mut [u8; TX_BUFFER_SIZE],
    server: ServerEndpoint<'static>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8; RX_BUFFER_SIZE],
        tx_buffer: &'static mut [u8; TX_BUFFER_SIZE],
        server: ServerEndpoint<'static>,
        timeout_ms: u32,
    ) -> Self {
        Self {
            stack,
            rx_buffer,
            tx_buffer,
            server,
            timeout: Duration::from_millis(timeout_ms.into()),
        }
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }

    /// POST `body` as JSON to `path` (relative to the server base path). The
    /// whole exchange, retries included, is bounded by the HTTP timeout.
    pub async fn post_json<'b>(
        &mut self,
        path: &str,
        body: &[u8],
        response: &'b mut [u8],
    ) -> Result<Response<'b>, Error> {
        let timeout = self.timeout;
        let (head, range) = with_timeout(timeout, self.post_with_retry(path, body, response))
            .await
            .map_err(|_| Error::Timeout)??;

        let response: &'b [u8] = response;
        Ok(Response {
            head,
            body: &response[range],
        })
    }

    async fn post_with_retry(
        &mut self,
        path: &str,
        body: &[u8],
        response: &mut [u8],
    ) -> Result<(ResponseHead, Range<usize>), Error> {
        let mut attempt = 1;
        loop {
            match self.exchange(path, body, response).await {
                Err(Error::Transport(e @ transport::Error::SocketConnectionError(_)))
                    if attempt < HTTP_CONNECT_ATTEMPTS =>
                {
                    log::warn!(
                        "Request to {} failed: {:?}. Retrying ({}/{})...",
                        path,
                        e,
                        attempt,
                        HTTP_CONNECT_ATTEMPTS
                    );
                    Timer::after(Duration::from_millis(HTTP_RETRY_DELAY_MS)).await;
                }
                result => return result,
            }
            attempt += 1;
        }
    }

    async fn exchange(
        &mut self,
        path: &str,
        body: &[u8],
        response: &mut [u8],
    ) -> Result<(ResponseHead, Range<usize>), Error> {
        let mut full_path: String<MAX_PATH_LEN> = String::new();
        write!(full_path, "{}{}", self.server.base_path, path).map_err(|_| Error::PathTooLong)?;

        let mut head: String<HTTP_HEAD_BUFFER_SIZE> = String::new();
        write_post_head(
            &mut head,
            self.server.host,
            self.server.port,
            &full_path,
            body.len(),
            USER_AGENT,
        )
        .map_err(Error::Http)?;

        let mut transport = Transport::connect(
            self.stack,
            &mut self.rx_buffer[..],
            &mut self.tx_buffer[..],
            &self.server,
            self.timeout,
        )
        .await
        .map_err(Error::Transport)?;

        log::debug!("POST {} ({} bytes)", full_path, body.len());
        transport
            .write_all(head.as_bytes())
            .await
            .map_err(Error::Transport)?;
        transport.write_all(body).await.map_err(Error::Transport)?;
        transport.flush().await.map_err(Error::Transport)?;

        let result = read_response(&mut transport, response).await;
        transport.close();
        result
    }
}

async fn read_response(
    transport: &mut Transport<'_>,
    response: &mut [u8],
) -> Result<(ResponseHead, Range<usize>), Error> {
    let mut filled = 0;
    // parsed head, its length and where a Content-Length body ends
    let mut head: Option<(ResponseHead, usize, Option<usize>)> = None;

    loop {
        if let Some((_, _, Some(end))) = head {
            if filled >= end {
                break;
            }
        }
        if filled == response.len() {
            return Err(Error::ResponseTooLarge);
        }

        let n = match transport.read(&mut response[filled..]).await {
            Ok(n) => n,
            // some servers reset instead of closing once the body is out
            Err(e) if head.is_some() => {
                log::debug!("Read ended with {:?}", e);
                0
            }
            Err(e) => return Err(Error::Transport(e)),
        };
        if n == 0 {
            break;
        }
        filled += n;

        if head.is_none() {
            if let Some(start) = find_header_end(&response[..filled]) {
                let parsed = parse_response_head(&response[..start]).map_err(Error::Http)?;
                let end = parsed
                    .body_end(start, response.len())
                    .map_err(Error::Http)?;
                head = Some((parsed, start, end));
            }
        }
    }

    let (head, start, _) = head.ok_or(Error::IncompleteResponse)?;
    let range = body_range(&head, start, &mut response[..filled]).map_err(Error::Http)?;
    Ok((head, range))
}
