use embassy_net::{
    dns::{DnsQueryType, Error as DNSError},
    tcp::{ConnectError, Error as TcpError, TcpSocket},
    IpAddress, Stack,
};
use embassy_time::Duration;
use embedded_io_async::Write;

use crate::config::ServerEndpoint;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    DNSQueryFailed(DNSError),
    DNSLookupFailed,
    #[allow(dead_code)]
    SocketConnectionError(ConnectError),
    #[allow(dead_code)]
    Write(TcpError),
    #[allow(dead_code)]
    Read(TcpError),
}

/// Plain TCP connection to the access-control server. The server only speaks
/// HTTP, there is no TLS layer.
pub struct Transport<'a> {
    socket: TcpSocket<'a>,
}

impl<'a> Transport<'a> {
    pub async fn connect(
        stack: Stack<'static>,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
        server: &ServerEndpoint<'_>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
        socket.set_timeout(Some(timeout));

        let addr = match server.ip() {
            Some(ip) => IpAddress::Ipv4(ip),
            None => stack
                .dns_query(server.host, DnsQueryType::A)
                .await
                .map_err(Error::DNSQueryFailed)?
                .first()
                .copied()
                .ok_or(Error::DNSLookupFailed)?,
        };

        log::debug!("Connecting TCP socket to {}:{}", server.host, server.port);
        socket
            .connect((addr, server.port))
            .await
            .map_err(Error::SocketConnectionError)?;
        log::debug!("TCP connected");

        Ok(Self { socket })
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.socket.write_all(buf).await.map_err(Error::Write)
    }

    pub async fn flush(&mut self) -> Result<(), Error> {
        self.socket.flush().await.map_err(Error::Write)
    }

    /// Read into `buf`; `Ok(0)` once the server closed its side
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.socket.read(buf).await.map_err(Error::Read)
    }

    pub fn close(mut self) {
        self.socket.close();
    }
}
