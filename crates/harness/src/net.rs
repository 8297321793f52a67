//! Local TCP helpers: port availability, raw HTTP requests, socket reads

use socket2::{Domain, SockAddr, Socket, Type};
use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::{debug, error};

use sysio_harness_common::Result;

/// Per-read timeout used by [`read_socket_data`]
pub const SOCKET_READ_TIMEOUT: Duration = Duration::from_secs(1);

const READ_CHUNK: usize = 64;

/// Check that every port can be bound for listening on 127.0.0.1.
///
/// Stops at the first port that cannot be bound and returns false. Each
/// probe socket is closed before moving on.
pub fn are_ports_available(ports: impl IntoIterator<Item = u16>) -> bool {
    for port in ports {
        debug!("Checking if port {} is available.", port);
        match bind_probe(port) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                error!("ERROR: Port {} is already in use", port);
                return false;
            }
            Err(e) => {
                error!(
                    "ERROR: Unknown exception while trying to listen on port {}: {}",
                    port, e
                );
                return false;
            }
        }
    }
    true
}

fn bind_probe(port: u16) -> io::Result<()> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    socket.bind(&SockAddr::from(addr))
}

/// Raw HTTP/1.1 POST request text for `api_call` with `body`
pub fn make_http_request(host: &str, port: u16, api_call: &str, body: &str, keep_alive: bool) -> String {
    let body = format!("{}\r\n", body);
    let connection = if keep_alive { "Keep-Alive" } else { "Close" };
    format!(
        "POST {} HTTP/1.1\r\nHost: {}:{}\r\ncontent-length: {}\r\nAccept: */*\r\nConnection: {}\r\n\r\n{}",
        api_call,
        host,
        port,
        body.len(),
        connection,
        body
    )
}

/// Read from `stream` until `max_size` bytes arrived, a read comes back
/// short, or a read times out.
///
/// Returns `None` only if not a single read completed.
pub fn read_socket_data(stream: &TcpStream, max_size: usize) -> Result<Option<Vec<u8>>> {
    stream.set_read_timeout(Some(SOCKET_READ_TIMEOUT))?;
    let mut reader = stream;
    let mut remaining = max_size;
    let mut data: Option<Vec<u8>> = None;
    let mut buf = [0u8; READ_CHUNK];

    while remaining > 0 {
        let want = remaining.min(READ_CHUNK);
        match reader.read(&mut buf[..want]) {
            Ok(n) => {
                remaining -= n;
                data.get_or_insert_with(Vec::new).extend_from_slice(&buf[..n]);
                if n != want {
                    break;
                }
            }
            Err(e) => {
                debug!("socket read stopped: {}", e);
                break;
            }
        }
    }
    Ok(data)
}

/// [`read_socket_data`] decoded as UTF-8
pub fn read_socket_data_str(stream: &TcpStream, max_size: usize) -> Result<Option<String>> {
    match read_socket_data(stream, max_size)? {
        Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
        None => Ok(None),
    }
}
