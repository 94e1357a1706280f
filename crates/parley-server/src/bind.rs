use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

const LOWEST_FALLBACK_PORT: u16 = 1024;

/// Ports 1024 through 65535, the most a fallback probe visits
const FALLBACK_CYCLE: u32 = 64_512;

/// Bind `addr`, probing upward for a free port while it is taken
///
/// Probing wraps from 65535 to 1024 and stops after one full cycle. Any
/// error other than `AddrInUse` is returned immediately.
pub async fn bind_with_fallback(addr: SocketAddr, fallback: bool) -> io::Result<TcpListener> {
    let mut candidate = addr;

    for _ in 0..FALLBACK_CYCLE {
        match TcpListener::bind(candidate).await {
            Ok(listener) => {
                if candidate.port() != addr.port() {
                    tracing::warn!(requested = addr.port(), port = candidate.port(), "requested port in use");
                }
                return Ok(listener);
            }
            Err(e) if fallback && e.kind() == io::ErrorKind::AddrInUse => {
                tracing::debug!(port = candidate.port(), "port in use, trying the next one");
                candidate.set_port(next_port(candidate.port()));
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("no free port found starting from {}", addr.port()),
    ))
}

const fn next_port(port: u16) -> u16 {
    if port == u16::MAX { LOWEST_FALLBACK_PORT } else { port + 1 }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn wraps_to_lowest_port() {
        assert_eq!(next_port(65535), 1024);
        assert_eq!(next_port(8080), 8081);
    }

    #[test]
    fn cycle_covers_every_unprivileged_port() {
        assert_eq!(FALLBACK_CYCLE, u32::from(u16::MAX - LOWEST_FALLBACK_PORT) + 1);
    }

    #[tokio::test]
    async fn free_port_is_used_as_is() {
        let listener = bind_with_fallback(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), true).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn taken_port_falls_back() {
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = taken.local_addr().unwrap();

        let listener = bind_with_fallback(addr, true).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), addr.port());
    }

    #[tokio::test]
    async fn taken_port_without_fallback_fails() {
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = bind_with_fallback(addr, false).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }
}
