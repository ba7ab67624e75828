use std::net::TcpListener;
use std::sync::atomic::{AtomicU16, Ordering};

const FIRST_PORT: u16 = 9222;
const LAST_PORT: u16 = 65500;

static CDP_PORT_COUNTER: AtomicU16 = AtomicU16::new(FIRST_PORT);

/// Allocate a remote-debugging port for one browser.
///
/// Walks upward from 9222 so concurrent scenarios never share a port, and
/// skips ports something else already listens on.
pub fn allocate_cdp_port() -> u16 {
    for _ in 0..256 {
        let port = next_port();
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return port;
        }
        tracing::debug!("CDP port {} busy, skipping", port);
    }
    next_port()
}

fn next_port() -> u16 {
    let port = CDP_PORT_COUNTER.fetch_add(1, Ordering::SeqCst);
    if port > LAST_PORT {
        CDP_PORT_COUNTER.store(FIRST_PORT + 1, Ordering::SeqCst);
        return FIRST_PORT;
    }
    port
}
