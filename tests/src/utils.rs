use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdListener};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener: StdListener = StdListener::bind((LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

/// Starts accepting on `port` once `delay` has passed.
pub fn delayed_listener(port: u16, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener: TcpListener = TcpListener::bind(SocketAddr::from((LOCALHOST, port)))
            .await
            .unwrap();
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    })
}
