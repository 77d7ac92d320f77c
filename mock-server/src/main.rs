use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = match std::env::var("PORT") {
        Ok(raw) => raw.parse().map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("bad PORT: {raw}"))
        })?,
        Err(_) => DEFAULT_PORT,
    };
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
    println!("mock server on http://{}", listener.local_addr()?);
    mock_server::run(listener).await
}
