#![allow(dead_code)]

pub mod config;
pub mod mock_gemini;
pub mod mock_inference;

use std::net::SocketAddr;

/// Address with nothing listening, for transport failure tests
pub async fn closed_addr() -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}
