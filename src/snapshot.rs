//! Remote home-directory snapshot: fetch and unpack.
//!
//! One GET against a fixed URL, no auth, no retries, no alternate mirrors.
//! The archive bytes are unpacked straight into the sandbox home and not
//! retained.

use tracing::{error, info};

use crate::error::LaunchError;
use crate::sandbox::{ArchiveFormat, Sandbox};

/// Fetch the snapshot archive from `url`.
pub async fn fetch_snapshot(url: &str) -> Result<Vec<u8>, LaunchError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| LaunchError::Network(format!("GET {url}: {e}")))?
        .error_for_status()
        .map_err(|e| LaunchError::Network(format!("GET {url}: {e}")))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| LaunchError::Network(format!("reading body of {url}: {e}")))?;

    Ok(bytes.to_vec())
}

/// Fetch the snapshot and unpack it into the sandbox home.
///
/// Fetch and unpack failures are logged with a fixed diagnostic and then
/// propagated; there is no fallback source.
pub async fn load_home_snapshot<S: Sandbox>(sandbox: &mut S, url: &str) -> Result<(), LaunchError> {
    let result = async {
        let bytes = fetch_snapshot(url).await?;
        info!(bytes = bytes.len(), "Fetched home snapshot");
        sandbox.unpack_archive(&bytes, ArchiveFormat::Zip)
    }
    .await;

    if let Err(e) = &result {
        error!(error = %e, "Failed to fetch or unpack home snapshot");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_url_is_network_error() {
        // Port 1 is never listening
        let err = fetch_snapshot("http://127.0.0.1:1/home.zip").await.unwrap_err();
        assert!(matches!(err, LaunchError::Network(_)));
    }

    #[tokio::test]
    async fn http_error_status_is_network_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
            }
        });

        let err = fetch_snapshot(&format!("http://{addr}/home.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::Network(_)));
    }
}
