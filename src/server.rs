use crate::err::{AppliesTo, IoErrorExt, ServeError};
use crate::listing;
use crate::resolve::{self, Resource};
use crate::selector;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// The only failure text a client ever sees, whatever actually went wrong.
const NOT_FOUND: &[u8] = b"document not found";

pub async fn run(listen: &SocketAddr, root: PathBuf) -> Result<(), io::Error> {
    log::info!("Binding to {}", listen);
    let listener = TcpListener::bind(listen).await?;
    log::info!("Serving {}", root.display());
    serve(listener, root).await
}

/// Accept loop, one task per connection, unbounded. A listener-level accept
/// error is fatal to the whole service; aborted connections are just
/// dropped.
pub async fn serve(listener: TcpListener, root: PathBuf) -> Result<(), io::Error> {
    let root = Arc::new(root);
    loop {
        let stream = accept(&listener).await?;
        let root = Arc::clone(&root);
        tokio::spawn(async move {
            handle(stream, &root).await;
        });
    }
}

async fn accept(listener: &TcpListener) -> Result<TcpStream, io::Error> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                log::debug!("Connection from {}", addr);
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => match e.applies_to() {
                AppliesTo::Connection => log::debug!("Aborted connection dropped: {}", e),
                AppliesTo::Listener => return Err(e),
            },
        }
    }
}

/// One connection: read the selector line, write the response, close. The
/// socket is closed on every path when this returns.
async fn handle(stream: TcpStream, root: &Path) {
    let (reader, mut writer) = stream.into_split();

    // Selectors arrive as raw bytes up to the newline. A client that closes
    // early gets whatever prefix it sent treated as the selector.
    let mut line = Vec::new();
    let _ = BufReader::new(reader).read_until(b'\n', &mut line).await;
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    let selector = String::from_utf8_lossy(&line);

    if let Err(e) = respond(root, &selector, &mut writer).await {
        log::warn!("{:?} -> {}", selector, e);
        let _ = writer.write_all(NOT_FOUND).await;
    }
}

async fn respond(
    root: &Path,
    selector: &str,
    writer: &mut (impl AsyncWrite + Unpin),
) -> Result<(), ServeError> {
    let lookup = selector::normalize(selector);
    match resolve::resolve(root, lookup).await? {
        Resource::File(mut file) => {
            tokio::io::copy(&mut file, writer)
                .await
                .map_err(ServeError::Write)?;
        }
        Resource::Directory(dir) => {
            let body = listing::generate(&dir).await?;
            writer.write_all(&body).await.map_err(ServeError::Write)?;
        }
    }
    Ok(())
}
