//! Server network layer handling TCP connections and the lobby message loop

use crate::client_manager::{ConnectionId, LineSender};
use crate::config::ServerConfig;
use crate::lobby::Lobby;
use log::{debug, error, info, warn};
use shared::Role;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

/// Messages sent from connection tasks to the lobby loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        id: ConnectionId,
        addr: SocketAddr,
        sender: LineSender,
        reply: oneshot::Sender<Option<Role>>,
    },
    LineReceived {
        id: ConnectionId,
        line: String,
    },
    Disconnected {
        id: ConnectionId,
    },
    Shutdown,
}

/// Cloneable handle for stopping a running server
#[derive(Debug, Clone)]
pub struct ServerHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Server already stopped");
        }
    }
}

/// Main server owning the listener and the lobby
///
/// All lobby mutation happens on the task running [`Server::run`]; connection
/// tasks only forward messages to it and write the lines it queues for them.
pub struct Server {
    listener: TcpListener,
    lobby: Lobby,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            lobby: Lobby::from_config(config),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    /// Accepts connections until the lobby loop stops
    async fn accept_loop(listener: TcpListener, server_tx: mpsc::UnboundedSender<ServerMessage>) {
        let mut next_id: ConnectionId = 1;

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let id = next_id;
                    next_id = next_id.wrapping_add(1);
                    debug!("Accepted connection {} from {}", id, addr);
                    tokio::spawn(Self::handle_connection(stream, addr, id, server_tx.clone()));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Drives one connection from admission to close
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        id: ConnectionId,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle on connection {}: {}", id, e);
        }

        let (read_half, write_half) = stream.into_split();
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_lines(write_half, line_rx));

        let (reply_tx, reply_rx) = oneshot::channel();
        let message = ServerMessage::Connected {
            id,
            addr,
            sender: line_tx,
            reply: reply_tx,
        };

        let admitted = server_tx.send(message).is_ok() && matches!(reply_rx.await, Ok(Some(_)));
        if admitted {
            read_lines(read_half, id, &server_tx).await;
            if server_tx.send(ServerMessage::Disconnected { id }).is_err() {
                debug!("Lobby gone before disconnect of connection {}", id);
            }
        }

        // The writer finishes once the lobby drops this connection's sender.
        match writer.await {
            Ok(Ok(())) => debug!("Connection {} closed", id),
            Ok(Err(e)) => warn!("Write error on connection {}: {}", id, e),
            Err(e) => error!("Writer task for connection {} failed: {}", id, e),
        }
    }

    /// Runs the lobby loop until shutdown
    pub async fn run(self) {
        let Server {
            listener,
            mut lobby,
            server_tx,
            mut server_rx,
        } = self;

        let acceptor = tokio::spawn(Self::accept_loop(listener, server_tx));
        info!("Server started successfully");

        while let Some(message) = server_rx.recv().await {
            match message {
                ServerMessage::Connected {
                    id,
                    addr,
                    sender,
                    reply,
                } => {
                    let role = lobby.connect(id, addr, sender);
                    if reply.send(role).is_err() {
                        debug!("Connection {} went away during admission", id);
                        lobby.disconnect(id);
                    }
                }
                ServerMessage::LineReceived { id, line } => {
                    lobby.handle_line(id, &line);
                }
                ServerMessage::Disconnected { id } => {
                    lobby.disconnect(id);
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        acceptor.abort();
    }
}

/// Forwards newline-delimited lines to the lobby until EOF or a read error
pub async fn read_lines<R>(
    reader: R,
    id: ConnectionId,
    server_tx: &mpsc::UnboundedSender<ServerMessage>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if server_tx
                    .send(ServerMessage::LineReceived { id, line })
                    .is_err()
                {
                    break;
                }
            }
            Ok(None) => {
                info!("Connection {} closed by peer", id);
                break;
            }
            Err(e) => {
                warn!("Read error on connection {}: {}", id, e);
                break;
            }
        }
    }
}

/// Writes queued lines, newline terminated, until the queue closes
pub async fn write_lines<W>(
    mut writer: W,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
    }
    writer.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MazeDimensions;
    use std::net::{IpAddr, Ipv4Addr};

    fn test_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5000)
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            dimensions: MazeDimensions::default(),
            seed: Some(1),
        }
    }

    #[test]
    fn test_server_message_creation() {
        let msg = ServerMessage::LineReceived {
            id: 3,
            line: "READY 1".to_string(),
        };

        match msg {
            ServerMessage::LineReceived { id, line } => {
                assert_eq!(id, 3);
                assert_eq!(line, "READY 1");
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[tokio::test]
    async fn test_read_lines_forwards_each_line() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input: &[u8] = b"JOIN Ann\r\nREADY 1\nMOVE UP";

        read_lines(input, 9, &tx).await;

        let mut received = Vec::new();
        while let Ok(message) = rx.try_recv() {
            match message {
                ServerMessage::LineReceived { id, line } => {
                    assert_eq!(id, 9);
                    received.push(line);
                }
                other => panic!("Unexpected message {:?}", other),
            }
        }
        assert_eq!(received, vec!["JOIN Ann", "READY 1", "MOVE UP"]);
    }

    #[tokio::test]
    async fn test_read_lines_stops_on_invalid_utf8() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input: &[u8] = b"JOIN Ann\n\xff\xfe\nREADY 1\n";

        read_lines(input, 1, &tx).await;

        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_write_lines_appends_newlines() {
        let writer = tokio_test::io::Builder::new()
            .write(b"ROLE 1\n")
            .write(b"STATE|1||0|0||0|0\n")
            .build();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("ROLE 1".to_string()).unwrap();
        tx.send("STATE|1||0|0||0|0".to_string()).unwrap();
        drop(tx);

        write_lines(writer, rx).await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_on_ephemeral_port() {
        let server = Server::bind(&test_config()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(addr.ip(), test_addr().ip());
    }

    #[tokio::test]
    async fn test_shutdown_stops_run() {
        let server = Server::bind(&test_config()).await.unwrap();
        let handle = server.handle();
        let task = tokio::spawn(server.run());

        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}
