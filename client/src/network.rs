use crate::game::{ClientGameState, Phase};
use crate::input::{InputAction, InputManager, HELP_TEXT};
use log::{debug, info, warn};
use shared::{ClientCommand, ServerEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Writes one command as a newline terminated line
pub async fn send_command<W>(writer: &mut W, command: &ClientCommand) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = format!("{}\n", command);
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Reads lines until one decodes into an event
///
/// Undecodable lines are logged and skipped. Returns None at end of stream.
pub async fn next_event<R>(lines: &mut Lines<R>) -> std::io::Result<Option<ServerEvent>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        match line.parse::<ServerEvent>() {
            Ok(event) => return Ok(Some(event)),
            Err(e) => warn!("Ignoring server line {:?}: {}", line, e),
        }
    }
    Ok(None)
}

pub struct Client {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    game_state: ClientGameState,
    json_output: bool,
}

impl Client {
    pub async fn connect(
        server_addr: &str,
        json_output: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", server_addr);
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to {}", stream.peer_addr()?);

        let (read_half, write_half) = stream.into_split();

        Ok(Client {
            reader: BufReader::new(read_half).lines(),
            writer: write_half,
            game_state: ClientGameState::new(),
            json_output,
        })
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub async fn send(&mut self, command: &ClientCommand) -> std::io::Result<()> {
        debug!("Sending {}", command);
        send_command(&mut self.writer, command).await
    }

    /// Waits for the next server event and folds it into the local mirror
    pub async fn recv(&mut self) -> std::io::Result<Option<ServerEvent>> {
        let event = next_event(&mut self.reader).await?;
        if let Some(event) = &event {
            self.game_state.apply_server_event(event);
        }
        Ok(event)
    }

    fn format_event(&self, event: &ServerEvent) -> Result<String, serde_json::Error> {
        if self.json_output {
            serde_json::to_string(event)
        } else {
            Ok(self.game_state.describe(event))
        }
    }

    /// Handles one line of user input; returns false when the user quits
    async fn handle_input(&mut self, line: &str) -> std::io::Result<bool> {
        match InputManager::parse_line(line, &self.game_state) {
            Ok(InputAction::Send(command)) => self.send(&command).await?,
            Ok(InputAction::Hint) => match self.game_state.hint() {
                Some(direction) => println!("Hint: go {}", direction),
                None => println!("No hint available"),
            },
            Ok(InputAction::Help) => println!("{}", HELP_TEXT),
            Ok(InputAction::Quit) => return Ok(false),
            Err(e) => println!("Invalid input: {}", e),
        }
        Ok(true)
    }

    /// Runs until the server closes the connection or the user quits
    pub async fn run(&mut self, name: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(name) = name {
            self.send(&ClientCommand::Join { name }).await?;
        }

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut input_open = true;

        loop {
            tokio::select! {
                event = self.recv() => {
                    match event? {
                        Some(event) => {
                            println!("{}", self.format_event(&event)?);
                            if self.game_state.phase == Phase::Rejected {
                                info!("Server rejected the connection");
                                break;
                            }
                        }
                        None => {
                            info!("Server closed the connection");
                            break;
                        }
                    }
                },

                line = input.next_line(), if input_open => {
                    match line? {
                        Some(line) => {
                            if !self.handle_input(&line).await? {
                                break;
                            }
                        }
                        // Keep printing events after piped input runs out
                        None => input_open = false,
                    }
                },
            }
        }

        if let Err(e) = self.writer.shutdown().await {
            debug!("Error closing connection: {}", e);
        }
        Ok(())
    }
}
