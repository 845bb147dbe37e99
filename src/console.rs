//! The interactive front end: prompts for commands on a line based input, runs them through a
//!  [ReliableExchange] and prints the satellite's replies.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{error, info};
use crate::exchange::{ExchangeOutcome, ReliableExchange};
use crate::protocol::request::Command;
use crate::protocol::response::{LocationResponse, Response};
use crate::util::time_format::format_unix_millis;

const COMMAND_PROMPT: &str = "\nSelect a request to send to the satellite [ 'location' | 'time' | 'move' | 'quit' ]: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Location,
    Time,
    Move,
    Quit,
}

/// Surrounding whitespace and case are ignored
pub fn parse_command(line: &str) -> Option<CommandKind> {
    match line.trim().to_lowercase().as_str() {
        "location" => Some(CommandKind::Location),
        "time" => Some(CommandKind::Time),
        "move" => Some(CommandKind::Move),
        "quit" => Some(CommandKind::Quit),
        _ => None,
    }
}

/// Accepts finite numbers only
pub fn parse_float(line: &str) -> Option<f64> {
    line.trim().parse::<f64>().ok()
        .filter(|v| v.is_finite())
}

fn describe_location(location: &LocationResponse) -> String {
    format!("Latitude = {}, Longitude = {}", location.latitude, location.longitude)
}

pub fn describe_response(response: &Response) -> String {
    match response {
        Response::Location(location) => describe_location(location),
        Response::Time(time) => match format_unix_millis(time.current_time_unix_ms) {
            Some(formatted) => format!("Current satellite time is {}", formatted),
            None => format!("Current satellite time is out of range ({} ms since epoch)", time.current_time_unix_ms),
        },
        Response::Move(m) if m.success => format!("Satellite successfully moved. New position: {}", describe_location(&m.updated_location)),
        Response::Move(_) => "Move request unsuccessful - satellite failed to move".to_string(),
    }
}

pub fn describe_outcome(outcome: &ExchangeOutcome, max_attempts: u32) -> String {
    match outcome {
        ExchangeOutcome::Delivered(response) => format!("SATELLITE REPLY: {}", describe_response(response)),
        ExchangeOutcome::TimedOut => format!("Satellite never replied after {} send attempts", max_attempts),
        ExchangeOutcome::Malformed => "Satellite reply could not be decoded".to_string(),
    }
}

pub struct Console<R, W> {
    input: Lines<R>,
    output: W,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> Console<R, W> {
    pub fn new(input: R, output: W) -> Console<R, W> {
        Console {
            input: input.lines(),
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn print(&mut self, s: &str) -> anyhow::Result<()> {
        self.output.write_all(s.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn println(&mut self, s: &str) -> anyhow::Result<()> {
        self.print(&format!("{}\n", s)).await
    }

    /// Prompts until a line parses, returning `None` when the input is exhausted
    async fn prompt_for<T>(&mut self, prompt: &str, parse: impl Fn(&str) -> Option<T>, complaint: &str) -> anyhow::Result<Option<T>> {
        loop {
            self.print(prompt).await?;
            let Some(line) = self.input.next_line().await? else {
                return Ok(None);
            };

            match parse(&line) {
                Some(value) => return Ok(Some(value)),
                None => self.println(complaint).await?,
            }
        }
    }

    /// Reads the next command, asking for thrust parameters if it is a move. Returns `None`
    ///  when the input is exhausted.
    pub async fn read_command(&mut self) -> anyhow::Result<Option<Command>> {
        let Some(kind) = self.prompt_for(COMMAND_PROMPT, parse_command, "Unrecognized request, try again.").await? else {
            return Ok(None);
        };

        let command = match kind {
            CommandKind::Location => Command::LocationQuery,
            CommandKind::Time => Command::TimeQuery,
            CommandKind::Quit => Command::Quit,
            CommandKind::Move => {
                let Some(thrust_angle) = self.prompt_for("Thrust angle: ", parse_float, "Thrust angle must be a number, try again.").await? else {
                    return Ok(None);
                };
                let Some(thrust_duration) = self.prompt_for("Thrust duration: ", parse_float, "Thrust duration must be a number, try again.").await? else {
                    return Ok(None);
                };
                Command::MoveCommand { thrust_angle, thrust_duration }
            }
        };
        Ok(Some(command))
    }

    /// The session loop: runs commands until the user quits or the input ends. Failures of a
    ///  single exchange are reported, and the session goes on.
    pub async fn run(&mut self, exchange: &mut ReliableExchange) -> anyhow::Result<()> {
        info!("ground station session started");

        loop {
            let command = match self.read_command().await? {
                None => {
                    info!("end of input, terminating session");
                    break;
                }
                Some(Command::Quit) => {
                    info!("quit requested, terminating session");
                    break;
                }
                Some(command) => command,
            };

            match exchange.execute(&command).await {
                Ok(outcome) => {
                    let description = describe_outcome(&outcome, exchange.config().max_attempts);
                    self.println(&description).await?;
                }
                Err(e) => {
                    error!("exchange failed: {}", e);
                    self.println(&format!("Request failed: {}", e)).await?;
                }
            }
        }
        Ok(())
    }
}
