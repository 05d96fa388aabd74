//! Subcommand implementations.
//!
//! Every networked command opens the link, steps it from a [`Ticker`] until
//! its goal is met, then closes it.

use std::io::Write;
use std::process::ExitCode;

use serde_json::{Value, json};
use tracing::{debug, info};
use turbolink::{Link, LinkStatus};
use turbolink_config::Config;

use crate::cli::{CliCommand, DEFAULT_MAX_TICKS};
use crate::ticker::Ticker;
use crate::{AppError, CLI_TARGET};

/// Runs `command` against `link`, writing results to `out`.
pub(crate) fn execute<W: Write>(
    command: CliCommand,
    config: &Config,
    link: &Link,
    out: &mut W,
) -> Result<ExitCode, AppError> {
    match command {
        CliCommand::Status { max_ticks } => status(link, config, max_ticks, out),
        CliCommand::Send {
            payload,
            await_cmd,
            listener,
            extract,
            max_ticks,
        } => {
            let request = SendRequest {
                payload,
                reply: await_cmd.map(|cmd| ReplyMatch {
                    cmd,
                    listener,
                    extract,
                }),
            };
            send(link, config, &request, max_ticks, out)
        }
        CliCommand::Listen { count, max_ticks } => listen(link, config, count, max_ticks, out),
        CliCommand::Extract { path, json } => {
            write_line(out, &turbolink::extract(&path, &json))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

struct SendRequest {
    payload: String,
    reply: Option<ReplyMatch>,
}

struct ReplyMatch {
    cmd: String,
    listener: Option<String>,
    extract: Option<String>,
}

impl ReplyMatch {
    /// Registers interest before the request goes out so a fast reply is
    /// latched rather than dropped.
    fn send_registered(&self, link: &Link, payload: &str) -> Result<(), AppError> {
        match &self.listener {
            Some(id) => link.try_send_and_register(&self.cmd, id, payload)?,
            None => {
                let stale = link.wait_for(&self.cmd);
                debug!(target: CLI_TARGET, cmd = %self.cmd, stale, "reply interest registered");
                link.try_send(payload)?;
            }
        }
        Ok(())
    }

    fn poll(&self, link: &Link) -> Option<Value> {
        match &self.listener {
            Some(id) if link.wait_for_listener(&self.cmd, id) => {
                link.listener_value(&self.cmd, id)
            }
            None if link.wait_for(&self.cmd) => link.value(&self.cmd),
            _ => None,
        }
    }

    fn render(&self, reply: &Value) -> String {
        let text = reply.to_string();
        if let Some(path) = &self.extract {
            return turbolink::extract(path, &text);
        }
        text
    }
}

/// Steps the link until it settles as open or closed.
fn connect(link: &Link, config: &Config, max_ticks: u64) -> LinkStatus {
    link.open(config.address());
    let ticker = Ticker::new(config.tick_interval(), Some(max_ticks));
    let settled = ticker.run_until(|_| {
        if link.is_open() {
            return Some(LinkStatus::Open);
        }
        let status = link.link_status();
        (status == LinkStatus::Closed).then_some(status)
    });
    let status = settled.unwrap_or_else(|| link.link_status());
    if status == LinkStatus::Open && link.poll_connect_event() {
        info!(target: CLI_TARGET, address = config.address(), "connected");
    }
    status
}

fn require_open(link: &Link, config: &Config, max_ticks: u64) -> Result<(), AppError> {
    match connect(link, config, max_ticks) {
        LinkStatus::Open => Ok(()),
        status => {
            link.close();
            Err(AppError::ConnectFailed {
                address: config.address().to_owned(),
                status,
            })
        }
    }
}

fn status<W: Write>(
    link: &Link,
    config: &Config,
    max_ticks: u64,
    out: &mut W,
) -> Result<ExitCode, AppError> {
    let status = connect(link, config, max_ticks);
    link.close();
    let report = json!({
        "address": config.address(),
        "status": status.code(),
        "state": status,
    });
    let text = serde_json::to_string(&report).map_err(AppError::SerialiseOutput)?;
    write_line(out, &text)?;
    Ok(if status == LinkStatus::Open {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn send<W: Write>(
    link: &Link,
    config: &Config,
    request: &SendRequest,
    max_ticks: u64,
    out: &mut W,
) -> Result<ExitCode, AppError> {
    require_open(link, config, max_ticks)?;
    let result = send_on_open_link(link, config, request, max_ticks, out);
    link.close();
    result.map(|()| ExitCode::SUCCESS)
}

fn send_on_open_link<W: Write>(
    link: &Link,
    config: &Config,
    request: &SendRequest,
    max_ticks: u64,
    out: &mut W,
) -> Result<(), AppError> {
    let Some(reply) = &request.reply else {
        link.try_send(&request.payload)?;
        return Ok(());
    };

    reply.send_registered(link, &request.payload)?;
    let ticker = Ticker::new(config.tick_interval(), Some(max_ticks));
    let outcome = ticker.run_until(|_| {
        if let Some(value) = reply.poll(link) {
            return Some(Some(value));
        }
        (!link.is_open()).then_some(None)
    });
    match outcome {
        Some(Some(value)) => write_line(out, &reply.render(&value)),
        Some(None) => Err(AppError::Disconnected {
            cmd: reply.cmd.clone(),
        }),
        None => Err(AppError::NoReply {
            cmd: reply.cmd.clone(),
            ticks: max_ticks,
        }),
    }
}

enum ListenEnd {
    Complete,
    Disconnected,
}

fn listen<W: Write>(
    link: &Link,
    config: &Config,
    count: Option<usize>,
    max_ticks: Option<u64>,
    out: &mut W,
) -> Result<ExitCode, AppError> {
    require_open(link, config, max_ticks.unwrap_or(DEFAULT_MAX_TICKS))?;
    let mut printed = 0_usize;
    let ticker = Ticker::new(config.tick_interval(), max_ticks);
    let outcome = ticker.run_until(|_| {
        if link.poll_packet_event() {
            if let Err(error) = print_new_packets(link, &mut printed, count, out) {
                return Some(Err(error));
            }
        }
        if count.is_some_and(|expected| printed >= expected) {
            return Some(Ok(ListenEnd::Complete));
        }
        (!link.is_open()).then_some(Ok(ListenEnd::Disconnected))
    });
    link.close();

    match outcome.transpose()? {
        Some(ListenEnd::Complete) => Ok(ExitCode::SUCCESS),
        Some(ListenEnd::Disconnected) | None => match count {
            Some(expected) if printed < expected => Err(AppError::IncompleteListen {
                expected,
                received: printed,
            }),
            _ => Ok(ExitCode::SUCCESS),
        },
    }
}

fn print_new_packets<W: Write>(
    link: &Link,
    printed: &mut usize,
    limit: Option<usize>,
    out: &mut W,
) -> Result<(), AppError> {
    let available = link.history_size();
    let last = limit.map_or(available, |expected| available.min(expected));
    while *printed < last {
        let sequence = *printed + 1;
        if let Some(packet) = link.history_item(sequence) {
            write_line(out, &packet.to_string())?;
        }
        *printed = sequence;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, text: &str) -> Result<(), AppError> {
    writeln!(out, "{text}").map_err(AppError::WriteOutput)
}
