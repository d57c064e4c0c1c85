//! Command parsing and dispatch.
//!
//! A line is split into a verb and an argument string at the first run of
//! whitespace. The verb selects a handler from a static table; handler errors
//! become `{"status":"error","message":...}` so nothing escapes `dispatch`.

use crate::context::DeviceContext;
use crate::error::CommandError;
use crate::printers::PrinterSelector;
use crate::records::page_json;
use serde::Serialize;
use std::str::FromStr;

/// Firmware version reported by `getVersion`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default page size for `readBuffer`.
pub const DEFAULT_PAGE_LEN: usize = 20;

/// What the link should do with a handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send one notification.
    Text(String),
    /// Console-only acknowledgement; nothing is sent.
    Silent,
    /// Restart the device; nothing is sent.
    Restart,
}

type Handler = fn(&mut DeviceContext, &str) -> Result<Reply, CommandError>;

const COMMANDS: &[(&str, Handler)] = &[
    ("getVersion", get_version),
    ("setTime", set_time),
    ("clearBuffer", clear_buffer),
    ("readBuffer", read_buffer),
    ("startLogging", start_logging),
    ("stopLogging", stop_logging),
    ("getNow", get_now),
    ("getStatus", get_status),
    ("setSamplingRate", set_sampling_rate),
    ("calibrate", calibrate),
    ("reset", reset),
    ("setLogLevel", set_log_level),
    ("dropRecords", drop_records),
];

/// Every recognised verb, in table order.
pub fn verbs() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|(v, _)| *v)
}

/// Split `line` into `(verb, args)`; `args` is trimmed and may be empty.
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim()),
        None => (line, ""),
    }
}

/// Handle one command line against `ctx`.
pub fn dispatch(ctx: &mut DeviceContext, line: &str) -> Reply {
    let (verb, args) = split_command(line);
    let Some((_, handler)) = COMMANDS.iter().find(|(v, _)| *v == verb) else {
        tracing::debug!(verb, "unknown command");
        return Reply::Text(to_json(&ErrorReply {
            status: "error",
            message: &format!("Unknown command: '{verb}'"),
        }));
    };
    match handler(ctx, args) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::debug!(verb, error = %e, "command rejected");
            Reply::Text(to_json(&ErrorReply {
                status: "error",
                message: &e.to_string(),
            }))
        }
    }
}

// ── response bodies (field order is wire order) ──────────────────────────────

#[derive(Serialize)]
struct ErrorReply<'a> {
    status: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct StatusReply {
    status: &'static str,
}

#[derive(Serialize)]
struct SetTimeReply {
    status: &'static str,
    offset: i64,
    time: String,
}

#[derive(Serialize)]
struct NowReply {
    epoch: i64,
    local: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceStatus {
    logging: bool,
    buffer_size: usize,
    rate_hz: u32,
}

#[derive(Serialize)]
struct RateReply {
    status: &'static str,
    rate: u32,
}

#[derive(Serialize)]
struct LevelReply<'a> {
    status: &'static str,
    printer: &'a str,
    level: u8,
}

#[derive(Serialize)]
struct DropReply {
    status: &'static str,
    offset: usize,
    length: usize,
}

fn to_json<T: Serialize>(body: &T) -> String {
    serde_json::to_string(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "response serialization failed");
        r#"{"status":"error","message":"internal"}"#.to_string()
    })
}

fn ok() -> Reply {
    Reply::Text(to_json(&StatusReply { status: "ok" }))
}

fn parse_num<T: FromStr>(tok: &str) -> Result<T, CommandError> {
    tok.parse()
        .map_err(|_| CommandError::InvalidNumber(tok.to_string()))
}

// ── handlers ─────────────────────────────────────────────────────────────────

fn get_version(_: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    Ok(Reply::Text(VERSION.to_string()))
}

fn set_time(ctx: &mut DeviceContext, args: &str) -> Result<Reply, CommandError> {
    let tok = args
        .split_whitespace()
        .next()
        .ok_or(CommandError::InvalidArguments)?;
    let target: i64 = parse_num(tok)?;
    let offset = ctx.clock.set_time(target)?;
    Ok(Reply::Text(to_json(&SetTimeReply {
        status: "ok",
        offset,
        time: ctx.clock.timestamp(),
    })))
}

fn clear_buffer(ctx: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    ctx.records.clear();
    Ok(ok())
}

fn read_buffer(ctx: &mut DeviceContext, args: &str) -> Result<Reply, CommandError> {
    let toks: Vec<&str> = args.split_whitespace().collect();
    let (offset, length) = match toks.as_slice() {
        [] => (0, DEFAULT_PAGE_LEN),
        [o] => (parse_num(o)?, DEFAULT_PAGE_LEN),
        [o, l] => (parse_num(o)?, parse_num(l)?),
        _ => return Err(CommandError::InvalidArguments),
    };
    let (page, _) = ctx.records.paginate(offset, length);
    Ok(Reply::Text(page_json(page)))
}

fn start_logging(ctx: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    ctx.records.set_logging(true);
    Ok(ok())
}

fn stop_logging(ctx: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    ctx.records.set_logging(false);
    Ok(ok())
}

fn get_now(ctx: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    let epoch = ctx.clock.corrected_time();
    Ok(Reply::Text(to_json(&NowReply {
        epoch,
        local: crate::clock_service::format_local(epoch),
    })))
}

fn get_status(ctx: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    Ok(Reply::Text(to_json(&DeviceStatus {
        logging: ctx.is_logging(),
        buffer_size: ctx.records.len(),
        rate_hz: ctx.rate_hz(),
    })))
}

fn set_sampling_rate(ctx: &mut DeviceContext, args: &str) -> Result<Reply, CommandError> {
    let tok = args
        .split_whitespace()
        .next()
        .ok_or(CommandError::InvalidArguments)?;
    let hz: i64 = parse_num(tok)?;
    let hz = u32::try_from(hz).map_err(|_| CommandError::InvalidRate)?;
    if !ctx.set_rate_hz(hz) {
        return Err(CommandError::InvalidRate);
    }
    Ok(Reply::Text(to_json(&RateReply {
        status: "ok",
        rate: hz,
    })))
}

fn calibrate(_: &mut DeviceContext, args: &str) -> Result<Reply, CommandError> {
    let toks: Vec<&str> = args.split_whitespace().collect();
    let [low, high, weight] = toks.as_slice() else {
        return Err(CommandError::InvalidArguments);
    };
    let low: i64 = parse_num(low)?;
    let high: i64 = parse_num(high)?;
    let weight: f32 = parse_num(weight)?;
    tracing::info!(low, high, weight, "calibration points received (not applied)");
    Ok(Reply::Silent)
}

fn reset(_: &mut DeviceContext, _: &str) -> Result<Reply, CommandError> {
    tracing::warn!("reset requested");
    Ok(Reply::Restart)
}

fn set_log_level(ctx: &mut DeviceContext, args: &str) -> Result<Reply, CommandError> {
    let toks: Vec<&str> = args.split_whitespace().collect();
    let [name, level] = toks.as_slice() else {
        return Err(CommandError::InvalidFormat);
    };
    let sel: PrinterSelector = name.parse()?;
    let level: u8 = level.parse().map_err(|_| CommandError::InvalidLevel)?;
    ctx.printers.set_level(sel, level)?;
    Ok(Reply::Text(to_json(&LevelReply {
        status: "ok",
        printer: *name,
        level,
    })))
}

fn drop_records(ctx: &mut DeviceContext, args: &str) -> Result<Reply, CommandError> {
    let toks: Vec<&str> = args.split_whitespace().collect();
    let [offset, length] = toks.as_slice() else {
        return Err(CommandError::InvalidFormat);
    };
    let offset: usize = parse_num(offset)?;
    let length: usize = parse_num(length)?;
    let status = if ctx.records.drop_range(offset, length) {
        "ok"
    } else {
        "error"
    };
    Ok(Reply::Text(to_json(&DropReply {
        status,
        offset,
        length,
    })))
}
