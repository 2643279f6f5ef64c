//! Expiration-family commands

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{CacheError, Result};

/// A command that changes the lifetime of a key
///
/// Relative timeouts that are zero (or negative when parsed) delete the key
/// immediately, as the store does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireCommand {
    /// `EXPIRE key seconds`
    Expire(Duration),
    /// `PEXPIRE key milliseconds`
    PExpire(Duration),
    /// `EXPIREAT key unix-seconds`
    ExpireAt(SystemTime),
    /// `PEXPIREAT key unix-milliseconds`
    PExpireAt(SystemTime),
    /// `PERSIST key`
    Persist,
}

impl ExpireCommand {
    /// Command name as sent to the store
    pub fn name(&self) -> &'static str {
        match self {
            ExpireCommand::Expire(_) => "EXPIRE",
            ExpireCommand::PExpire(_) => "PEXPIRE",
            ExpireCommand::ExpireAt(_) => "EXPIREAT",
            ExpireCommand::PExpireAt(_) => "PEXPIREAT",
            ExpireCommand::Persist => "PERSIST",
        }
    }

    /// Arguments following the key
    pub fn args(&self) -> Vec<String> {
        match self {
            ExpireCommand::Expire(ttl) => vec![ttl.as_secs().to_string()],
            ExpireCommand::PExpire(ttl) => vec![ttl.as_millis().to_string()],
            ExpireCommand::ExpireAt(at) => vec![unix(*at).as_secs().to_string()],
            ExpireCommand::PExpireAt(at) => vec![unix(*at).as_millis().to_string()],
            ExpireCommand::Persist => Vec::new(),
        }
    }

    /// Parse a raw `(cmd, args)` pair; the command name is case-insensitive
    ///
    /// Names outside the expiration family are `Unsupported` whatever their
    /// arguments.
    pub fn parse(cmd: &str, args: &[String]) -> Result<Self> {
        let name = cmd.to_ascii_uppercase();
        let build: fn(u64) -> Option<Self> = match name.as_str() {
            "PERSIST" => {
                return match args {
                    [] => Ok(ExpireCommand::Persist),
                    _ => Err(arity(&name)),
                };
            }
            "EXPIRE" => |secs| Some(ExpireCommand::Expire(Duration::from_secs(secs))),
            "PEXPIRE" => |millis| Some(ExpireCommand::PExpire(Duration::from_millis(millis))),
            "EXPIREAT" => |secs| {
                UNIX_EPOCH
                    .checked_add(Duration::from_secs(secs))
                    .map(ExpireCommand::ExpireAt)
            },
            "PEXPIREAT" => |millis| {
                UNIX_EPOCH
                    .checked_add(Duration::from_millis(millis))
                    .map(ExpireCommand::PExpireAt)
            },
            _ => return Err(CacheError::Unsupported(cmd.to_string())),
        };

        let value = match args {
            [value] => parse_i64(&name, value)?,
            _ => return Err(arity(&name)),
        };
        build(u64::try_from(value).unwrap_or(0)).ok_or_else(|| {
            CacheError::InvalidArgument(format!("{name}: timestamp out of range: {value}"))
        })
    }

    /// Time left from `now`; `None` means the key becomes persistent
    pub fn remaining(&self, now: SystemTime) -> Option<Duration> {
        match self {
            ExpireCommand::Expire(ttl) | ExpireCommand::PExpire(ttl) => Some(*ttl),
            ExpireCommand::ExpireAt(at) | ExpireCommand::PExpireAt(at) => {
                Some(at.duration_since(now).unwrap_or(Duration::ZERO))
            }
            ExpireCommand::Persist => None,
        }
    }
}

fn unix(at: SystemTime) -> Duration {
    at.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO)
}

fn parse_i64(name: &str, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| {
        CacheError::InvalidArgument(format!("{name}: value is not an integer: {value}"))
    })
}

fn arity(name: &str) -> CacheError {
    CacheError::InvalidArgument(format!("wrong number of arguments for '{name}'"))
}
