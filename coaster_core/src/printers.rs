//! Leveled diagnostic printers.
//!
//! Three channels (`raw`, `event`, `status`) each carry a verbosity of 0-3.
//! A message tagged with verbosity `v` is emitted when `0 < v <= level`, and
//! a message identical to the channel's previous one is suppressed. Output goes
//! to `tracing` under the `coaster::<name>` target.

use crate::error::CommandError;

/// Highest accepted printer level.
pub const MAX_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrinterId {
    Raw,
    Event,
    Status,
}

impl PrinterId {
    pub const ALL: [PrinterId; 3] = [PrinterId::Raw, PrinterId::Event, PrinterId::Status];

    pub const fn name(self) -> &'static str {
        match self {
            PrinterId::Raw => "raw",
            PrinterId::Event => "event",
            PrinterId::Status => "status",
        }
    }
}

/// Target of a `setLogLevel` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterSelector {
    One(PrinterId),
    All,
}

impl std::str::FromStr for PrinterSelector {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PrinterSelector::All),
            "raw" => Ok(PrinterSelector::One(PrinterId::Raw)),
            "event" => Ok(PrinterSelector::One(PrinterId::Event)),
            "status" => Ok(PrinterSelector::One(PrinterId::Status)),
            other => Err(CommandError::UnknownPrinter(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Printer {
    id: PrinterId,
    level: u8,
    last: Option<String>,
}

impl Printer {
    pub fn new(id: PrinterId, level: u8) -> Self {
        Self {
            id,
            level: level.min(MAX_LEVEL),
            last: None,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Emit `msg` if enabled at `verbosity` and not a repeat. Returns whether
    /// it was emitted.
    pub fn print(&mut self, verbosity: u8, msg: &str) -> bool {
        if verbosity == 0 || verbosity > self.level {
            return false;
        }
        if self.last.as_deref() == Some(msg) {
            return false;
        }
        // `target:` must be a literal, hence one call per channel.
        match self.id {
            PrinterId::Raw => tracing::info!(target: "coaster::raw", "{msg}"),
            PrinterId::Event => tracing::info!(target: "coaster::event", "{msg}"),
            PrinterId::Status => tracing::info!(target: "coaster::status", "{msg}"),
        }
        self.last = Some(msg.to_owned());
        true
    }
}

#[derive(Debug, Clone)]
pub struct Printers {
    raw: Printer,
    event: Printer,
    status: Printer,
}

impl Printers {
    pub fn new(raw: u8, event: u8, status: u8) -> Self {
        Self {
            raw: Printer::new(PrinterId::Raw, raw),
            event: Printer::new(PrinterId::Event, event),
            status: Printer::new(PrinterId::Status, status),
        }
    }

    pub fn get(&self, id: PrinterId) -> &Printer {
        match id {
            PrinterId::Raw => &self.raw,
            PrinterId::Event => &self.event,
            PrinterId::Status => &self.status,
        }
    }

    pub fn get_mut(&mut self, id: PrinterId) -> &mut Printer {
        match id {
            PrinterId::Raw => &mut self.raw,
            PrinterId::Event => &mut self.event,
            PrinterId::Status => &mut self.status,
        }
    }

    pub fn print(&mut self, id: PrinterId, verbosity: u8, msg: &str) -> bool {
        self.get_mut(id).print(verbosity, msg)
    }

    /// Set the level of one printer or all of them.
    pub fn set_level(&mut self, sel: PrinterSelector, level: u8) -> Result<(), CommandError> {
        if level > MAX_LEVEL {
            return Err(CommandError::InvalidLevel);
        }
        match sel {
            PrinterSelector::One(id) => self.get_mut(id).level = level,
            PrinterSelector::All => {
                for id in PrinterId::ALL {
                    self.get_mut(id).level = level;
                }
            }
        }
        Ok(())
    }
}

impl From<&crate::config::PrinterLevels> for Printers {
    fn from(l: &crate::config::PrinterLevels) -> Self {
        Self::new(l.raw, l.event, l.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_are_suppressed() {
        let mut p = Printer::new(PrinterId::Status, 1);
        assert!(p.print(1, "state=waiting"));
        assert!(!p.print(1, "state=waiting"));
        assert!(p.print(1, "state=cup_on"));
        assert!(p.print(1, "state=waiting"));
    }

    #[test]
    fn level_gates_verbosity() {
        let mut p = Printer::new(PrinterId::Raw, 2);
        assert!(!p.print(0, "a"));
        assert!(p.print(2, "b"));
        assert!(!p.print(3, "c"));
    }

    #[test]
    fn selector_parsing() {
        assert_eq!("all".parse::<PrinterSelector>(), Ok(PrinterSelector::All));
        assert_eq!(
            "ble".parse::<PrinterSelector>(),
            Err(CommandError::UnknownPrinter("ble".into()))
        );
    }

    #[test]
    fn set_all_and_reject_out_of_range() {
        let mut ps = Printers::new(0, 1, 1);
        ps.set_level(PrinterSelector::All, 3).unwrap();
        assert!(PrinterId::ALL.iter().all(|&id| ps.get(id).level() == 3));
        assert_eq!(
            ps.set_level(PrinterSelector::One(PrinterId::Raw), 4),
            Err(CommandError::InvalidLevel)
        );
    }
}
