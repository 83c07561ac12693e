//! Time source used to stamp records.

use chrono::{DateTime, Utc};

/// Port for getting the current time.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock using the OS time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock moving one second forward on every reading.
#[cfg(test)]
pub struct TickingClock {
    current: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl TickingClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: std::sync::Mutex::new(start),
        }
    }
}

#[cfg(test)]
impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap();
        *current += chrono::Duration::seconds(1);
        *current
    }
}
