// src/health/status.rs
use std::fmt;

/// Outcome of a single probe.
///
/// A status code is only carried by the variants that actually received a
/// response. Build response statuses with [`Status::from_code`]; writing a
/// variant by hand (say `Success(404)`) skips classification and breaks the
/// code-to-variant mapping reporters rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Response received with 200 or 301.
    Success(u16),
    /// Response received with 400, 404 or 500.
    ClientOrServerError(u16),
    /// Response received with any other code.
    Other(u16),
    /// No response at all: refused, DNS failure, timeout, bad URL.
    Unreachable,
}

/// Visual category a reporter maps a status onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Healthy,
    Unhealthy,
    Neutral,
    Unreachable,
}

impl Status {
    /// Classify a received HTTP status code.
    pub fn from_code(code: u16) -> Self {
        match code {
            200 | 301 => Status::Success(code),
            400 | 404 | 500 => Status::ClientOrServerError(code),
            _ => Status::Other(code),
        }
    }

    pub fn code(&self) -> Option<u16> {
        match *self {
            Status::Success(code) | Status::ClientOrServerError(code) | Status::Other(code) => {
                Some(code)
            }
            Status::Unreachable => None,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Status::Success(_) => Category::Healthy,
            Status::ClientOrServerError(_) => Category::Unhealthy,
            Status::Other(_) => Category::Neutral,
            Status::Unreachable => Category::Unreachable,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.category() == Category::Healthy
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{}", code),
            None => f.write_str("unreachable"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Healthy => "healthy",
            Category::Unhealthy => "unhealthy",
            Category::Neutral => "other",
            Category::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}
