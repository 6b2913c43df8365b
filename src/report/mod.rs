// src/report/mod.rs
//! Terminal rendering of registries and check batches.
mod style;

pub use style::{Color, Painter};

use crate::health::{CheckBatch, Status};
use crate::registry::Registry;
use std::io::{self, Write};

/// Renders one line per endpoint: `name (url) [label]`.
#[derive(Debug, Clone, Copy)]
pub struct TerminalReporter {
    painter: Painter,
}

impl TerminalReporter {
    pub fn new(color: bool) -> Self {
        Self {
            painter: Painter::new(color),
        }
    }

    pub fn report_line(&self, name: &str, url: &str, status: Status) -> String {
        format!(
            "{} {} {}",
            self.painter.paint(Color::Yellow, name),
            self.painter.paint(Color::Cyan, &format!("({})", url)),
            self.painter.paint(
                Color::for_category(status.category()),
                &format!("[{}]", status)
            ),
        )
    }

    pub fn report<W: Write>(&self, out: &mut W, batch: &CheckBatch) -> io::Result<()> {
        for result in batch {
            writeln!(
                out,
                "{}",
                self.report_line(&result.endpoint.name, &result.endpoint.url, result.status)
            )?;
        }
        out.flush()
    }

    pub fn list<W: Write>(&self, out: &mut W, registry: &Registry) -> io::Result<()> {
        for endpoint in registry.endpoints() {
            writeln!(
                out,
                "{} {}",
                self.painter.paint(Color::Yellow, &endpoint.name),
                self.painter.paint(Color::Green, &endpoint.url)
            )?;
        }
        out.flush()
    }
}
