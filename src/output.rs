//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Loaded: photo.jpg
//! progressive: thumbs/300x200.jpg
//! wrote thumbs/300x200.jpg
//! wrote thumbs/1200x800.jpg
//! Renditions: 2 written, 1 failed
//! ```
//!
//! Failures go to stderr, one line each, naming the source, the spec and the
//! output so the failing pair can be found on a long command line:
//!
//! ```text
//! invalid spec: target size must be positive, got 50x0 : during photo.jpg -> 100x100+10+10+50x0+0+1+70+0 (bad.jpg)
//! ```
//!
//! # Architecture
//!
//! Each kind of output has a pure `format_*` function returning the display
//! lines and a `print_*` wrapper that writes them out.

use crate::imaging::{ResizeMethod, ResizeStrategy};
use crate::process::{ProcessEvent, RunSummary};

/// Where a formatted event belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Format a single progress event as display lines, each tagged with the
/// stream it belongs on.
///
/// The `progressive:` notice precedes the write attempt, so it is printed
/// for a failed progressive write too.
pub fn format_process_event(event: &ProcessEvent) -> Vec<(Stream, String)> {
    match event {
        ProcessEvent::Loaded { source, .. } => {
            vec![(Stream::Stdout, format!("Loaded: {}", source.display()))]
        }
        ProcessEvent::Written(rendition) => {
            let path = rendition.output.display();
            let mut lines = Vec::new();
            if rendition.progressive {
                lines.push((Stream::Stdout, format!("progressive: {path}")));
            }
            lines.push((Stream::Stdout, format!("wrote {path}")));
            lines
        }
        ProcessEvent::Failed {
            source,
            job,
            reason,
            progressive,
        } => {
            let mut lines = Vec::new();
            if *progressive {
                lines.push((
                    Stream::Stdout,
                    format!("progressive: {}", job.output.display()),
                ));
            }
            lines.push((
                Stream::Stderr,
                format!(
                    "{} : during {} -> {} ({})",
                    reason,
                    source.display(),
                    job.spec,
                    job.output.display()
                ),
            ));
            lines
        }
    }
}

pub fn print_process_event(event: &ProcessEvent) {
    for (stream, line) in format_process_event(event) {
        match stream {
            Stream::Stdout => println!("{}", line),
            Stream::Stderr => eprintln!("{}", line),
        }
    }
}

/// One-line totals for a finished run.
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "Renditions: {} written, {} failed",
        summary.written.len(),
        summary.failed
    )
}

pub fn print_summary(summary: &RunSummary) {
    println!("{}", format_summary(summary));
}

/// Table of resize methods and their spec codes.
///
/// ```text
/// code  method     kind
///    0  thumbnail  direct
///   15  lanczos    filtered
/// ```
pub fn format_method_table() -> Vec<String> {
    let mut lines = vec![format!("{:>4}  {:<10} {}", "code", "method", "kind")];
    for method in ResizeMethod::ALL {
        let kind = match method.strategy() {
            ResizeStrategy::Filtered(_) => "filtered",
            _ => "direct",
        };
        lines.push(format!(
            "{:>4}  {:<10} {}",
            method.code(),
            method.name().unwrap_or_default(),
            kind
        ));
    }
    lines
}

pub fn print_method_table() {
    for line in format_method_table() {
        println!("{}", line);
    }
}
