//! Captured failures
//!
//! A [`FailureEvent`] is the controller-facing description of something
//! that went wrong: a panic, an error value, or an explicitly reported
//! condition. It carries the type name, the message, and the parsed call
//! stack used for fingerprinting.

use devrelay_core::domain::StackFrame;

/// A failure as captured, before it becomes an [`Issue`](devrelay_core::domain::Issue).
#[derive(Debug, Clone)]
pub struct FailureEvent {
    /// Type name of the failure (error type path, or `panic`).
    pub exception_class: String,
    pub message: Option<String>,
    pub frames: Vec<StackFrame>,
}

impl FailureEvent {
    /// Builds a failure event with an explicit class and message, capturing
    /// the current backtrace.
    pub fn new(exception_class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_class: exception_class.into(),
            message: Some(message.into()),
            frames: capture_frames(),
        }
    }

    /// Builds a failure event from an error value.
    ///
    /// The exception class is the error's concrete type path; the message
    /// is its `Display` output.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        Self {
            exception_class: std::any::type_name::<E>().to_string(),
            message: Some(err.to_string()),
            frames: capture_frames(),
        }
    }

    /// Builds a failure event from panic payload parts, as extracted inside
    /// the panic hook.
    pub fn from_panic(message: String, location: Option<String>, frames: Vec<StackFrame>) -> Self {
        let message = match location {
            Some(loc) => format!("{message} (at {loc})"),
            None => message,
        };
        Self {
            exception_class: "panic".to_string(),
            message: Some(message),
            frames,
        }
    }

    /// Replaces the captured frames (used when a caller has a better
    /// stack, e.g. one captured at the original error site).
    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }
}

/// Captures and parses the current thread's backtrace.
///
/// Backtrace capture honors `RUST_BACKTRACE`; with backtraces disabled the
/// frame list is simply empty and fingerprints fall back to class +
/// message.
pub fn capture_frames() -> Vec<StackFrame> {
    let backtrace = std::backtrace::Backtrace::capture();
    parse_backtrace(&backtrace.to_string())
}

/// Parses the display form of `std::backtrace::Backtrace` into frames.
///
/// Symbol lines look like `  12: app::sync::run_cycle`; the following
/// `at file:line` lines are attached as the raw location. Frames from the
/// backtrace machinery itself are skipped.
pub fn parse_backtrace(rendered: &str) -> Vec<StackFrame> {
    let mut frames = Vec::new();

    for line in rendered.lines() {
        let trimmed = line.trim_start();
        // Symbol lines start with "<index>: "
        let Some((index, symbol)) = trimmed.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let symbol = symbol.trim();
        if symbol.is_empty() || is_internal_frame(symbol) {
            continue;
        }

        let (module, function) = split_symbol(symbol);
        frames.push(StackFrame::new(module, function, symbol));
    }

    frames
}

/// Splits `a::b::c` into (`a::b`, `c`). Hash suffixes like `::h1a2b...`
/// from legacy symbol mangling are dropped first.
fn split_symbol(symbol: &str) -> (String, String) {
    let symbol = match symbol.rsplit_once("::") {
        Some((rest, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            rest
        }
        _ => symbol,
    };

    match symbol.rsplit_once("::") {
        Some((module, function)) => (module.to_string(), function.to_string()),
        None => (String::new(), symbol.to_string()),
    }
}

fn is_internal_frame(symbol: &str) -> bool {
    symbol.starts_with("std::backtrace")
        || symbol.starts_with("std::panicking")
        || symbol.starts_with("std::panic")
        || symbol.starts_with("core::panicking")
        || symbol.starts_with("rust_begin_unwind")
        || symbol.starts_with("__rust")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_uses_type_path() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let event = FailureEvent::from_error(&err);
        assert_eq!(event.exception_class, "std::io::Error");
        assert_eq!(event.message.as_deref(), Some("gone"));
    }

    #[test]
    fn test_from_panic_appends_location() {
        let event = FailureEvent::from_panic(
            "index out of bounds".to_string(),
            Some("src/main.rs:10:5".to_string()),
            Vec::new(),
        );
        assert_eq!(event.exception_class, "panic");
        assert_eq!(
            event.message.as_deref(),
            Some("index out of bounds (at src/main.rs:10:5)")
        );
    }

    #[test]
    fn test_parse_backtrace_symbols() {
        let rendered = "\
   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/sys/backtrace.rs:66:5
   1: std::panicking::begin_panic_handler
   2: app::sync::run_cycle
             at ./src/sync.rs:42:9
   3: app::main
   4: main
";
        let frames = parse_backtrace(rendered);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].module, "app::sync");
        assert_eq!(frames[0].function, "run_cycle");
        assert_eq!(frames[1].qualified_name(), "app.main");
        assert_eq!(frames[2].function, "main");
        assert_eq!(frames[2].module, "");
    }

    #[test]
    fn test_split_symbol_drops_hash_suffix() {
        let (module, function) = split_symbol("app::db::query::h0123456789abcdef");
        assert_eq!(module, "app::db");
        assert_eq!(function, "query");
    }

    #[test]
    fn test_parse_ignores_location_lines() {
        let frames = parse_backtrace("             at ./src/main.rs:1:1\n");
        assert!(frames.is_empty());
    }
}
