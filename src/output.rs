//! User-facing terminal lines, separate from tracing output.
//! Prefixes are colored only when the target stream is a TTY.

use owo_colors::{OwoColorize, Style};

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn emit(stream: Stream, prefix: &str, style: Style, msg: &str) {
    let tty = match stream {
        Stream::Stdout => atty::is(atty::Stream::Stdout),
        Stream::Stderr => atty::is(atty::Stream::Stderr),
    };
    let line = if tty {
        format!("{} {msg}", prefix.style(style))
    } else {
        format!("{prefix} {msg}")
    };
    match stream {
        Stream::Stdout => println!("{line}"),
        Stream::Stderr => eprintln!("{line}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Stream::Stdout, "info:", Style::new().cyan().bold(), msg);
}

pub fn print_success(msg: &str) {
    emit(Stream::Stdout, "ok:", Style::new().green().bold(), msg);
}

pub fn print_warn(msg: &str) {
    emit(Stream::Stderr, "warn:", Style::new().yellow().bold(), msg);
}

pub fn print_error(msg: &str) {
    emit(Stream::Stderr, "error:", Style::new().red().bold(), msg);
}

/// Unprefixed line on stdout, for output users may script against (dry-run plans).
pub fn print_user(msg: &str) {
    println!("{msg}");
}
