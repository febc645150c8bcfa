use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use console::style;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn accent<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).cyan()
}

pub fn fg<D: Display>(value: D) -> console::StyledObject<D> {
    style(value)
}

pub fn muted_style<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).dim()
}

pub fn success_style<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).green()
}

pub fn warning_style<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).yellow()
}

pub fn error_style<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).red()
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn section(title: &str) {
    println!();
    println!("{}", accent(title).bold());
}

pub fn step(message: &str) {
    println!("{} {}", accent("•").bold(), fg(message));
}

pub fn success(message: &str) {
    println!("{} {}", success_style("✓").bold(), fg(message));
}

pub fn warning(message: &str) {
    println!("{} {}", warning_style("!").bold(), fg(message));
}

pub fn error(message: &str) {
    println!("{} {}", error_style("✗").bold(), fg(message));
}

pub fn error_stderr(message: &str) {
    eprintln!("{} {}", error_style("✗").bold(), fg(message));
}

pub fn muted(message: &str) {
    println!("{}", muted_style(message));
}

/// Print only with `--verbose`.
pub fn detail(message: &str) {
    if is_verbose() {
        muted(message);
    }
}
