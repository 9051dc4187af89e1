use crate::report::Reporter;

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        print!("{} ", console::style("INFO ").on_blue().bright());
        println!($($arg)+);
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        print!("{} ", console::style("DONE ").on_green().bright());
        println!($($arg)+);
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        print!("{} ", console::style("WARN ").on_yellow().bright());
        println!($($arg)+);
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        eprint!("{} ", console::style("ERROR").on_red().bright());
        eprintln!($($arg)+);
    };
}

#[macro_export]
macro_rules! due_to {
    ($($arg:tt)+) => {
        eprint!("{} ", console::style("DUE TO").red().bold());
        eprintln!($($arg)+);
    };
}

/// Only printed with `--verbose`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        if $crate::cli::is_verbose() {
            eprint!("{} ", console::style("DEBUG").dim());
            eprintln!($($arg)+);
        }
    };
}

/// Sends resolver messages to the terminal
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        crate::info!("{}", msg);
    }

    fn verbose(&self, msg: &str) {
        crate::debug!("{}", msg);
    }

    fn warn(&self, msg: &str) {
        crate::warn!("{}", msg);
    }
}
