use std::fmt;
use std::io::{self, StdoutLock, Write};

pub mod cc {
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
    pub const ORANGE: &str = "\x1b[38;5;208m";
    pub const DARK_GRAY: &str = "\x1b[38;5;238m";
    pub const LIGHT_GRAY: &str = "\x1b[38;5;245m";
    pub const LIGHT_GREEN: &str = "\x1b[92m";
    pub const LIGHT_BLUE: &str = "\x1b[94m";
    pub const LIGHT_RED: &str = "\x1b[91m";
}

/// Backend of [`log!`]: one timestamped, colored line on stderr.
#[doc(hidden)]
pub fn emit(color: &str, args: fmt::Arguments<'_>) {
    let time = chrono::Utc::now().format("%H:%M:%S%.3f");
    let mut stderr = io::stderr().lock();
    let _ = writeln!(
        stderr,
        "{}{} | {}{}{}{}",
        cc::LIGHT_GRAY,
        time,
        cc::RESET,
        color,
        args,
        cc::RESET
    );
}

/// Timestamped stderr logging.
///
/// ```ignore
/// log!("plain: {}", x);
/// log!(cc::GREEN, "deployed at {addr}");
/// ```
#[macro_export]
macro_rules! log {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::libs::writing::emit(
            $crate::libs::writing::cc::LIGHT_GRAY,
            format_args!($fmt $(, $arg)*),
        )
    };
    ($color:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::libs::writing::emit($color, format_args!($fmt $(, $arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::libs::writing::emit($crate::libs::writing::cc::ORANGE, format_args!($($arg)*))
    };
}

/// Colored stdout printing and prompting for the interactive board.
pub struct Colors<'a> {
    lock: StdoutLock<'a>,
}

impl<'a> Colors<'a> {
    pub fn new(lock: StdoutLock<'a>) -> Self {
        Self { lock }
    }

    pub fn cprint(&mut self, text: &str, color: &str) {
        let _ = writeln!(self.lock, "{}{}{}", color, text, cc::RESET);
    }

    /// Print `text` as a prompt and read one trimmed line from stdin.
    /// EOF reads as `None`.
    pub fn cinput(&mut self, text: &str, color: &str) -> Option<String> {
        let _ = write!(self.lock, "{}{}{} ", color, text, cc::RESET);
        let _ = self.lock.flush();
        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim().to_string()),
        }
    }

    pub fn err_print(&mut self, text: &str) {
        let _ = writeln!(self.lock, "{}{}{}", cc::RED, text, cc::RESET);
    }
}
