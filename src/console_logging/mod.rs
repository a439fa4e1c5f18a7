// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Console logging for binaries and tests that drive the subscription engine.

use std::{
    fmt,
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use env_logger::{fmt::Color, Builder};

/// Environment variable holding the filter, e.g. `opcua_subscriptions=debug`.
pub const LOG_ENV_VAR: &str = "RUST_OPCUA_LOG";

struct Pad<T> {
    value: T,
    width: usize,
}

impl<T: fmt::Display> fmt::Display for Pad<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{: <width$}", self.value, width = self.width)
    }
}

fn level_color(level: log::Level) -> (Color, Option<Color>) {
    match level {
        log::Level::Error => (Color::White, Some(Color::Red)),
        log::Level::Warn => (Color::Yellow, None),
        log::Level::Info => (Color::Cyan, None),
        log::Level::Debug => (Color::Green, None),
        log::Level::Trace => (Color::Ansi256(8), None),
    }
}

/// Installs the console logger. Calling it more than once is harmless, only the first call
/// installs anything.
pub fn init() {
    lazy_static! {
        static ref INITIALISED: AtomicBool = AtomicBool::new(false);
    }

    if INITIALISED.swap(true, Ordering::Relaxed) {
        return;
    }

    // RUST_LOG is shared with cargo and friends, so the filter comes from our own variable
    let mut builder = Builder::from_env(LOG_ENV_VAR);
    builder.format(|f, record| {
        let now = chrono::Utc::now();
        let time_fmt = now.format("%Y-%m-%d %H:%M:%S%.3f");

        let (fg, bg) = level_color(record.metadata().level());
        let mut style = f.style();
        style.set_color(fg);
        if let Some(bg) = bg {
            style.set_bg(bg);
        }
        let level = style.value(Pad {
            value: record.level(),
            width: 5,
        });

        let mut style = f.style();
        let target = style.set_bold(true).value(Pad {
            value: record.target(),
            width: 40,
        });

        writeln!(f, "{} {} {} {}", time_fmt, level, target, record.args())
    });
    // A logger installed by someone else wins
    if builder.try_init().is_ok() {
        info!(
            "Logging is enabled, use {} environment variable to control filtering, logging level",
            LOG_ENV_VAR
        );
    }
}
