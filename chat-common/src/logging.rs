//! Logging setup and the `incoming!`/`outgoing!`/`internal!` event macros.
//!
//! Every component logs through these three macros rather than calling
//! `tracing` directly, so a log scrape can always answer "was this a wire
//! event, or an internal decision?" from the span name alone.

use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    fmt::time::FormatTime,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

struct Time;

impl FormatTime for Time {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().timestamp_micros())
    }
}

/// Emit an event tagged with a span, at a chosen (or default `TRACE`) level.
#[macro_export]
macro_rules! log {
    ($level:ident, $span:expr, $($msg:expr),+ $(,)?) => {{
        let span = tracing::span!(tracing::Level::$level, $span);
        let _enter = span.enter();
        tracing::event!(tracing::Level::$level, $($msg),+);
    }};
}

/// Something arriving from a client transport.
#[macro_export]
macro_rules! incoming {
    (level = $level:ident, $($msg:expr),+ $(,)?) => {
        $crate::log!($level, "incoming", $($msg),+)
    };
    ($($msg:expr),+ $(,)?) => {
        $crate::log!(TRACE, "incoming", $($msg),+)
    };
}

/// Something being sent to a client transport.
#[macro_export]
macro_rules! outgoing {
    (level = $level:ident, $($msg:expr),+ $(,)?) => {
        $crate::log!($level, "outgoing", $($msg),+)
    };
    ($($msg:expr),+ $(,)?) => {
        $crate::log!(TRACE, "outgoing", $($msg),+)
    };
}

/// An internal decision with no direct client-facing counterpart.
#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:expr),+ $(,)?) => {
        $crate::log!($level, "internal", $($msg),+)
    };
    ($($msg:expr),+ $(,)?) => {
        $crate::log!(TRACE, "internal", $($msg),+)
    };
}

/// Installs a global `tracing` subscriber.
///
/// Honors `LOG_LEVEL` (falling back to `debug` in debug builds, `info` in
/// release), and restricts output to spans whose target starts with `chat`
/// so a dependency's own `trace!` noise doesn't drown out the service's.
pub fn init() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(if cfg!(debug_assertions) {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_timer(Time)
        .with_target(false)
        .with_level(false);

    tracing_subscriber::registry()
        .with(level)
        .with(FilterFn::new(|metadata| metadata.target().starts_with("chat")))
        .with(fmt_layer)
        .init();
}
