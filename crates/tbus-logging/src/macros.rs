//! ---
//! tbus_section: "03-logging"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Structured logging context and command event helpers."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Logging macros that stamp every event with the [`LogContext`](crate::LogContext) fields.

#[doc(hidden)]
pub use tracing as __tracing;

#[doc(hidden)]
#[macro_export]
macro_rules! __bus_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        $crate::macros::__tracing::event!(
            $level,
            command = ctx.command.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            service = ctx.service.unwrap_or(""),
            msg_type = ctx.msg_type.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with command context.
#[macro_export]
macro_rules! bus_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bus_event!($crate::macros::__tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bus_event!(
            $crate::macros::__tracing::Level::INFO,
            $crate::LogContext::default(),
            $($arg)+
        )
    };
}

/// Emit a debug log enriched with command context.
#[macro_export]
macro_rules! bus_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bus_event!($crate::macros::__tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bus_event!(
            $crate::macros::__tracing::Level::DEBUG,
            $crate::LogContext::default(),
            $($arg)+
        )
    };
}

/// Emit a warning enriched with command context.
#[macro_export]
macro_rules! bus_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bus_event!($crate::macros::__tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bus_event!(
            $crate::macros::__tracing::Level::WARN,
            $crate::LogContext::default(),
            $($arg)+
        )
    };
}

/// Emit an error log enriched with command context.
#[macro_export]
macro_rules! bus_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bus_event!($crate::macros::__tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bus_event!(
            $crate::macros::__tracing::Level::ERROR,
            $crate::LogContext::default(),
            $($arg)+
        )
    };
}
