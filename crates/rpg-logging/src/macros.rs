//! ---
//! rpg_section: "03-logging"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Structured logging context and convenience macros."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
#[doc(hidden)]
#[macro_export]
macro_rules! __rpg_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        $crate::__tracing::event!(
            $level,
            container = ctx.container.unwrap_or(""),
            process = ctx.process.unwrap_or(""),
            identifier = ctx.identifier.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with entity context.
#[macro_export]
macro_rules! rpg_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rpg_event!($crate::__tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::rpg_info!(context = $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with entity context.
#[macro_export]
macro_rules! rpg_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rpg_event!($crate::__tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::rpg_debug!(context = $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with entity context.
#[macro_export]
macro_rules! rpg_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rpg_event!($crate::__tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::rpg_warn!(context = $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with entity context.
#[macro_export]
macro_rules! rpg_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rpg_event!($crate::__tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::rpg_error!(context = $crate::LogContext::default(), $($arg)+)
    };
}
