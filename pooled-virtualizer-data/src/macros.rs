// Logging shims, same shape as the core crate's: `tracing` under the
// `pooled_virtualizer_data` target when the feature is on, nothing otherwise.

macro_rules! vtrace {
    ($($tt:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "pooled_virtualizer_data", $($tt)*);
    }};
}

macro_rules! vdebug {
    ($($tt:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "pooled_virtualizer_data", $($tt)*);
    }};
}

macro_rules! vwarn {
    ($($tt:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::warn!(target: "pooled_virtualizer_data", $($tt)*);
    }};
}
