// Logging shims. With `feature = "tracing"` they forward to `tracing` under the
// `pooled_virtualizer` target; without it they expand to an empty block.

macro_rules! vtrace {
    ($($tt:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "pooled_virtualizer", $($tt)*);
    }};
}

macro_rules! vdebug {
    ($($tt:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "pooled_virtualizer", $($tt)*);
    }};
}
