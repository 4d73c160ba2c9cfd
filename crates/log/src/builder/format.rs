//! Format layer creation macros

/// Build a boxed `fmt` layer writing to stderr.
///
/// Time display changes the layer's type, so both branches are boxed.
macro_rules! create_fmt_layer {
    ($format:ident, $display:expr) => {{
        let layer = tracing_subscriber::fmt::layer()
            .$format()
            .with_writer(std::io::stderr)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source);

        if $display.time {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        }
    }};
}
