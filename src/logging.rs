use tracing::Level;
use tracing_subscriber::fmt;

/// Install the stderr subscriber used by the `qrscan` binary.
///
/// Quiet unless `verbose`; `trace` additionally shows per-stage detail.
/// Library code only emits events and never installs a subscriber itself.
pub fn init(verbose: bool, trace: bool) {
    if !verbose && !trace {
        return;
    }
    let level = if trace { Level::TRACE } else { Level::DEBUG };
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
