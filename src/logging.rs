use std::io::Write;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use log::LevelFilter;

fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the process logger; later calls are no-ops.
///
/// Lines look like `[1700000000123ms][cook-3][DEBUG] message` and go to
/// stderr so stdout stays reserved for the restaurant report.
/// `RUST_LOG` overrides the build-dependent default level.
pub fn init() {
    let _ = env_logger::Builder::new()
        .filter_level(default_level())
        .parse_default_env()
        .format(|buf, record| {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let current = thread::current();
            let thread_name = current.name().unwrap_or("unnamed");
            writeln!(
                buf,
                "[{ts}ms][{thread_name}][{}] {}",
                record.level(),
                record.args()
            )
        })
        .try_init();
}
