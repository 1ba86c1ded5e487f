use std::sync::OnceLock;

use trendscope_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let dir = tempfile::tempdir()
            .map(|d| d.keep())
            .unwrap_or_else(|_| std::env::temp_dir());
        let config = LogConfig {
            app_name: "trendscope-tests",
            log_dir: Some(dir),
            emit_stderr: true,
            format: if std::env::var("TRENDSCOPE_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug",
        };

        trendscope_common::observability::init_logging(config).unwrap_or_default()
    });
}
