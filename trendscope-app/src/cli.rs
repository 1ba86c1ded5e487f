use clap::Parser;
use std::path::PathBuf;
use trendscope_common::observability::LogFormat;
use trendscope_config::TrendscopeConfig;

/// Find the AI trends of the last two weeks and write a cited markdown report.
#[derive(Debug, Parser)]
#[command(name = "trendscope", version, about)]
pub struct Cli {
    /// YAML configuration file. Missing files are skipped.
    #[arg(long, short, env = "TRENDSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory that receives the report.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Length of the reporting window in days.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=365))]
    pub days: Option<u32>,

    /// Log encoding: text or json.
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Also write logs to stderr.
    #[arg(long)]
    pub stderr: bool,

    /// Print the effective configuration, credentials masked, and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Flags win over file and environment values.
    pub fn apply(&self, cfg: &mut TrendscopeConfig) {
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(days) = self.days {
            cfg.pipeline.recency_days = days;
        }
        if let Some(format) = self.log_format {
            cfg.log.format = format;
        }
        if self.stderr {
            cfg.log.stderr = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_values() {
        let cli = Cli::parse_from([
            "trendscope",
            "--output-dir",
            "reports",
            "--days",
            "7",
            "--log-format",
            "json",
            "--stderr",
        ]);
        let mut cfg = TrendscopeConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.output_dir, PathBuf::from("reports"));
        assert_eq!(cfg.pipeline.recency_days, 7);
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert!(cfg.log.stderr);
    }

    #[test]
    fn days_must_be_positive() {
        assert!(Cli::try_parse_from(["trendscope", "--days", "0"]).is_err());
    }
}
