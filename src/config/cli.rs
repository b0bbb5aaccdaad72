use crate::config::toml_config::{CsvSourceConfig, ProvisionConfig, SourceConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sandbox-provisioner")]
#[command(about = "Create sandbox courses in Canvas and enroll the requesting teachers")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sandbox.toml")]
    pub config: PathBuf,

    /// Read requests from this CSV file instead of the configured source
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// Override the number of concurrent course-creation requests
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Show what would be created without calling Canvas
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// 命令列參數覆蓋檔案設定
    pub fn apply_overrides(&self, config: &mut ProvisionConfig) {
        if let Some(path) = &self.source_file {
            let (course_name_column, email_column) = match &config.source {
                SourceConfig::Csv(csv) => (csv.course_name_column.clone(), csv.email_column.clone()),
                SourceConfig::Sheet(_) => ("Course Name".to_string(), "Email Address".to_string()),
            };
            config.source = SourceConfig::Csv(CsvSourceConfig {
                path: path.clone(),
                course_name_column,
                email_column,
            });
            tracing::info!("🔧 Source overridden to CSV file: {}", path.display());
        }

        if let Some(concurrency) = self.concurrency {
            config.canvas.concurrent_requests = concurrency;
            tracing::info!("🔧 Concurrency overridden to: {}", concurrency);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_override_switches_to_csv() {
        let mut config = ProvisionConfig::from_toml_str(
            r#"
[canvas]
base_url = "https://school.instructure.com"
token = "t"
account_id = "1"
enrollment_term_id = "2"

[source]
type = "sheet"
spreadsheet_id = "abc"
range = "A2:E"
client_secret_path = "client_secret.json"
"#,
        )
        .unwrap();

        let args = CliArgs::parse_from([
            "sandbox-provisioner",
            "--source-file",
            "requests.csv",
            "--concurrency",
            "3",
        ]);
        args.apply_overrides(&mut config);

        assert_eq!(config.source_kind(), "csv");
        assert_eq!(config.canvas.concurrent_requests, 3);
    }
}
