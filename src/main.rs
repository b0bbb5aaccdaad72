use clap::Parser;
use sandbox_provisioner::config::SourceConfig;
use sandbox_provisioner::core::RequestSource;
use sandbox_provisioner::utils::error::ErrorSeverity;
use sandbox_provisioner::utils::{logger, validation::Validate};
use sandbox_provisioner::{
    CanvasClient, CliArgs, CsvRequestSource, GoogleAuthorizer, ProvisionConfig, ProvisionError,
    SandboxPipeline, SheetsRequestSource,
};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting sandbox-provisioner");

    if let Err(e) = run(&args).await {
        tracing::error!(
            "❌ Run aborted: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(args: &CliArgs) -> Result<(), ProvisionError> {
    tracing::info!("📁 Loading configuration from: {}", args.config.display());
    let mut config = ProvisionConfig::from_file(&args.config)?;
    args.apply_overrides(&mut config);
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");
    tracing::debug!(
        "Canvas: {} (account {}, term {}), source: {}",
        config.canvas.base_url,
        config.canvas.account_id,
        config.canvas.enrollment_term_id,
        config.source_kind()
    );

    let source = build_source(&config.source).await?;
    let client = CanvasClient::new(&config.canvas)?;
    let pipeline = SandboxPipeline::new(client, config.canvas.clone());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No courses will be created");
        for request in pipeline.plan(&*source).await? {
            println!(
                "Would create '{}' ({}) for {}",
                request.course_name,
                request.course_code(),
                request.requester_login
            );
        }
        return Ok(());
    }

    let report = pipeline.run(&*source).await?;
    if report.failures() > 0 {
        tracing::warn!(
            "⚠️ {} of {} requests need attention, see the lines above",
            report.failures(),
            report.requested
        );
    }
    Ok(())
}

async fn build_source(source: &SourceConfig) -> Result<Box<dyn RequestSource>, ProvisionError> {
    match source {
        SourceConfig::Csv(csv) => Ok(Box::new(CsvRequestSource::new(csv))),
        SourceConfig::Sheet(sheet) => {
            let authorizer =
                GoogleAuthorizer::from_files(&sheet.client_secret_path, &sheet.token_cache_path)?;
            let token = authorizer.access_token().await?;
            Ok(Box::new(SheetsRequestSource::new(sheet, token)?))
        }
    }
}
