use clap::Parser;
use merchant_wizard::adapters::report::export_report;
use merchant_wizard::config::Command;
use merchant_wizard::core::orchestrator::CreationOrchestrator;
use merchant_wizard::core::preview::render_preview;
use merchant_wizard::core::progress::{render_items, watch_auto_close, AutoCloseOutcome, ProgressSummary};
use merchant_wizard::core::selector::EntitySelector;
use merchant_wizard::domain::ports::ProvisioningApi;
use merchant_wizard::utils::error::ErrorSeverity;
use merchant_wizard::utils::{logger, validation::Validate};
use merchant_wizard::{CliConfig, HttpProvisioningApi, LocalStorage, ProvisionError, ProvisionFile};
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting merchant-wizard CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    match execute(&config.command).await {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建议: {}", e.recovery_suggestion());

            std::process::exit(exit_code_for(e.severity()));
        }
    }

    Ok(())
}

/// 任何錯誤都回非零，讓腳本能判斷失敗
fn exit_code_for(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}

async fn execute(command: &Command) -> Result<i32, ProvisionError> {
    tracing::info!("📁 Loading request file: {}", command.file());
    let file = ProvisionFile::from_file(command.file())?;
    file.validate()?;

    match command {
        Command::Preview { .. } => {
            let wizard = file.to_wizard()?;
            println!("{}", render_preview(wizard.user_type(), wizard.form()));
            Ok(0)
        }
        Command::Whoami { .. } => {
            let api = HttpProvisioningApi::new(file.api.clone());
            let operator = api.current_operator().await?;
            println!("👤 {} <{}> id={}", operator.name, operator.email, operator.id);
            if let Some(role) = operator.role {
                println!("   role: {}", role);
            }
            Ok(0)
        }
        Command::Search { keyword, id, .. } => {
            let api = HttpProvisioningApi::new(file.api.clone());
            // 單次查詢不需要防抖
            let selector = EntitySelector::new(api, file.run.user_type).with_debounce(Duration::ZERO);
            if let Some(id) = id {
                match selector.set_value(id).await? {
                    Some(label) => println!("✅ {} -> {}", id, label),
                    None => println!("🔍 No {} with id {}", file.run.user_type, id),
                }
                return Ok(0);
            }
            let results = selector
                .search(keyword.as_deref().unwrap_or_default())
                .await?
                .unwrap_or_default();
            println!("🔍 {} result(s)", results.len());
            for record in results {
                println!("  {}  {}", record.id, record.display_label());
            }
            Ok(0)
        }
        Command::Provision {
            dry_run,
            retry_rounds,
            report,
            ..
        } => {
            let mut run = file.run.clone();
            if let Some(rounds) = retry_rounds {
                run.retry_rounds = *rounds;
            }
            if report.is_some() {
                run.report_path = report.clone();
            }
            provision(&file, &run, *dry_run).await
        }
    }
}

async fn provision(
    file: &ProvisionFile,
    run: &merchant_wizard::config::toml_config::RunConfig,
    dry_run: bool,
) -> Result<i32, ProvisionError> {
    let mut wizard = file.to_wizard()?;
    println!("{}", render_preview(wizard.user_type(), wizard.form()));
    println!();

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No API calls will be made");
        return Ok(0);
    }

    let form = wizard.submit()?;
    let api = HttpProvisioningApi::new(file.api.clone());
    match api.current_operator().await {
        Ok(operator) => tracing::info!("👤 Operating as {} ({})", operator.name, operator.id),
        Err(e) => tracing::warn!("⚠️ Could not load operator profile: {}", e),
    }

    let orchestrator = CreationOrchestrator::new(api, wizard.user_type(), &form);
    let auto_close = tokio::spawn(watch_auto_close(orchestrator.subscribe(), run.auto_close()));

    let mut outcome = orchestrator.run().await;
    println!("{}", outcome.toast());

    for round in 1..=run.retry_rounds {
        if outcome.is_success() {
            break;
        }
        tracing::info!("🔁 Retry round {}/{}", round, run.retry_rounds);
        let batch = orchestrator.retry_failed().await?;
        outcome = orchestrator.outcome();
        println!(
            "🔁 Retried {} item(s), skipped {}: {}",
            batch.attempted.len(),
            batch.skipped.len(),
            outcome.toast()
        );
    }

    let items = orchestrator.items();
    println!("{}", ProgressSummary::from_items(&items).status_line());
    println!("{}", render_items(&items));

    if let Some(report_path) = &run.report_path {
        let path = Path::new(report_path);
        let directory = path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "provision_report.csv".to_string());
        let storage = LocalStorage::new(if directory.is_empty() { ".".to_string() } else { directory });
        export_report(&storage, &file_name, &items).await?;
        println!("📁 Report saved to: {}", report_path);
    }

    if !outcome.is_success() {
        // 有失敗項目時不自動關閉，留給操作員處理
        drop(orchestrator);
        let _ = auto_close.await;
        eprintln!("💡 Fix the failed items and run again, or raise run.retry_rounds");
        return Ok(2);
    }

    if let Some(user_id) = orchestrator.user_id() {
        println!("🆔 User ID: {}", user_id);
    }
    wizard.finish_submission();

    if !run.auto_close().is_zero() {
        println!("⏲️ Closing in {} seconds", run.auto_close_seconds);
    }
    if let Ok(AutoCloseOutcome::Closed) = auto_close.await {
        tracing::info!("✅ Provisioning completed successfully!");
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_failure_exits_non_zero() {
        for severity in [
            ErrorSeverity::Low,
            ErrorSeverity::Medium,
            ErrorSeverity::High,
            ErrorSeverity::Critical,
        ] {
            assert_ne!(exit_code_for(severity), 0);
        }
    }

    #[test]
    fn test_request_without_routers_fails_before_submit() {
        let file = ProvisionFile::from_toml_str(
            r#"
[api]
base_url = "http://localhost:9"

[profile]
name = "Acme Pay"
email = "ops@acme.test"
phone = "9876543210"
default_ccy = "INR"

[[contracts]]
start_at = "2026-01-01T00:00:00Z"
"#,
        )
        .unwrap();
        let err = file.to_wizard().unwrap_err();
        assert!(matches!(err, ProvisionError::StepNavigationError { .. }));
        assert_ne!(exit_code_for(err.severity()), 0);
    }
}
