use crate::domain::model::ExecutionItem;
use crate::domain::ports::Storage;
use crate::utils::error::Result;

/// 將執行結果輸出成 CSV
pub fn render_report_csv(items: &[ExecutionItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "kind", "label", "status", "error"])?;
    for item in items {
        writer.write_record([
            item.id.as_str(),
            item.kind.as_str(),
            item.label.as_str(),
            item.status.as_str(),
            item.error.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

pub async fn export_report<S: Storage>(storage: &S, file_name: &str, items: &[ExecutionItem]) -> Result<()> {
    let data = render_report_csv(items)?;
    tracing::debug!("Writing report ({} bytes) to {}", data.len(), file_name);
    storage.write_file(file_name, &data).await?;
    tracing::info!("📁 Execution report saved: {}", file_name);
    Ok(())
}
