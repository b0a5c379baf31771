use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tokio::fs;

use crate::error::{AppResult, FileError};
use crate::models::work_item::WorkItem;

/// 推文ID列名
pub const ID_COLUMN: &str = "Tweet_ID";
/// 推文内容列名
pub const PAYLOAD_COLUMN: &str = "cleaned_tweet";

/// 从 CSV 文件加载所有待分类推文（保持文件中的顺序）
///
/// 文件必须包含 `Tweet_ID` 和 `cleaned_tweet` 两列，其他列忽略。
/// ID 为空的行无法追踪进度，直接跳过。
pub async fn load_work_items(csv_path: &Path) -> AppResult<Vec<WorkItem>> {
    let display = csv_path.display().to_string();

    if !csv_path.exists() {
        return Err(FileError::NotFound { path: display }.into());
    }

    let content = fs::read(csv_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: display.clone(),
            source,
        })?;

    parse_work_items(&content, &display)
}

/// 解析 CSV 内容
pub fn parse_work_items(content: &[u8], origin: &str) -> AppResult<Vec<WorkItem>> {
    let csv_error = |source| FileError::CsvParseFailed {
        path: origin.to_string(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(content);

    let headers = reader.headers().map_err(csv_error)?.clone();
    for column in [ID_COLUMN, PAYLOAD_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(FileError::MissingColumn {
                path: origin.to_string(),
                column: column.to_string(),
            }
            .into());
        }
    }

    let mut items = Vec::new();
    for (line, record) in reader.deserialize::<WorkItem>().enumerate() {
        let mut item = record.map_err(csv_error)?;
        item.id = item.id.trim().to_string();
        if item.id.is_empty() {
            tracing::warn!("第 {} 行缺少 {}，已跳过", line + 2, ID_COLUMN);
            continue;
        }
        items.push(item);
    }

    Ok(items)
}
