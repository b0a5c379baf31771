//! 进度文件服务 - 业务能力层
//!
//! 结果 CSV 同时就是进度记录：启动时读出已完成的推文ID，
//! 之后每写一行就 flush + fsync 一次，崩溃最多丢失正在处理的那一条。

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::error::{AppResult, ErrorKind, FileError, StoreError};
use crate::models::{ResultRow, ERROR_LABEL};

/// 默认表头
pub const BASE_HEADER: [&str; 3] = ["Tweet_ID", "cleaned_tweet", "classification"];
/// 开启 `record_error_kind` 时追加的列
pub const ERROR_KIND_COLUMN: &str = "error_kind";

/// 进度文件选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// 额外写出 error_kind 列
    pub record_error_kind: bool,
    /// 把最近一次为 Error 的推文视为未完成
    pub retry_error_rows: bool,
}

impl StoreOptions {
    pub fn header(&self) -> Vec<&'static str> {
        let mut header = BASE_HEADER.to_vec();
        if self.record_error_kind {
            header.push(ERROR_KIND_COLUMN);
        }
        header
    }
}

/// 从已有结果文件读出的内容
#[derive(Debug, Default)]
pub struct StoredRows {
    pub header: Vec<String>,
    pub rows: Vec<ResultRow>,
    /// 因写了一半而被忽略的行数
    pub torn: usize,
    /// 最后一条完整记录结束处的字节偏移
    pub complete_len: u64,
}

/// 进度文件
///
/// 职责：
/// - 启动时加载已完成的推文ID集合
/// - 追加一行结果并立即落盘
/// - 运行期间独占文件句柄
pub struct ProgressStore {
    path: PathBuf,
    options: StoreOptions,
    writer: csv::Writer<File>,
    completed: HashSet<String>,
    reopened: usize,
}

impl ProgressStore {
    /// 打开（或创建）进度文件
    ///
    /// 末尾写了一半的记录会被截掉，之后的追加从最后一条完整记录之后开始。
    pub fn open(path: &Path, options: StoreOptions) -> AppResult<Self> {
        let shown = path.display().to_string();
        let expected = options.header();

        let existing_len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let mut completed = HashSet::new();
        let mut reopened = 0;
        let mut keep_len = 0;

        if existing_len > 0 {
            let stored = read_rows(path)?;
            if stored.header != expected {
                return Err(StoreError::HeaderMismatch {
                    path: shown,
                    expected: expected.join(","),
                    found: stored.header.join(","),
                }
                .into());
            }
            keep_len = stored.complete_len;

            // 同一ID出现多次时以最后一行为准
            let mut latest: HashMap<String, bool> = HashMap::new();
            for row in &stored.rows {
                latest.insert(row.id.clone(), row.is_error());
            }

            for (id, is_error) in latest {
                if options.retry_error_rows && is_error {
                    reopened += 1;
                } else {
                    completed.insert(id);
                }
            }

            info!(
                "📂 已加载进度文件 {}: {} 行, {} 个已完成",
                shown,
                stored.rows.len(),
                completed.len()
            );
            if reopened > 0 {
                info!("🔁 {} 条之前失败的推文将重新分类", reopened);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StoreError::OpenFailed {
                path: shown.clone(),
                source,
            })?;

        if keep_len < existing_len {
            warn!(
                "进度文件末尾有 {} 字节不完整，已截断",
                existing_len - keep_len
            );
            file.set_len(keep_len)
                .and_then(|_| file.sync_data())
                .map_err(|source| StoreError::AppendFailed {
                    path: shown.clone(),
                    source,
                })?;
        }

        let writer = WriterBuilder::new().has_headers(false).from_writer(file);

        let mut store = Self {
            path: path.to_path_buf(),
            options,
            writer,
            completed,
            reopened,
        };

        if keep_len == 0 {
            debug!("写入进度文件表头 {}", shown);
            store.write_and_sync(&expected)?;
        }

        Ok(store)
    }

    /// 该ID是否已有结果
    pub fn contains(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    /// 已完成的推文数量
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// 因 `retry_error_rows` 重新打开的推文数量
    pub fn reopened_count(&self) -> usize {
        self.reopened
    }

    /// 追加一条结果并立即落盘
    pub fn append(&mut self, row: &ResultRow) -> AppResult<()> {
        let mut record = vec![row.id.as_str(), row.payload.as_str(), row.label.as_str()];
        if self.options.record_error_kind {
            record.push(row.error_kind.map(ErrorKind::as_str).unwrap_or(""));
        }

        self.write_and_sync(&record)?;
        self.completed.insert(row.id.clone());

        Ok(())
    }

    fn write_and_sync(&mut self, record: &[&str]) -> AppResult<()> {
        let path = self.path.display().to_string();
        let append_failed = |source: std::io::Error| StoreError::AppendFailed {
            path: path.clone(),
            source,
        };

        self.writer
            .write_record(record)
            .map_err(|e| append_failed(e.into()))?;
        self.writer.flush().map_err(append_failed)?;
        self.writer.get_ref().sync_data().map_err(append_failed)?;

        Ok(())
    }
}

/// 读取已有的结果文件
///
/// 字段不足的行会被忽略。文件末尾的最后一条记录如果没有以换行结束，
/// 或者停在一个没闭合的引号里，视为写了一半。
pub fn read_rows(path: &Path) -> AppResult<StoredRows> {
    let shown = path.display().to_string();
    let csv_error = |source| FileError::CsvParseFailed {
        path: shown.clone(),
        source,
    };

    let file_len = std::fs::metadata(path)
        .map_err(|source| FileError::ReadFailed {
            path: shown.clone(),
            source,
        })?
        .len();
    let complete_tail = ends_with_newline(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut record = StringRecord::new();
    if !reader.read_record(&mut record).map_err(csv_error)? {
        return Ok(StoredRows::default());
    }

    let header: Vec<String> = record.iter().map(|h| h.trim().to_string()).collect();
    let with_kind = header.len() > BASE_HEADER.len();
    let header_end = reader.position().byte();

    let mut stored = StoredRows {
        header,
        // 表头本身没写完时整个文件重来
        complete_len: if header_end >= file_len && !complete_tail {
            0
        } else {
            header_end
        },
        ..Default::default()
    };

    while reader.read_record(&mut record).map_err(csv_error)? {
        let end = reader.position().byte();
        let at_tail = end >= file_len;
        // label / error_kind 不会含换行，出现换行说明引号没闭合
        let open_quote = record.iter().last().is_some_and(|field| field.contains('\n'));

        if record.len() < BASE_HEADER.len() || (at_tail && (!complete_tail || open_quote)) {
            stored.torn += 1;
            continue;
        }
        stored.complete_len = end;

        let label = record[2].to_string();
        let error_kind = if with_kind {
            record.get(3).and_then(ErrorKind::from_str_opt)
        } else {
            None
        };
        let error_kind = match error_kind {
            Some(kind) => Some(kind),
            None if label == ERROR_LABEL && with_kind => Some(ErrorKind::Unknown),
            None => None,
        };

        stored.rows.push(ResultRow {
            id: record[0].trim().to_string(),
            payload: record[1].to_string(),
            label,
            error_kind,
        });
    }

    if stored.torn > 0 {
        warn!("进度文件 {} 中有 {} 行不完整，已忽略", shown, stored.torn);
    }

    Ok(stored)
}

fn ends_with_newline(path: &Path) -> AppResult<bool> {
    let shown = path.display().to_string();
    let read_failed = |source| FileError::ReadFailed {
        path: shown.clone(),
        source,
    };

    let mut file = File::open(path).map_err(read_failed)?;
    let len = file.metadata().map_err(read_failed)?.len();
    if len == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1)).map_err(read_failed)?;
    file.read_exact(&mut last).map_err(read_failed)?;
    Ok(last[0] == b'\n')
}
