use serde::Deserialize;

use crate::error::ErrorKind;

/// 写入结果文件的错误标记
pub const ERROR_LABEL: &str = "Error";

/// 一条待分类的推文
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkItem {
    /// 推文ID
    #[serde(rename = "Tweet_ID")]
    pub id: String,
    /// 清洗后的推文内容，CSV 中为空时为 None
    #[serde(rename = "cleaned_tweet")]
    pub payload: Option<String>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, payload: Option<&str>) -> Self {
        Self {
            id: id.into(),
            payload: payload.map(str::to_string),
        }
    }

    /// 返回可以送去分类的文本，空白内容视为没有
    pub fn text(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// 一条分类结果（结果文件中的一行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: String,
    /// 原样回写的推文内容
    pub payload: String,
    /// 分类标签或 `ERROR_LABEL`
    pub label: String,
    /// 仅在失败时存在
    pub error_kind: Option<ErrorKind>,
}

impl ResultRow {
    pub fn is_error(&self) -> bool {
        self.error_kind.is_some() || self.label == ERROR_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_filters_blank_payload() {
        assert_eq!(WorkItem::new("1", Some("hello")).text(), Some("hello"));
        assert_eq!(WorkItem::new("2", Some("   ")).text(), None);
        assert_eq!(WorkItem::new("3", None).text(), None);
    }

    #[test]
    fn test_error_row_detected_by_label() {
        let row = ResultRow {
            id: "1".to_string(),
            payload: String::new(),
            label: ERROR_LABEL.to_string(),
            error_kind: None,
        };
        assert!(row.is_error());
    }
}
