use std::fmt;

use thiserror::Error;

/// HTMLに埋め込まれたJSONの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedBlob {
    /// `ytcfg.set({...})` のクライアント設定
    Ytcfg,
    /// `ytInitialData = {...}` の初期状態
    InitialData,
}

impl fmt::Display for EmbeddedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddedBlob::Ytcfg => f.write_str("ytcfg"),
            EmbeddedBlob::InitialData => f.write_str("ytInitialData"),
        }
    }
}

/// 埋め込みJSONの抽出エラー（どのブロブで失敗したかを保持）
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to extract {blob}: not found in page")]
    NotFound { blob: EmbeddedBlob },

    #[error("Failed to parse {blob} JSON: {source}")]
    InvalidJson {
        blob: EmbeddedBlob,
        #[source]
        source: serde_json::Error,
    },

    #[error("{blob} is missing required field {field}")]
    MissingField {
        blob: EmbeddedBlob,
        field: &'static str,
    },
}

impl ExtractionError {
    pub fn blob(&self) -> EmbeddedBlob {
        match self {
            ExtractionError::NotFound { blob }
            | ExtractionError::InvalidJson { blob, .. }
            | ExtractionError::MissingField { blob, .. } => *blob,
        }
    }
}

#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// ソートメニューが存在しない・選択できない
    #[error("Failed to set sorting: {0}")]
    Protocol(String),

    /// サーバーがレスポンス内で明示的に返したエラー
    #[error("Error returned from server: {0}")]
    ServerReported(String),

    /// 再試行を使い切ったAJAXリクエスト（strictモードのみ）
    #[error("InnerTube request failed after {attempts} attempts: {reason}")]
    AjaxFailed { attempts: u32, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl YouTubeError {
    /// 失敗した処理段階の名前（CLIなどでの報告用）
    pub fn stage(&self) -> &'static str {
        match self {
            YouTubeError::HttpError(_) | YouTubeError::AjaxFailed { .. } => "network",
            YouTubeError::Extraction(_) => "extraction",
            YouTubeError::Protocol(_) => "protocol",
            YouTubeError::ServerReported(_) => "server",
            YouTubeError::InvalidInput(_) => "input",
        }
    }
}

impl From<YouTubeError> for String {
    fn from(err: YouTubeError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_names_blob() {
        let err = ExtractionError::NotFound {
            blob: EmbeddedBlob::InitialData,
        };
        assert_eq!(err.blob(), EmbeddedBlob::InitialData);
        assert_eq!(
            err.to_string(),
            "Failed to extract ytInitialData: not found in page"
        );

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ExtractionError::InvalidJson {
            blob: EmbeddedBlob::Ytcfg,
            source,
        };
        assert!(err.to_string().starts_with("Failed to parse ytcfg JSON: "));
    }

    #[test]
    fn test_stage_names() {
        let err: YouTubeError = ExtractionError::MissingField {
            blob: EmbeddedBlob::Ytcfg,
            field: "INNERTUBE_API_KEY",
        }
        .into();
        assert_eq!(err.stage(), "extraction");
        assert_eq!(YouTubeError::Protocol("x".into()).stage(), "protocol");
        assert_eq!(YouTubeError::ServerReported("x".into()).stage(), "server");
        assert_eq!(
            YouTubeError::AjaxFailed {
                attempts: 5,
                reason: "timeout".into()
            }
            .stage(),
            "network"
        );

        let message: String = YouTubeError::ServerReported("quota".into()).into();
        assert_eq!(message, "Error returned from server: quota");
    }
}
