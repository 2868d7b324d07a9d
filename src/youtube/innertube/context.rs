//! InnerTubeクライアントコンテキスト（ytcfg）

use serde_json::{json, Value};

use crate::util::mask_api_key;
use crate::youtube::errors::{EmbeddedBlob, ExtractionError};

const API_KEY_FIELD: &str = "INNERTUBE_API_KEY";
const CONTEXT_FIELD: &str = "INNERTUBE_CONTEXT";

/// ページから抽出したytcfgのうち、AJAXリクエストに必要な部分
///
/// 1回のページネーション実行が専有する。リクエスト前であれば言語を書き換えてよい。
#[derive(Clone)]
pub struct ClientContext {
    api_key: String,
    context: Value,
}

impl ClientContext {
    /// ytcfgから生成（APIキーとコンテキストは必須）
    pub fn from_ytcfg(ytcfg: &Value) -> Result<Self, ExtractionError> {
        let api_key = ytcfg
            .get(API_KEY_FIELD)
            .and_then(Value::as_str)
            .ok_or(ExtractionError::MissingField {
                blob: EmbeddedBlob::Ytcfg,
                field: API_KEY_FIELD,
            })?
            .to_string();

        let context = ytcfg
            .get(CONTEXT_FIELD)
            .filter(|v| v.is_object())
            .cloned()
            .ok_or(ExtractionError::MissingField {
                blob: EmbeddedBlob::Ytcfg,
                field: CONTEXT_FIELD,
            })?;

        Ok(Self { api_key, context })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    /// `context.client.hl` を上書き（clientが無ければ作成）
    pub fn set_language(&mut self, language: &str) {
        let Some(context) = self.context.as_object_mut() else {
            return;
        };
        let client = context
            .entry("client")
            .or_insert_with(|| json!({}));
        if !client.is_object() {
            *client = json!({});
        }
        if let Some(client) = client.as_object_mut() {
            client.insert("hl".to_string(), Value::String(language.to_string()));
        }
    }

    /// 現在の言語（未設定なら `None`）
    pub fn language(&self) -> Option<&str> {
        self.context
            .get("client")
            .and_then(|c| c.get("hl"))
            .and_then(Value::as_str)
    }

    /// continuationリクエストのボディ `{context, continuation}` を構築
    pub fn request_body(&self, token: &str) -> Value {
        json!({
            "context": self.context,
            "continuation": token,
        })
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("language", &self.language())
            .finish()
    }
}
