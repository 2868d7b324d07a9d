//! InnerTube continuation APIクライアント

use serde_json::Value;

use super::context::ClientContext;
use super::types::ContinuationEndpoint;
use crate::util::mask_api_key;
use crate::youtube::errors::YouTubeError;
use crate::youtube::retry::run_with_retry;
use crate::youtube::session::Session;

/// continuationリクエスト1回分（再試行込み）の結果
#[derive(Debug)]
pub enum AjaxOutcome {
    /// 200 + JSONボディ
    Page(Value),
    /// 403 / 413、または空のJSON（200）: これ以上のデータなし（エラーではない）
    NoMoreData { status: u16 },
    /// 再試行を使い切った
    Failed { attempts: u32, reason: String },
}

impl AjaxOutcome {
    /// ページネーションの終端か（`Page` 以外）
    pub fn is_end(&self) -> bool {
        !matches!(self, AjaxOutcome::Page(_))
    }

    /// ドライバー向けに変換: `Ok(None)` はページネーション終了
    ///
    /// `strict` の場合のみ、再試行切れを `YouTubeError::AjaxFailed` として返す。
    pub fn into_page(self, strict: bool) -> Result<Option<Value>, YouTubeError> {
        match self {
            AjaxOutcome::Page(body) => Ok(Some(body)),
            AjaxOutcome::NoMoreData { .. } => Ok(None),
            AjaxOutcome::Failed { attempts, reason } if strict => {
                Err(YouTubeError::AjaxFailed { attempts, reason })
            }
            AjaxOutcome::Failed { .. } => Ok(None),
        }
    }
}

/// 1回の試行の結果
#[derive(Debug)]
pub enum AttemptResult {
    Success(Value),
    Rejected(u16),
    TimedOut,
    Failed(String),
}

/// InnerTube APIクライアント（セッションを借用）
pub struct InnerTubeClient<'s> {
    session: &'s Session,
}

impl<'s> InnerTubeClient<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// continuationをPOSTして次のページを取得
    ///
    /// URLはオリジン + トークンのapiUrl、APIキーはクエリ、ボディは `{context, continuation}`。
    pub async fn continuation(
        &self,
        endpoint: &ContinuationEndpoint,
        ctx: &ClientContext,
    ) -> AjaxOutcome {
        let config = self.session.config();
        let url = config.url(&endpoint.api_url);
        let body = ctx.request_body(&endpoint.token);

        log::debug!(
            "POST {} (key: {}, token length: {})",
            url,
            mask_api_key(ctx.api_key()),
            endpoint.token.len()
        );

        let url = url.as_str();
        let body = &body;
        run_with_retry(&config.retry, |_| self.attempt(url, ctx.api_key(), body)).await
    }

    /// `continuation` を呼び、設定のstrictモードに従ってページかどうかに変換
    pub async fn fetch_page(
        &self,
        endpoint: &ContinuationEndpoint,
        ctx: &ClientContext,
    ) -> Result<Option<Value>, YouTubeError> {
        let outcome = self.continuation(endpoint, ctx).await;
        if let AjaxOutcome::Failed { attempts, reason } = &outcome {
            log::warn!(
                "Ending pagination after {} failed attempts: {}",
                attempts,
                reason
            );
        }
        outcome.into_page(self.session.config().strict_ajax_failures)
    }

    async fn attempt(&self, url: &str, api_key: &str, body: &Value) -> AttemptResult {
        let result = self
            .session
            .http()
            .post(url)
            .query(&[("key", api_key)])
            .json(body)
            .timeout(self.session.config().ajax_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return AttemptResult::TimedOut,
            Err(e) => return AttemptResult::Failed(format!("request error: {}", e)),
        };

        let status = response.status().as_u16();
        match status {
            200 => match response.json::<Value>().await {
                Ok(value) => AttemptResult::Success(value),
                Err(e) if e.is_timeout() => AttemptResult::TimedOut,
                Err(e) => AttemptResult::Failed(format!("invalid JSON body: {}", e)),
            },
            403 | 413 => AttemptResult::Rejected(status),
            other => AttemptResult::Failed(format!("unexpected status {}", other)),
        }
    }
}

impl std::fmt::Debug for InnerTubeClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InnerTubeClient")
            .field("base_url", &self.session.config().base_url)
            .finish()
    }
}
