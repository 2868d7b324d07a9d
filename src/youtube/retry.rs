use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;

use crate::config::{AJAX_MAX_ATTEMPTS, AJAX_RETRY_DELAY_SECS};
use crate::youtube::innertube::client::{AjaxOutcome, AttemptResult};

/// 固定間隔の再試行ポリシー
///
/// 指数バックオフではなく、失敗ごとに同じ間隔だけ待機する。
/// 試行回数を使い切ると呼び出し側に失敗を返す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
    max_attempts: u32,
}

impl RetryPolicy {
    /// デフォルト設定:
    /// - delay: 20秒
    /// - max_attempts: 5回
    pub fn new() -> Self {
        Self {
            delay: Duration::from_secs(AJAX_RETRY_DELAY_SECS),
            max_attempts: AJAX_MAX_ATTEMPTS,
        }
    }

    /// カスタム設定で作成（max_attemptsは最低1回）
    pub fn with_config(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `attempt` 回目の失敗後にまだ再試行できるか
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// 再試行ループ本体
///
/// - `Success` は即座に `Page` として返す（空のJSONは `NoMoreData`）
/// - `Rejected`（403/413）は再試行せず `NoMoreData` を返す
/// - `TimedOut` / `Failed` は固定間隔の待機後に再試行し、使い切ったら `Failed`
///
/// `attempt` には1始まりの試行番号が渡される。
pub(crate) async fn run_with_retry<F, Fut>(policy: &RetryPolicy, mut attempt: F) -> AjaxOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptResult>,
{
    let mut last_reason = String::from("no attempt made");

    for n in 1..=policy.max_attempts() {
        match attempt(n).await {
            AttemptResult::Success(body) if is_empty_body(&body) => {
                log::info!("InnerTube returned an empty response, treating as end of data");
                return AjaxOutcome::NoMoreData { status: 200 };
            }
            AttemptResult::Success(body) => return AjaxOutcome::Page(body),
            AttemptResult::Rejected(status) => {
                log::info!("InnerTube request rejected with status {}, treating as end of data", status);
                return AjaxOutcome::NoMoreData { status };
            }
            AttemptResult::TimedOut => {
                log::warn!("InnerTube request timed out (attempt {}/{})", n, policy.max_attempts());
                last_reason = "request timed out".to_string();
            }
            AttemptResult::Failed(reason) => {
                log::warn!(
                    "InnerTube request failed (attempt {}/{}): {}",
                    n,
                    policy.max_attempts(),
                    reason
                );
                last_reason = reason;
            }
        }

        if policy.should_retry(n) {
            sleep(policy.delay()).await;
        }
    }

    log::warn!(
        "InnerTube request gave up after {} attempts: {}",
        policy.max_attempts(),
        last_reason
    );
    AjaxOutcome::Failed {
        attempts: policy.max_attempts(),
        reason: last_reason,
    }
}

/// `null`・`{}`・`[]` はデータ無しとみなす
fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
