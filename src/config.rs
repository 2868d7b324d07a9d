// =============================================================================
// 共通設定・定数モジュール
// =============================================================================
// スクレイパー全体で使用する共通の設定値・定数を定義
// =============================================================================

use std::time::Duration;

use crate::youtube::retry::RetryPolicy;

/// プラットフォームのオリジン
pub const YOUTUBE_ORIGIN: &str = "https://www.youtube.com";

/// 同意画面の受理エンドポイント
pub const YOUTUBE_CONSENT_URL: &str = "https://consent.youtube.com/save";

/// 全リクエストで固定するブラウザのUser-Agent
///
/// 動画一覧とコメント取得で挙動が分かれないよう、同一の値を使い続けること
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/79.0.3945.130 Safari/537.36";

/// 事前に投入する同意Cookie（同意画面へのリダイレクトを通常は回避できる）
pub const CONSENT_COOKIE: &str = "CONSENT=YES+cb; Domain=.youtube.com; Path=/";

/// ページ取得（HTML）のタイムアウト（秒）
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// InnerTube AJAXリクエストのタイムアウト（秒）
pub const AJAX_TIMEOUT_SECS: u64 = 60;

/// InnerTube AJAXリクエストの最大試行回数
pub const AJAX_MAX_ATTEMPTS: u32 = 5;

/// InnerTube AJAXリクエスト失敗時の再試行間隔（秒、固定）
pub const AJAX_RETRY_DELAY_SECS: u64 = 20;

/// continuation取得間の待機時間（ミリ秒）
///
/// バックオフではなくサーバーへの礼儀としての固定間隔
pub const PAGE_DELAY_MS: u64 = 100;

/// HTTPリクエストのデフォルトタイムアウト（Duration）
pub fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// スクレイパーの実行時設定
///
/// 既定値は上記の定数。テストではオリジンをモックサーバーに差し替える。
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// APIパスを連結するオリジン（末尾スラッシュなし）
    pub base_url: String,
    /// 同意画面の受理エンドポイント
    pub consent_url: String,
    pub user_agent: String,
    /// ページ取得のタイムアウト
    pub page_timeout: Duration,
    /// AJAXリクエスト1回あたりのタイムアウト
    pub ajax_timeout: Duration,
    /// AJAXリクエストの再試行ポリシー
    pub retry: RetryPolicy,
    /// continuation取得間の待機時間
    pub page_delay: Duration,
    /// trueの場合、再試行を使い切ったAJAX失敗をエラーとして返す
    ///
    /// falseの場合は従来通り「これ以上データなし」として扱う
    pub strict_ajax_failures: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: YOUTUBE_ORIGIN.to_string(),
            consent_url: YOUTUBE_CONSENT_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            page_timeout: http_timeout(),
            ajax_timeout: Duration::from_secs(AJAX_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            page_delay: Duration::from_millis(PAGE_DELAY_MS),
            strict_ajax_failures: false,
        }
    }
}

impl ScraperConfig {
    /// オリジンを差し替える（末尾スラッシュは除去）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_consent_url(mut self, consent_url: impl Into<String>) -> Self {
        self.consent_url = consent_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_ajax_timeout(mut self, timeout: Duration) -> Self {
        self.ajax_timeout = timeout;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_strict_ajax_failures(mut self, strict: bool) -> Self {
        self.strict_ajax_failures = strict;
        self
    }

    /// オリジンにパスを連結したURLを生成
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
