//! HTTPセッションと同意画面の処理
//!
//! 1回のスクレイプ実行につき1つのセッションを作成して使い回す。
//! Cookie jarはセッションの寿命の間、同意の受理などで書き換えられる。

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::{Client, Url};

use crate::config::{ScraperConfig, CONSENT_COOKIE, YOUTUBE_ORIGIN};
use crate::youtube::errors::YouTubeError;

// 同意画面の隠しフィールド（name, value）
static HIDDEN_INPUT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<input\s+type="hidden"\s+name="([A-Za-z0-9_]+)"\s+value="([A-Za-z0-9_\-\.]*)"\s*(?:required|)\s*>"#,
    )
    .expect("Failed to compile hidden input regex")
});

/// 取得したページ（リダイレクト解決後）
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// リダイレクト・同意処理を経た最終URL
    pub final_url: String,
}

/// スクレイプ実行ごとのHTTPセッション
///
/// 同時に走る2つのページネーションで共有しないこと。
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    config: ScraperConfig,
}

impl Session {
    /// 設定からセッションを作成
    ///
    /// # Errors
    /// HTTPクライアントのビルドに失敗した場合にエラーを返す
    pub fn new(config: ScraperConfig) -> Result<Self, YouTubeError> {
        let jar = Arc::new(Jar::default());

        // 通常は同意画面へのリダイレクト自体を回避できる
        if let Ok(origin) = YOUTUBE_ORIGIN.parse::<Url>() {
            jar.add_cookie_str(CONSENT_COOKIE, &origin);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.page_timeout)
            .build()?;

        Ok(Self { client, jar, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// セッションのCookie jar
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// ページをGETし、同意画面に飛ばされた場合は自動で受理する
    ///
    /// ネットワークエラーは再試行せずにそのまま返す。
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, YouTubeError> {
        log::info!("Fetching page: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            log::warn!("Page fetch returned status {}: {}", response.status(), url);
        }
        let final_url = response.url().to_string();
        let html = response.text().await?;

        if !is_consent_url(&final_url) {
            log::info!("Fetched page, final URL: {}", final_url);
            return Ok(FetchedPage { html, final_url });
        }

        log::info!("Consent redirect detected ({}), accepting", final_url);
        let params = consent_form_params(&html, url);

        let response = self
            .client
            .post(&self.config.consent_url)
            .query(&params)
            .send()
            .await?;
        let final_url = response.url().to_string();
        let html = response.text().await?;

        log::info!("Fetched page after consent, final URL: {}", final_url);
        Ok(FetchedPage { html, final_url })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("user_agent", &self.config.user_agent)
            .finish()
    }
}

/// 既定設定でセッションを作成
pub fn new_session() -> Result<Session, YouTubeError> {
    Session::new(ScraperConfig::default())
}

/// 同意画面に着地したか（最終URLに "consent" を含む）
fn is_consent_url(url: &str) -> bool {
    url.contains("consent")
}

/// 同意フォームの送信パラメータ（隠しフィールド + 固定フラグ）
///
/// 同名のフィールドは後勝ち。
fn consent_form_params(html: &str, continue_url: &str) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();

    let hidden = HIDDEN_INPUT_REGEX
        .captures_iter(html)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()));

    let fixed = [
        ("continue", continue_url),
        ("set_eom", "false"),
        ("set_ytc", "true"),
        ("set_apyt", "true"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()));

    for (name, value) in hidden.chain(fixed) {
        match params.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => params.push((name, value)),
        }
    }

    params
}
