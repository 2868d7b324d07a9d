//! チャンネル動画一覧のページネーション
//!
//! 初期ページのグリッドを表示順に読み、以降はcontinuationのappend配列を
//! 配列順に追加していく。`order` は1始まりの連番で、最新の動画が1。

use tokio::time::sleep;

use super::errors::YouTubeError;
use super::ids::channel_path;
use super::innertube::parser::{
    initial_continuation, next_continuation, parse_continuation_videos, parse_initial_videos,
};
use super::innertube::{extract_initial_data, extract_ytcfg, ClientContext, InnerTubeClient};
use super::session::Session;
use super::types::Video;

/// 表示順に動画を蓄積し、連番を振る
#[derive(Debug)]
struct VideoList {
    videos: Vec<Video>,
    limit: Option<usize>,
}

impl VideoList {
    fn new(limit: Option<usize>) -> Self {
        Self {
            videos: Vec::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.videos.len() >= limit)
    }

    /// 次の連番を振って追加（上限に達していれば追加しない）
    fn push(&mut self, mut video: Video) -> bool {
        if self.is_full() {
            return false;
        }
        video.order = self.videos.len() + 1;
        log::debug!(
            "Video {} fetched: {} ({}){}",
            video.order,
            video.title,
            video.video_id,
            video
                .view_count
                .map(|v| format!(" - {} views", v))
                .unwrap_or_default()
        );
        self.videos.push(video);
        true
    }

    /// まとめて追加し、上限に達した時点で打ち切る
    fn extend(&mut self, videos: Vec<Video>) {
        for video in videos {
            if !self.push(video) {
                break;
            }
        }
    }
}

/// チャンネルの動画を新しい順にすべて（または `max_videos` 件まで）取得
///
/// `channel` は `@handle`、チャンネルID、`c/` などのパス、チャンネルURLのいずれか。
///
/// # Errors
/// - チャンネル指定が不正な場合は `InvalidInput`
/// - ページ取得の失敗は `HttpError`（再試行しない）
/// - ytcfg / ytInitialData が取り出せない場合は `Extraction`
/// - strictモードで再試行を使い切った場合は `AjaxFailed`
pub async fn fetch_channel_videos(
    session: &Session,
    channel: &str,
    max_videos: Option<usize>,
) -> Result<Vec<Video>, YouTubeError> {
    let path = channel_path(channel)?;

    if max_videos == Some(0) {
        log::info!("max_videos is 0, nothing to fetch for {}", path);
        return Ok(Vec::new());
    }

    let config = session.config();
    let page = session
        .fetch(&config.url(&format!("/{}/videos", path)))
        .await?;

    let ctx = ClientContext::from_ytcfg(&extract_ytcfg(&page.html)?)?;
    let data = extract_initial_data(&page.html)?;

    let mut list = VideoList::new(max_videos);

    let initial = parse_initial_videos(&data);
    if !initial.ordered {
        log::warn!("Video order for {} may not match the channel page", path);
    }
    list.extend(initial.videos);
    log::info!("Initial batch: {} videos", list.videos.len());

    let client = InnerTubeClient::new(session);
    let mut continuation = initial_continuation(&data);

    while let Some(endpoint) = continuation.take() {
        if list.is_full() {
            break;
        }

        log::debug!("Fetching more videos... (current: {})", list.videos.len());
        let Some(response) = client.fetch_page(&endpoint, &ctx).await? else {
            log::info!("No more video pages for {}", path);
            break;
        };

        let batch = parse_continuation_videos(&response);
        log::debug!("Continuation returned {} videos", batch.len());
        list.extend(batch);

        if list.is_full() {
            log::info!("Reached max_videos limit ({})", list.videos.len());
            break;
        }

        continuation = next_continuation(&response);
        if continuation.is_none() {
            log::info!("No continuation found, stopping pagination");
            break;
        }

        sleep(config.page_delay).await;
    }

    log::info!("Total videos fetched for {}: {}", path, list.videos.len());
    Ok(list.videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::youtube::innertube::parser::fixtures::*;
    use crate::youtube::retry::RetryPolicy;
    use mockito::{Matcher, ServerGuard};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn bootstrap_html(initial_data: &Value) -> String {
        let ytcfg = json!({
            "INNERTUBE_API_KEY": "test-key",
            "INNERTUBE_CONTEXT": {"client": {"hl": "en", "clientName": "WEB"}}
        });
        format!(
            "<html><script>ytcfg.set({});</script>\n<script>var ytInitialData = {};</script></html>",
            ytcfg, initial_data
        )
    }

    fn test_session(server: &ServerGuard) -> Session {
        let config = ScraperConfig::default()
            .with_base_url(server.url())
            .with_retry(RetryPolicy::with_config(Duration::ZERO, 2))
            .with_page_delay(Duration::ZERO);
        Session::new(config).unwrap()
    }

    /// 3件 + continuation の初期ページと、2件 + 次のcontinuation のレスポンス
    ///
    /// `hits` は2ページ目・3ページ目への期待リクエスト数
    async fn channel_fixture(
        server: &mut ServerGuard,
        hits: (usize, usize),
    ) -> (mockito::Mock, mockito::Mock, mockito::Mock) {
        let initial = initial_page(vec![
            video_item("v1", "one"),
            video_item("v2", "two"),
            video_item("v3", "three"),
            continuation_item("tok-2"),
        ]);

        let page = server
            .mock("GET", "/@chan/videos")
            .with_status(200)
            .with_body(bootstrap_html(&initial))
            .expect(1)
            .create_async()
            .await;

        let second = server
            .mock("POST", "/youtubei/v1/browse")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({"continuation": "tok-2"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                append_response(vec![
                    video_item("v4", "four"),
                    video_item("v5", "five"),
                    continuation_item("tok-3"),
                ])
                .to_string(),
            )
            .expect(hits.0)
            .create_async()
            .await;

        let third = server
            .mock("POST", "/youtubei/v1/browse")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({"continuation": "tok-3"})))
            .with_status(403)
            .expect(hits.1)
            .create_async()
            .await;

        (page, second, third)
    }

    #[test]
    fn test_video_list_limit() {
        let mut list = VideoList::new(Some(2));
        let video = |id: &str| Video {
            video_id: id.to_string(),
            title: id.to_string(),
            url: Video::watch_url(id),
            order: 0,
            channel_id: String::new(),
            view_count: None,
            view_count_raw: String::new(),
            length: String::new(),
            thumbnail_url: String::new(),
        };

        list.extend(vec![video("a"), video("b"), video("c")]);
        assert!(list.is_full());
        assert!(!list.push(video("d")));
        let orders: Vec<usize> = list.videos.iter().map(|v| v.order).collect();
        assert_eq!(orders, vec![1, 2]);

        assert!(!VideoList::new(None).is_full());
    }

    #[tokio::test]
    async fn test_fetch_channel_videos_keeps_order() {
        let mut server = mockito::Server::new_async().await;
        let (page, second, third) = channel_fixture(&mut server, (1, 1)).await;

        let session = test_session(&server);
        let videos = fetch_channel_videos(&session, "@chan", None).await.unwrap();

        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3", "v4", "v5"]);
        let orders: Vec<usize> = videos.iter().map(|v| v.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=v1");
        assert_eq!(videos[0].view_count, Some(1234));

        page.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_channel_videos_stops_at_limit() {
        let mut server = mockito::Server::new_async().await;
        let (page, second, third) = channel_fixture(&mut server, (1, 0)).await;

        let session = test_session(&server);
        let videos = fetch_channel_videos(&session, "@chan", Some(4)).await.unwrap();

        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3", "v4"]);
        assert_eq!(videos.last().map(|v| v.order), Some(4));

        page.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_channel_videos_limit_within_initial_page() {
        let mut server = mockito::Server::new_async().await;
        let (_page, second, _third) = channel_fixture(&mut server, (0, 0)).await;

        let session = test_session(&server);
        let videos = fetch_channel_videos(&session, "@chan", Some(2)).await.unwrap();

        assert_eq!(videos.len(), 2);
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_channel_videos_zero_limit() {
        let session = Session::new(ScraperConfig::default().with_base_url("http://127.0.0.1:1")).unwrap();
        let videos = fetch_channel_videos(&session, "@chan", Some(0)).await.unwrap();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_channel_videos_missing_initial_data() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/@chan/videos")
            .with_status(200)
            .with_body(r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"k","INNERTUBE_CONTEXT":{}});</script>"#)
            .create_async()
            .await;

        let session = test_session(&server);
        let err = fetch_channel_videos(&session, "@chan", None).await.unwrap_err();
        assert_eq!(err.stage(), "extraction");
    }
}
