//! 動画コメントのページネーション
//!
//! continuationの保留集合（frontier）をスタックとして扱い、新しく見つかった
//! トークンほど先に辿る（深さ優先）。返信スレッドの展開もこのスタックに積む。
//!
//! 取得は `CommentStream::next` で1件ずつ引き出す。途中でやめたい場合は
//! ストリームを破棄すればよい。一度終わったストリームは再開できない。

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::{self, Stream};
use serde_json::Value;
use tokio::time::sleep;

use super::errors::YouTubeError;
use super::ids::extract_video_id;
use super::innertube::parser::{discover_comment_continuations, find_server_error, parse_comments};
use super::innertube::{
    extract_initial_data, extract_ytcfg, search, search_first, ClientContext,
    ContinuationEndpoint, InnerTubeClient,
};
use super::session::Session;
use super::types::{Comment, CommentOptions, SortOrder};

const COMMENT_SECTION_ID: &str = "comment-item-section";

/// 1本の動画のコメントを順に取り出すストリーム
pub struct CommentStream<'a> {
    client: InnerTubeClient<'a>,
    ctx: ClientContext,
    video_id: String,
    /// 未取得のcontinuation（末尾が次に取得するもの）
    frontier: Vec<ContinuationEndpoint>,
    /// 取得済みで未返却のコメント
    pending: VecDeque<Comment>,
    page_delay: Duration,
    pages_fetched: usize,
    emitted: usize,
    disabled: bool,
    finished: bool,
}

impl<'a> CommentStream<'a> {
    /// 視聴ページを取得し、ソート順を選んだ状態のストリームを作成
    ///
    /// `video` は動画IDまたは動画URL。コメントが無効な動画では
    /// 何も返さないストリームになる（エラーではない）。
    ///
    /// # Errors
    /// - 動画IDが解釈できない場合は `InvalidInput`
    /// - ページ取得の失敗は `HttpError`
    /// - ytcfg / ytInitialData が取り出せない場合は `Extraction`
    /// - ソートメニューが見つからない・選べない場合は `Protocol`
    pub async fn open(
        session: &'a Session,
        video: &str,
        options: &CommentOptions,
    ) -> Result<CommentStream<'a>, YouTubeError> {
        let video_id = extract_video_id(video).ok_or_else(|| {
            YouTubeError::InvalidInput(format!("unrecognized video identifier '{}'", video))
        })?;

        let config = session.config();
        let page = session
            .fetch(&config.url(&format!("/watch?v={}", video_id)))
            .await?;

        let mut ctx = ClientContext::from_ytcfg(&extract_ytcfg(&page.html)?)?;
        if let Some(language) = options.language.as_deref() {
            ctx.set_language(language);
        }
        let data = extract_initial_data(&page.html)?;

        let mut stream = CommentStream {
            client: InnerTubeClient::new(session),
            ctx,
            video_id,
            frontier: Vec::new(),
            pending: VecDeque::new(),
            page_delay: config.page_delay,
            pages_fetched: 0,
            emitted: 0,
            disabled: false,
            finished: false,
        };

        if !comments_enabled(&data) {
            log::info!("Comments are disabled for video {}", stream.video_id);
            stream.disabled = true;
            stream.finished = true;
            return Ok(stream);
        }

        let seed = stream.sort_endpoint(&data, options.sort).await?;
        log::debug!(
            "Comment sort '{}' selected for video {}",
            options.sort,
            stream.video_id
        );
        stream.frontier.push(seed);

        Ok(stream)
    }

    /// ソートメニューから指定順の項目を選ぶ
    ///
    /// 初期ページに無い場合（コミュニティ投稿など）は、セクションリストの
    /// continuationを1回だけ取得してそこから探す。
    async fn sort_endpoint(
        &self,
        data: &Value,
        sort: SortOrder,
    ) -> Result<ContinuationEndpoint, YouTubeError> {
        if let Some(items) = sort_menu(data) {
            return select_sort(items, sort);
        }

        log::info!("Sort menu not found on initial page, fetching section list continuation");
        let recovered = match section_list_continuation(data) {
            Some(endpoint) => self.client.fetch_page(&endpoint, &self.ctx).await?,
            None => None,
        };

        let items = recovered
            .as_ref()
            .and_then(sort_menu)
            .ok_or_else(|| YouTubeError::Protocol("sort menu not found".to_string()))?;
        select_sort(items, sort)
    }

    /// 次のコメントを取得
    ///
    /// `None` はページネーションの終了（コメント無効・データ終端を含む）。
    /// エラーを返した後は常に `None` を返す。
    pub async fn next(&mut self) -> Option<Result<Comment, YouTubeError>> {
        loop {
            if let Some(comment) = self.pending.pop_front() {
                self.emitted += 1;
                return Some(Ok(comment));
            }

            if self.finished {
                return None;
            }

            let Some(endpoint) = self.frontier.pop() else {
                self.finish("no more continuations");
                return None;
            };

            if self.pages_fetched > 0 {
                sleep(self.page_delay).await;
            }

            let response = match self.client.fetch_page(&endpoint, &self.ctx).await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    self.finish("no more data");
                    return None;
                }
                Err(e) => {
                    self.abort();
                    return Some(Err(e));
                }
            };
            self.pages_fetched += 1;

            if let Some(message) = find_server_error(&response) {
                log::error!(
                    "Server reported an error for video {}: {}",
                    self.video_id,
                    message
                );
                self.abort();
                return Some(Err(YouTubeError::ServerReported(message)));
            }

            // 後から積んだものが先に取得される
            self.frontier
                .extend(discover_comment_continuations(&response));

            let comments = parse_comments(&response);
            log::debug!(
                "Comment page {} for video {}: {} comments, {} pending continuations",
                self.pages_fetched,
                self.video_id,
                comments.len(),
                self.frontier.len()
            );
            self.pending.extend(comments);
        }
    }

    /// `futures::Stream` に変換
    pub fn into_stream(self) -> impl Stream<Item = Result<Comment, YouTubeError>> + 'a {
        stream::unfold(self, |mut comments| async move {
            comments.next().await.map(|item| (item, comments))
        })
    }

    /// コメントが無効な動画だったか
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// これまでに返したコメント数
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn finish(&mut self, reason: &str) {
        self.finished = true;
        log::info!(
            "Finished comments for video {} ({}): {} comments from {} pages",
            self.video_id,
            reason,
            self.emitted,
            self.pages_fetched
        );
    }

    fn abort(&mut self) {
        self.finished = true;
        self.frontier.clear();
        self.pending.clear();
    }
}

impl std::fmt::Debug for CommentStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentStream")
            .field("video_id", &self.video_id)
            .field("frontier", &self.frontier.len())
            .field("pending", &self.pending.len())
            .field("emitted", &self.emitted)
            .field("disabled", &self.disabled)
            .field("finished", &self.finished)
            .finish()
    }
}

/// 動画のコメントストリームを開く（`CommentStream::open` と同じ）
pub async fn fetch_comments<'a>(
    session: &'a Session,
    video: &str,
    options: &CommentOptions,
) -> Result<CommentStream<'a>, YouTubeError> {
    CommentStream::open(session, video, options).await
}

/// コメント欄のcontinuationが初期ページにあるか
///
/// 関連動画フィード（secondaryResults）のセクションにもcontinuationがあるため、
/// コメント欄のセクションIDを優先し、無ければメインカラムだけを見る。
fn comments_enabled(data: &Value) -> bool {
    let has_continuation =
        |section: &Value| search_first(section, "continuationItemRenderer").is_some();

    if let Some(section) = search(data, "itemSectionRenderer").find(|section| {
        section.get("sectionIdentifier").and_then(Value::as_str) == Some(COMMENT_SECTION_ID)
    }) {
        return has_continuation(section);
    }

    let scope = data
        .pointer("/contents/twoColumnWatchNextResults/results/results")
        .unwrap_or(data);
    search(scope, "itemSectionRenderer").any(has_continuation)
}

/// ソートメニューの項目（無い・空なら `None`）
fn sort_menu(data: &Value) -> Option<&[Value]> {
    search_first(data, "sortFilterSubMenuRenderer")
        .and_then(|menu| menu.get("subMenuItems"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .filter(|items| !items.is_empty())
}

fn select_sort(items: &[Value], sort: SortOrder) -> Result<ContinuationEndpoint, YouTubeError> {
    let index = sort.menu_index();
    let item = items.get(index).ok_or_else(|| {
        YouTubeError::Protocol(format!(
            "sort menu has {} entries, '{}' needs index {}",
            items.len(),
            sort,
            index
        ))
    })?;

    item.get("serviceEndpoint")
        .and_then(ContinuationEndpoint::from_value)
        .ok_or_else(|| {
            YouTubeError::Protocol(format!("sort option '{}' has no service endpoint", sort))
        })
}

/// ソートメニューを得るための、セクションリストの最初のcontinuation
fn section_list_continuation(data: &Value) -> Option<ContinuationEndpoint> {
    let section_list = search_first(data, "sectionListRenderer")?;
    search(section_list, "continuationEndpoint").find_map(ContinuationEndpoint::from_value)
}
