//! InnerTube API 固有の型定義
//!
//! レスポンスの形は頻繁に変わるため、すべてのフィールドをOptionalで受け、
//! 欠落時はデフォルト値で補う。想定外の形は `Unrecognized` として読み飛ばす。

use serde::Deserialize;
use serde_json::Value;

use super::search::search;

/// コメント欄本体を指すcontinuationのtargetId
pub const COMMENT_SECTION_TARGETS: [&str; 3] = [
    "comments-section",
    "engagement-panel-comments-section",
    "shorts-engagement-panel-comments-section",
];

/// 返信スレッドを指すtargetIdの接頭辞
pub const COMMENT_REPLIES_TARGET_PREFIX: &str = "comment-replies-item";

/// 作成者がハートを付けたことを示すheartState
pub const HEARTED_STATE: &str = "TOOLBAR_HEART_STATE_HEARTED";

/// continuationトークンと投稿先APIパス
///
/// トークンの中身は解釈しない。1回のAJAXリクエストで1度だけ消費される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationEndpoint {
    /// `/youtubei/v1/...` 形式のAPIパス
    pub api_url: String,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEndpoint {
    command_metadata: Option<CommandMetadata>,
    continuation_command: Option<ContinuationCommand>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CommandMetadata {
    web_command_metadata: Option<WebCommandMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WebCommandMetadata {
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContinuationCommand {
    token: Option<String>,
}

impl ContinuationEndpoint {
    /// `continuationEndpoint` / `serviceEndpoint` / `command` の値から生成
    ///
    /// APIパスかトークンのどちらかが欠けていれば `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let raw = RawEndpoint::deserialize(value).ok()?;
        let api_url = raw.command_metadata?.web_command_metadata?.api_url?;
        let token = raw.continuation_command?.token?;
        if api_url.is_empty() || token.is_empty() {
            return None;
        }
        Some(Self { api_url, token })
    }
}

/// テキスト（simpleText または runs 配列）
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub simple_text: Option<String>,
    pub runs: Option<Vec<TextRun>>,
}

impl TextContent {
    /// 最初のrunのテキスト
    pub fn first_run_text(&self) -> Option<&str> {
        self.runs
            .as_ref()?
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    pub fn simple_text(&self) -> Option<&str> {
        self.simple_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// runs配列の要素
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRun {
    pub text: Option<String>,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationEndpoint {
    pub browse_endpoint: Option<BrowseEndpoint>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowseEndpoint {
    pub browse_id: Option<String>,
}

/// サムネイルコンテナ
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ThumbnailContainer {
    pub thumbnails: Vec<Thumbnail>,
}

/// サムネイル
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// 動画カード（videoRenderer / gridVideoRenderer 共通）
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRenderer {
    pub video_id: Option<String>,
    pub title: Option<TextContent>,
    pub owner_text: Option<TextContent>,
    pub view_count_text: Option<TextContent>,
    pub length_text: Option<TextContent>,
    pub thumbnail: Option<ThumbnailContainer>,
}

/// 動画グリッド・continuationItemsの1要素
#[derive(Debug)]
pub enum GridItem {
    /// `richItemRenderer.content.videoRenderer` または `gridVideoRenderer`
    Video(Box<VideoRenderer>),
    /// 次ページへの `continuationItemRenderer`（ページネーション側で扱う）
    ContinuationPlaceholder,
    /// 棚（shelf）など動画以外の要素、または形が想定外の要素
    Unrecognized,
}

impl GridItem {
    pub fn classify(item: &Value) -> Self {
        if item.get("continuationItemRenderer").is_some() {
            return GridItem::ContinuationPlaceholder;
        }

        let renderer = item
            .get("richItemRenderer")
            .and_then(|r| r.get("content"))
            .and_then(|c| c.get("videoRenderer"))
            .or_else(|| item.get("gridVideoRenderer"));

        let Some(renderer) = renderer else {
            return GridItem::Unrecognized;
        };

        match VideoRenderer::deserialize(renderer) {
            Ok(video) => GridItem::Video(Box::new(video)),
            Err(e) => {
                log::debug!("Skipping video renderer with unexpected shape: {}", e);
                GridItem::Unrecognized
            }
        }
    }
}

/// continuationItemsをまとめたアクションの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// `reloadContinuationItemsCommand`
    Reload,
    /// `appendContinuationItemsAction`
    Append,
}

/// `{targetId, continuationItems}` を持つアクション
#[derive(Debug, Clone, Copy)]
pub struct ContinuationItemsAction<'a> {
    pub kind: ActionKind,
    pub target_id: &'a str,
    /// 表示順のまま（この配列の走査順は保持される）
    pub items: &'a [Value],
}

impl<'a> ContinuationItemsAction<'a> {
    fn from_value(kind: ActionKind, value: &'a Value) -> Self {
        Self {
            kind,
            target_id: value.get("targetId").and_then(Value::as_str).unwrap_or(""),
            items: value
                .get("continuationItems")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// コメント欄本体に対するアクションか
    pub fn targets_comment_section(&self) -> bool {
        COMMENT_SECTION_TARGETS.contains(&self.target_id)
    }

    /// 返信スレッドに対するアクションか
    pub fn targets_replies(&self) -> bool {
        self.target_id.starts_with(COMMENT_REPLIES_TARGET_PREFIX)
    }
}

/// レスポンス内のreload/appendアクションをすべて列挙（アクション間の順序は不定）
pub fn continuation_item_actions(response: &Value) -> Vec<ContinuationItemsAction<'_>> {
    let reloads = search(response, "reloadContinuationItemsCommand")
        .map(|v| ContinuationItemsAction::from_value(ActionKind::Reload, v));
    let appends = search(response, "appendContinuationItemsAction")
        .map(|v| ContinuationItemsAction::from_value(ActionKind::Append, v));
    reloads.chain(appends).collect()
}

/// 動画一覧のcontinuationレスポンスのアクション列
///
/// `onResponseReceivedActions` と `onResponseReceivedEndpoints` のどちらでも届くため、
/// 配列順を保ったまま `appendContinuationItemsAction` を取り出す。
pub fn appended_items(response: &Value) -> Option<Vec<&Value>> {
    let envelope = response
        .get("onResponseReceivedEndpoints")
        .or_else(|| response.get("onResponseReceivedActions"))?
        .as_array()?;

    Some(
        envelope
            .iter()
            .filter_map(|action| action.get("appendContinuationItemsAction"))
            .filter_map(|action| action.get("continuationItems"))
            .filter_map(Value::as_array)
            .flatten()
            .collect(),
    )
}

/// コメント本体（`commentEntityPayload`）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentEntityPayload {
    pub properties: Option<CommentProperties>,
    pub author: Option<CommentAuthor>,
    pub toolbar: Option<CommentToolbar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentProperties {
    pub comment_id: Option<String>,
    pub content: Option<CommentContent>,
    pub published_time: Option<String>,
    pub toolbar_state_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentContent {
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentAuthor {
    pub display_name: Option<String>,
    pub channel_id: Option<String>,
    pub avatar_thumbnail_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentToolbar {
    pub like_count_notliked: Option<String>,
    /// 文字列のことも数値のこともある
    pub reply_count: Option<Value>,
}

/// ハート・高評価の状態（`engagementToolbarStateEntityPayload`）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementToolbarState {
    pub key: Option<String>,
    pub heart_state: Option<String>,
}

impl EngagementToolbarState {
    pub fn is_hearted(&self) -> bool {
        self.heart_state.as_deref() == Some(HEARTED_STATE)
    }
}
