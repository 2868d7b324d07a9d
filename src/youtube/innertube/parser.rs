//! InnerTube レスポンスパーサー
//!
//! 動画の表示順が意味を持つ箇所（タブのグリッド・continuationItems）は
//! 必ず配列順に走査する。キー検索（`search`）は順不同でよい箇所にだけ使う。

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::search::{search, search_first};
use super::types::*;
use crate::util::parse_view_count;
use crate::youtube::types::{Comment, Video};

/// 初期ページから取り出した動画一覧
#[derive(Debug)]
pub struct InitialVideos {
    pub videos: Vec<Video>,
    /// タブ→グリッドの構造を辿れたか（falseなら順序は信頼できない）
    pub ordered: bool,
}

/// videoRendererを動画レコードに変換（`order` は呼び出し側で採番）
///
/// 動画IDが無い要素は `None`（エラーにはしない）
pub fn extract_video(renderer: &VideoRenderer) -> Option<Video> {
    let video_id = renderer
        .video_id
        .as_deref()
        .filter(|id| !id.is_empty())?
        .to_string();

    let title = renderer
        .title
        .as_ref()
        .and_then(|t| t.first_run_text().or_else(|| t.simple_text()))
        .unwrap_or_default()
        .to_string();

    let channel_id = renderer
        .owner_text
        .as_ref()
        .and_then(|o| o.runs.as_ref())
        .and_then(|runs| runs.first())
        .and_then(|run| run.navigation_endpoint.as_ref())
        .and_then(|nav| nav.browse_endpoint.as_ref())
        .and_then(|browse| browse.browse_id.clone())
        .unwrap_or_default();

    // 再生回数はsimpleTextを優先（タイトルとは逆）
    let view_count_raw = renderer
        .view_count_text
        .as_ref()
        .and_then(|v| v.simple_text().or_else(|| v.first_run_text()))
        .unwrap_or_default()
        .to_string();
    let view_count = parse_view_count(&view_count_raw);

    let length = renderer
        .length_text
        .as_ref()
        .and_then(|l| l.simple_text())
        .unwrap_or_default()
        .to_string();

    // 最後のサムネイルが最大解像度
    let thumbnail_url = renderer
        .thumbnail
        .as_ref()
        .and_then(|t| t.thumbnails.last())
        .and_then(|t| t.url.clone())
        .unwrap_or_default();

    Some(Video {
        url: Video::watch_url(&video_id),
        video_id,
        title,
        order: 0,
        channel_id,
        view_count,
        view_count_raw,
        length,
        thumbnail_url,
    })
}

/// 配列順のままグリッド要素から動画を取り出す（continuationは無視）
fn videos_in_order<'a>(items: impl IntoIterator<Item = &'a Value>) -> Vec<Video> {
    items
        .into_iter()
        .filter_map(|item| match GridItem::classify(item) {
            GridItem::Video(renderer) => extract_video(&renderer),
            GridItem::ContinuationPlaceholder | GridItem::Unrecognized => None,
        })
        .collect()
}

/// タブ→richGridRenderer→contents を辿り、表示順の要素配列を返す
///
/// 選択中のタブ、無ければグリッドを含む最初のタブ、それも無ければ先頭のタブを使う。
/// 構造が存在しない場合は `None`。
fn grid_contents(data: &Value) -> Option<&Vec<Value>> {
    let tabs = data
        .pointer("/contents/twoColumnBrowseResultsRenderer/tabs")?
        .as_array()?;

    let renderers: Vec<&Value> = tabs.iter().filter_map(|t| t.get("tabRenderer")).collect();

    let has_grid = |tab: &Value| {
        tab.get("content")
            .and_then(|c| c.get("richGridRenderer"))
            .is_some()
    };

    let tab = renderers
        .iter()
        .copied()
        .find(|tab| tab.get("selected").and_then(Value::as_bool) == Some(true))
        .or_else(|| renderers.iter().copied().find(|tab| has_grid(tab)))
        .or_else(|| renderers.first().copied())?;

    tab.pointer("/content/richGridRenderer/contents")?.as_array()
}

/// 初期ページ（ytInitialData）から表示順（新しい順）に動画を取り出す
///
/// グリッド構造が無い場合のみ、順不同のキー検索にフォールバックする。
pub fn parse_initial_videos(data: &Value) -> InitialVideos {
    if let Some(contents) = grid_contents(data) {
        return InitialVideos {
            videos: videos_in_order(contents),
            ordered: true,
        };
    }

    log::warn!("Tab/grid structure not found; falling back to unordered renderer search. Video order may be wrong.");

    let rich_items = search(data, "richItemRenderer")
        .filter_map(|item| item.pointer("/content/videoRenderer"));
    let grid_videos = search(data, "gridVideoRenderer");

    let videos = rich_items
        .chain(grid_videos)
        .filter_map(|renderer| VideoRenderer::deserialize(renderer).ok())
        .filter_map(|renderer| extract_video(&renderer))
        .collect();

    InitialVideos {
        videos,
        ordered: false,
    }
}

/// continuationレスポンス（append形式）の動画を配列順に取り出す
pub fn parse_continuation_videos(response: &Value) -> Vec<Video> {
    match appended_items(response) {
        Some(items) => videos_in_order(items),
        None => {
            log::debug!("Continuation response has no appendContinuationItemsAction");
            Vec::new()
        }
    }
}

/// 初期ページの最初のcontinuation（動画グリッドのものは最も長いトークン）
pub fn initial_continuation(data: &Value) -> Option<ContinuationEndpoint> {
    search(data, "continuationEndpoint")
        .filter_map(ContinuationEndpoint::from_value)
        .max_by_key(|ep| ep.token.len())
}

/// continuationレスポンスから次ページのcontinuationを探す
///
/// append形式のレスポンスはトークンを1つしか持たないため、順不同の検索でよい。
pub fn next_continuation(response: &Value) -> Option<ContinuationEndpoint> {
    search_first(response, "continuationItemRenderer")
        .and_then(|renderer| renderer.get("continuationEndpoint"))
        .and_then(ContinuationEndpoint::from_value)
}

/// サーバーがレスポンスに含めたエラーメッセージ（空文字・nullは無視）
pub fn find_server_error(response: &Value) -> Option<String> {
    search(response, "externalErrorMessage").find_map(|v| match v {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    })
}

/// コメント欄・返信スレッドの新しいcontinuationを発見順に列挙
///
/// - コメント欄本体のアクション: 各要素内のすべての `continuationEndpoint`
/// - 返信スレッドのアクション: 「返信をさらに表示」ボタンの `command`
pub fn discover_comment_continuations(response: &Value) -> Vec<ContinuationEndpoint> {
    let mut found = Vec::new();

    for action in continuation_item_actions(response) {
        for item in action.items {
            if action.targets_comment_section() {
                found.extend(
                    search(item, "continuationEndpoint").filter_map(ContinuationEndpoint::from_value),
                );
            }
            if action.targets_replies() && item.get("continuationItemRenderer").is_some() {
                if let Some(endpoint) = search_first(item, "buttonRenderer")
                    .and_then(|button| button.get("command"))
                    .and_then(ContinuationEndpoint::from_value)
                {
                    found.push(endpoint);
                }
            }
        }
    }

    found
}

/// レスポンス内のコメントをすべて取り出す
///
/// キー検索で見つかった順の逆順で返す。ハート・高評価数などは
/// `toolbarStateKey` で対応付けたツールバー状態から読む。
pub fn parse_comments(response: &Value) -> Vec<Comment> {
    let toolbar_states: HashMap<String, EngagementToolbarState> =
        search(response, "engagementToolbarStateEntityPayload")
            .filter_map(|v| EngagementToolbarState::deserialize(v).ok())
            .filter_map(|state| Some((state.key.clone()?, state)))
            .collect();

    let payloads: Vec<&Value> = search(response, "commentEntityPayload").collect();

    payloads
        .into_iter()
        .rev()
        .filter_map(|payload| match CommentEntityPayload::deserialize(payload) {
            Ok(payload) => extract_comment(payload, &toolbar_states),
            Err(e) => {
                log::debug!("Skipping comment payload with unexpected shape: {}", e);
                None
            }
        })
        .collect()
}

/// commentEntityPayloadをコメントレコードに変換（IDが無ければ `None`）
fn extract_comment(
    payload: CommentEntityPayload,
    toolbar_states: &HashMap<String, EngagementToolbarState>,
) -> Option<Comment> {
    let properties = payload.properties.unwrap_or_default();
    let Some(cid) = properties.comment_id.filter(|id| !id.is_empty()) else {
        log::debug!("Skipping comment payload without commentId");
        return None;
    };

    let author = payload.author.unwrap_or_default();
    let toolbar = payload.toolbar.unwrap_or_default();

    let heart = match properties
        .toolbar_state_key
        .as_deref()
        .and_then(|key| toolbar_states.get(key))
    {
        Some(state) => state.is_hearted(),
        None => {
            log::debug!("No toolbar state for comment {}", cid);
            false
        }
    };

    let votes = toolbar
        .like_count_notliked
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("0")
        .to_string();

    let replies = match toolbar.reply_count {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    Some(Comment {
        reply: Comment::is_reply(&cid),
        text: properties
            .content
            .and_then(|c| c.content)
            .unwrap_or_default(),
        time: properties.published_time.unwrap_or_default(),
        author: author.display_name.unwrap_or_default(),
        channel: author.channel_id.unwrap_or_default(),
        votes,
        replies,
        photo: author.avatar_thumbnail_url.unwrap_or_default(),
        heart,
        cid,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    fn ids(videos: &[Video]) -> Vec<&str> {
        videos.iter().map(|v| v.video_id.as_str()).collect()
    }

    #[test]
    fn test_extract_video_fields() {
        let renderer = VideoRenderer::deserialize(&json!({
            "videoId": "abc",
            "title": {"runs": [{"text": "First"}, {"text": " part"}]},
            "ownerText": {"runs": [{"text": "Owner", "navigationEndpoint": {"browseEndpoint": {"browseId": "UC123"}}}]},
            "viewCountText": {"runs": [{"text": "1.2M views"}]},
            "lengthText": {"simpleText": "3:21"},
            "thumbnail": {"thumbnails": [{"url": "small"}, {"url": "large"}]}
        }))
        .unwrap();

        let video = extract_video(&renderer).unwrap();
        assert_eq!(video.video_id, "abc");
        assert_eq!(video.title, "First");
        assert_eq!(video.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(video.channel_id, "UC123");
        assert_eq!(video.view_count_raw, "1.2M views");
        assert_eq!(video.view_count, Some(1_200_000));
        assert_eq!(video.length, "3:21");
        assert_eq!(video.thumbnail_url, "large");
    }

    #[test]
    fn test_extract_video_fallbacks() {
        let renderer = VideoRenderer::deserialize(&json!({
            "videoId": "abc",
            "title": {"simpleText": "Simple"},
            "viewCountText": {"simpleText": "No views"}
        }))
        .unwrap();
        let video = extract_video(&renderer).unwrap();
        assert_eq!(video.title, "Simple");
        assert_eq!(video.channel_id, "");
        assert_eq!(video.view_count, None);
        assert_eq!(video.view_count_raw, "No views");
        assert_eq!(video.thumbnail_url, "");

        // 動画IDが無ければ未定義
        assert!(extract_video(&VideoRenderer::default()).is_none());
    }

    #[test]
    fn test_initial_videos_keep_grid_order() {
        let data = initial_page(vec![
            video_item("v1", "one"),
            json!({"richSectionRenderer": {"content": {}}}),
            video_item("v2", "two"),
            video_item("v3", "three"),
            continuation_item("next"),
        ]);
        let parsed = parse_initial_videos(&data);
        assert!(parsed.ordered);
        assert_eq!(ids(&parsed.videos), vec!["v1", "v2", "v3"]);
    }

    #[test]
    fn test_initial_videos_tab_selection_without_selected_flag() {
        let data = json!({
            "contents": {"twoColumnBrowseResultsRenderer": {"tabs": [
                {"tabRenderer": {"content": {"sectionListRenderer": {}}}},
                {"tabRenderer": {"content": {"richGridRenderer": {"contents": [
                    video_item("a", "A"), video_item("b", "B")
                ]}}}}
            ]}}
        });
        let parsed = parse_initial_videos(&data);
        assert!(parsed.ordered);
        assert_eq!(ids(&parsed.videos), vec!["a", "b"]);
    }

    #[test]
    fn test_initial_videos_unordered_fallback() {
        let data = json!({
            "contents": {"singleColumnBrowseResultsRenderer": {"items": [
                video_item("x", "X"),
                {"gridVideoRenderer": {"videoId": "y", "title": {"simpleText": "Y"}}}
            ]}}
        });
        let parsed = parse_initial_videos(&data);
        assert!(!parsed.ordered);
        let mut found = ids(&parsed.videos);
        found.sort();
        assert_eq!(found, vec!["x", "y"]);
    }

    #[test]
    fn test_continuation_videos_in_order() {
        let response = append_response(vec![
            video_item("c1", "c1"),
            video_item("c2", "c2"),
            continuation_item("after"),
        ]);
        assert_eq!(ids(&parse_continuation_videos(&response)), vec!["c1", "c2"]);
        assert_eq!(next_continuation(&response).unwrap().token, "after");

        let last = append_response(vec![video_item("c3", "c3")]);
        assert!(next_continuation(&last).is_none());
    }

    #[test]
    fn test_initial_continuation_picks_longest() {
        let data = json!({
            "a": {"continuationEndpoint": endpoint("/youtubei/v1/browse", "short")},
            "b": [{"continuationEndpoint": endpoint("/youtubei/v1/browse", "a-much-longer-video-token")}],
            "c": {"continuationEndpoint": {"noCommand": true}}
        });
        assert_eq!(
            initial_continuation(&data).unwrap().token,
            "a-much-longer-video-token"
        );
        assert!(initial_continuation(&json!({})).is_none());
    }

    #[test]
    fn test_find_server_error() {
        let response = json!({"alerts": [{"alertRenderer": {"externalErrorMessage": "Quota"}}]});
        assert_eq!(find_server_error(&response).as_deref(), Some("Quota"));
        assert!(find_server_error(&json!({"ok": 1})).is_none());
    }

    #[test]
    fn test_find_server_error_ignores_empty_message() {
        let response = json!({"alerts": [
            {"alertRenderer": {"externalErrorMessage": ""}},
            {"alertRenderer": {"externalErrorMessage": null}}
        ]});
        assert!(find_server_error(&response).is_none());

        let response = json!({"alerts": [
            {"alertRenderer": {"externalErrorMessage": ""}},
            {"alertRenderer": {"externalErrorMessage": "Quota"}}
        ]});
        assert_eq!(find_server_error(&response).as_deref(), Some("Quota"));
    }

    #[test]
    fn test_parse_comments() {
        let response = comments_response(&[], &[("c1", "first"), ("c2.r1", "reply")], &["c2.r1"]);
        let comments = parse_comments(&response);
        assert_eq!(comments.len(), 2);

        let reply = comments.iter().find(|c| c.cid == "c2.r1").unwrap();
        assert!(reply.reply);
        assert!(reply.heart);
        assert_eq!(reply.text, "reply");
        assert_eq!(reply.votes, "12");
        assert_eq!(reply.replies, "3");
        assert_eq!(reply.author, "@c2.r1");
        assert_eq!(reply.channel, "UCauthor");
        assert_eq!(reply.time, "2 days ago");

        let top = comments.iter().find(|c| c.cid == "c1").unwrap();
        assert!(!top.reply);
        assert!(!top.heart);
    }

    #[test]
    fn test_parse_comments_reverses_search_order() {
        let response = comments_response(&[], &[("c1", "a"), ("c2", "b"), ("c3", "c")], &[]);
        let searched: Vec<String> = search(&response, "commentEntityPayload")
            .filter_map(|p| p.pointer("/properties/commentId").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        let parsed: Vec<String> = parse_comments(&response).into_iter().map(|c| c.cid).collect();

        let mut reversed = searched.clone();
        reversed.reverse();
        assert_eq!(parsed, reversed);
    }

    #[test]
    fn test_parse_comments_defaults_and_duplicates() {
        let response = json!({"mutations": [
            {"commentEntityPayload": {"properties": {"commentId": "dup"}, "toolbar": {"likeCountNotliked": "  ", "replyCount": 7}}},
            {"commentEntityPayload": {"properties": {"commentId": "dup"}}},
            {"commentEntityPayload": {"properties": {}}}
        ]});
        let comments = parse_comments(&response);
        // 重複はそのまま、IDの無いものだけ除外
        assert_eq!(comments.len(), 2);
        assert!(comments.iter().all(|c| c.cid == "dup"));
        assert!(comments.iter().all(|c| c.votes == "0"));
        assert!(comments.iter().any(|c| c.replies == "7"));
    }

    #[test]
    fn test_discover_comment_continuations() {
        let response = json!({
            "onResponseReceivedEndpoints": [
                {"appendContinuationItemsAction": {
                    "targetId": "comments-section",
                    "continuationItems": [
                        {"commentThreadRenderer": {"replies": {"commentRepliesRenderer": {"contents": [
                            {"continuationItemRenderer": {"continuationEndpoint": endpoint("/youtubei/v1/next", "replies-1")}}
                        ]}}}},
                        {"continuationItemRenderer": {"continuationEndpoint": endpoint("/youtubei/v1/next", "page-2")}}
                    ]
                }},
                {"appendContinuationItemsAction": {
                    "targetId": "comment-replies-item-Ugx",
                    "continuationItems": [
                        {"commentViewModel": {}},
                        {"continuationItemRenderer": {"button": {"buttonRenderer": {"command": endpoint("/youtubei/v1/next", "more-replies")}}}}
                    ]
                }},
                {"appendContinuationItemsAction": {
                    "targetId": "unrelated",
                    "continuationItems": [
                        {"continuationItemRenderer": {"continuationEndpoint": endpoint("/youtubei/v1/next", "ignored")}}
                    ]
                }}
            ]
        });

        let mut tokens: Vec<String> = discover_comment_continuations(&response)
            .into_iter()
            .map(|ep| ep.token)
            .collect();
        tokens.sort();
        assert_eq!(tokens, vec!["more-replies", "page-2", "replies-1"]);
    }
}
