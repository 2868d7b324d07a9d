use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::YOUTUBE_ORIGIN;
use crate::youtube::errors::YouTubeError;

/// チャンネルの動画1件
///
/// `order` は1始まりで、最新の動画が1。取得完了時には `1..=N` が欠番・重複なく並ぶ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub order: usize,
    #[serde(default)]
    pub channel_id: String,
    /// 解釈できた場合のみの再生回数
    pub view_count: Option<u64>,
    /// ロケール付きの元の表記（常に保持）
    #[serde(default)]
    pub view_count_raw: String,
    /// 表示用の再生時間（"12:34" など）
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl Video {
    /// 動画IDから視聴ページのURLを生成
    pub fn watch_url(video_id: &str) -> String {
        format!("{}/watch?v={}", YOUTUBE_ORIGIN, video_id)
    }
}

/// コメント1件（重複排除はしない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// 返信の場合は `.` 区切りを含む
    pub cid: String,
    pub text: String,
    /// 相対表記の投稿時刻（"2 days ago" など）
    pub time: String,
    pub author: String,
    /// 投稿者のチャンネルID
    pub channel: String,
    /// 高評価数（空なら "0"）
    pub votes: String,
    /// APIが返した返信数の表記
    pub replies: String,
    /// アバター画像のURL
    pub photo: String,
    /// 動画の作成者がハートを付けたか
    pub heart: bool,
    pub reply: bool,
}

impl Comment {
    /// IDから返信かどうかを判定
    pub fn is_reply(cid: &str) -> bool {
        cid.contains('.')
    }
}

/// コメントの並び順（ソートメニューの位置に対応）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// 人気順
    Popular,
    /// 新しい順
    #[default]
    Recent,
}

impl SortOrder {
    /// ソートメニュー（subMenuItems）内の位置
    pub fn menu_index(&self) -> usize {
        match self {
            SortOrder::Popular => 0,
            SortOrder::Recent => 1,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Popular => f.write_str("popular"),
            SortOrder::Recent => f.write_str("recent"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = YouTubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SortOrder::Recent),
            "popular" => Ok(SortOrder::Popular),
            other => Err(YouTubeError::InvalidInput(format!(
                "unknown sort order '{}' (expected 'recent' or 'popular')",
                other
            ))),
        }
    }
}

/// コメント取得のオプション
#[derive(Debug, Clone, Default)]
pub struct CommentOptions {
    pub sort: SortOrder,
    /// 最初のリクエスト前に `context.client.hl` へ設定する言語
    pub language: Option<String>,
}
