//! 動画ID・チャンネル指定の正規化

use once_cell::sync::Lazy;
use regex::Regex;

use crate::youtube::errors::YouTubeError;

// 正規表現のシングルトン（初回のみコンパイル）
static BARE_VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Failed to compile video ID regex")
});

static VIDEO_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})")
        .expect("Failed to compile video URL regex")
});

static CHANNEL_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"youtube\.com/((?:@[^/?#\s]+)|(?:channel|c|user)/[^/?#\s]+)")
        .expect("Failed to compile channel URL regex")
});

static CHANNEL_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:channel|c|user)/[^/?#\s]+$").expect("Failed to compile channel path regex")
});

// 旧形式のカスタムURL名（例: youtube.com/realmadrid）
static LEGACY_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Failed to compile legacy channel name regex")
});

static CHANNEL_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("Failed to compile channel ID regex")
});

/// 動画IDまたは動画URLから11文字の動画IDを取り出す
///
/// 対応形式: 素のID、`watch?v=`、`youtu.be/`、`embed/`
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if BARE_VIDEO_ID_REGEX.is_match(input) {
        return Some(input.to_string());
    }

    VIDEO_URL_REGEX
        .captures(input)
        .map(|caps| caps[1].to_string())
}

/// チャンネル指定から `/{path}/videos` の `path` 部分を生成
///
/// 対応形式: `@handle`、`UC...` のチャンネルID、`channel/` `c/` `user/` のパス、
/// 旧形式のカスタム名、チャンネルURL
///
/// # Errors
/// どの形式にも当てはまらない場合は `InvalidInput`
pub fn channel_path(input: &str) -> Result<String, YouTubeError> {
    let input = input.trim();

    if let Some(caps) = CHANNEL_URL_REGEX.captures(input) {
        return Ok(caps[1].to_string());
    }

    let trimmed = input.trim_matches('/');
    if trimmed.starts_with('@') && trimmed.len() > 1 && !trimmed.contains('/') {
        return Ok(trimmed.to_string());
    }
    if CHANNEL_ID_REGEX.is_match(trimmed) {
        return Ok(format!("channel/{}", trimmed));
    }
    if CHANNEL_PATH_REGEX.is_match(trimmed) || LEGACY_NAME_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(YouTubeError::InvalidInput(format!(
        "unrecognized channel identifier '{}'",
        input
    )))
}
