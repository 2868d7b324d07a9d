//! HTMLに埋め込まれたJSON（ytcfg / ytInitialData）の抽出

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::youtube::errors::{EmbeddedBlob, ExtractionError};

// 正規表現のシングルトン（初回のみコンパイル）
static YTCFG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)ytcfg\.set\s*\(\s*(\{.+?\})\s*\)\s*;").expect("Failed to compile ytcfg regex")
});

static YTCFG_START_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ytcfg\.set\s*\(\s*\{").expect("Failed to compile ytcfg start regex")
});

static INITIAL_DATA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)(?:window\s*\[\s*["']ytInitialData["']\s*\]|ytInitialData)\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)"#,
    )
    .expect("Failed to compile ytInitialData regex")
});

static INITIAL_DATA_START_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:window\s*\[\s*["']ytInitialData["']\s*\]|ytInitialData)\s*=\s*\{"#)
        .expect("Failed to compile ytInitialData start regex")
});

/// `ytcfg.set({...})` のクライアント設定を抽出
pub fn extract_ytcfg(html: &str) -> Result<Value, ExtractionError> {
    extract_blob(html, EmbeddedBlob::Ytcfg, &YTCFG_REGEX, &YTCFG_START_REGEX)
}

/// `ytInitialData = {...};` の初期状態を抽出
pub fn extract_initial_data(html: &str) -> Result<Value, ExtractionError> {
    extract_blob(
        html,
        EmbeddedBlob::InitialData,
        &INITIAL_DATA_REGEX,
        &INITIAL_DATA_START_REGEX,
    )
}

/// 正規表現で取り出し、解析できなければ括弧の深さを数える走査にフォールバック
///
/// 非貪欲なキャプチャは文字列中の `})` で途中終了し得るため、
/// 正規表現の結果がJSONとして解析できない場合も走査をやり直す。
fn extract_blob(
    html: &str,
    blob: EmbeddedBlob,
    pattern: &Regex,
    start_pattern: &Regex,
) -> Result<Value, ExtractionError> {
    if let Some(captured) = pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        match serde_json::from_str(captured) {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::debug!("Regex capture of {} is not valid JSON ({}), scanning braces", blob, e);
            }
        }
    }

    let start = start_pattern
        .find(html)
        .map(|m| m.end() - 1)
        .ok_or(ExtractionError::NotFound { blob })?;

    let object = extract_balanced_object(html, start).ok_or(ExtractionError::NotFound { blob })?;

    serde_json::from_str(object).map_err(|source| ExtractionError::InvalidJson { blob, source })
}

/// `start` の `{` から対応する `}` までの部分文字列を返す
///
/// ダブルクォート内かどうか、バックスラッシュによるエスケープ（直後の1文字のみ）、
/// 文字列外の `{` / `}` による深さを追跡する。深さが0に戻った時点で返し、
/// 閉じられないまま末尾に達した場合は `None`。
///
/// 判定対象の文字はすべてASCIIのため、UTF-8のバイト列をそのまま走査してよい。
pub(crate) fn extract_balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }

        match byte {
            b'\\' => escaped = true,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
