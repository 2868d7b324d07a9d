use once_cell::sync::Lazy;
use regex::Regex;

/// 再生回数テキストの数値部分（任意のK/M/B接尾辞付き）
static VIEW_COUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d.]*)\s*([KMB]?)").expect("Failed to compile view count regex")
});

/// APIキーをマスキングしてログ出力用の文字列を生成
///
/// APIキーの最初の4文字と最後の4文字のみを表示し、中間を***でマスキング
///
/// # Examples
/// ```
/// use ytce::util::mask_api_key;
///
/// let masked = mask_api_key("AIzaSyABC123def456GHI789");
/// assert_eq!(masked, "AIza***I789");
/// ```
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        // 短いキー・空文字列は全体をマスク
        return "***".to_string();
    }

    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", prefix, suffix)
}

/// ロケール付きの再生回数表記を整数に変換
///
/// 空白・狭いノーブレークスペース・ノーブレークスペース・桁区切りのカンマを除去した上で、
/// 先頭の数値とK/M/B接尾辞（大文字小文字を区別しない）を読み取る。
/// 解釈できない場合は `None`（エラーにはしない）。
///
/// # Examples
/// ```
/// use ytce::util::parse_view_count;
///
/// assert_eq!(parse_view_count("1.2M views"), Some(1_200_000));
/// assert_eq!(parse_view_count("123\u{202f}874 vues"), Some(123_874));
/// assert_eq!(parse_view_count(""), None);
/// ```
pub fn parse_view_count(view_count_raw: &str) -> Option<u64> {
    if view_count_raw.is_empty() {
        return None;
    }

    let stripped: String = view_count_raw
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '\u{202f}' | '\u{a0}'))
        .collect();

    let caps = VIEW_COUNT_REGEX.captures(&stripped)?;
    let number: f64 = caps.get(1)?.as_str().parse().ok()?;

    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(suffix) if suffix == "K" => 1_000.0,
        Some(suffix) if suffix == "M" => 1_000_000.0,
        Some(suffix) if suffix == "B" => 1_000_000_000.0,
        _ => 1.0,
    };

    // 浮動小数点の誤差（1.15K -> 1149.999...）を丸めで吸収
    Some((number * multiplier).round() as u64)
}
