//! InnerTube プロトコルモジュール
//!
//! YouTubeのWebクライアント自身が使う内部API（InnerTube）を再現する。
//! ブートストラップHTMLに埋め込まれたytcfg / ytInitialDataを起点に、
//! continuationトークンをPOSTしてページを辿る。
//!
//! ## 注意事項
//! - 非公式APIのため、レスポンスの形は予告なく変わる
//! - `search` は順序を保証しない。表示順が必要な箇所では配列を直接走査すること

pub mod client;
pub mod context;
pub mod embedded;
pub mod parser;
pub mod search;
pub mod types;

pub use client::{AjaxOutcome, AttemptResult, InnerTubeClient};
pub use context::ClientContext;
pub use embedded::{extract_initial_data, extract_ytcfg};
pub use search::{search, search_first};
pub use types::ContinuationEndpoint;
