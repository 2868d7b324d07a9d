// =============================================================================
// YouTubeスクレイピングモジュール
// =============================================================================
// 公式APIを使わず、Webクライアントと同じInnerTubeの通信を再現して
// チャンネルの動画一覧と動画のコメントを取得する
//
// 機能:
// - 同意画面の自動受理付きのページ取得（セッション）
// - 表示順を保った動画一覧のページネーション
// - ソート順指定・返信展開付きのコメントストリーム
// =============================================================================

pub mod comments;
pub mod errors;
pub mod ids;
pub mod innertube;
pub mod retry;
pub mod session;
pub mod types;
pub mod videos;

pub use comments::{fetch_comments, CommentStream};
pub use errors::{EmbeddedBlob, ExtractionError, YouTubeError};
pub use ids::{channel_path, extract_video_id};
pub use retry::RetryPolicy;
pub use session::{new_session, FetchedPage, Session};
pub use types::{Comment, CommentOptions, SortOrder, Video};
pub use videos::fetch_channel_videos;
