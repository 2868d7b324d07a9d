//! YouTubeのチャンネル動画一覧・コメントを内部API（InnerTube）経由で取得する
//!
//! ```no_run
//! use ytce::{fetch_channel_videos, new_session, CommentOptions, CommentStream};
//!
//! # async fn run() -> Result<(), ytce::YouTubeError> {
//! let session = new_session()?;
//! let videos = fetch_channel_videos(&session, "@somechannel", Some(10)).await?;
//!
//! if let Some(video) = videos.first() {
//!     let mut comments = CommentStream::open(&session, &video.video_id, &CommentOptions::default()).await?;
//!     while let Some(comment) = comments.next().await {
//!         let comment = comment?;
//!         println!("{}: {}", comment.author, comment.text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod util; // doctestのためpubにする
pub mod youtube;

pub use config::ScraperConfig;
pub use youtube::{
    fetch_channel_videos, fetch_comments, new_session, Comment, CommentOptions, CommentStream,
    EmbeddedBlob, ExtractionError, RetryPolicy, Session, SortOrder, Video, YouTubeError,
};
