pub mod browser;
pub mod crawl;
pub mod error;
pub mod normalize;
pub mod store;
pub mod sync;

pub use browser::{BrowserSession, SessionConfig};
pub use crawl::{CrawlOptions, ProgressCallback, VideoFeed, fetch_profile_name, start_crawl};
pub use error::{StoreError, SyncError};
pub use store::{FollowingStore, Subscription, VideoRecord, VideoStore};
pub use sync::{Accumulation, CreatorSyncReport, SyncEngine, accumulate_new};
