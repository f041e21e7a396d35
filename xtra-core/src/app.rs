//! Composition root: wires configuration, database, clients and services.

use std::sync::Arc;

use tracing::info;
use xtra_sources::Session;
use xtra_sources::gql::GqlApi;
use xtra_sources::helix::HelixApi;

use crate::config::AppConfig;
use crate::database::repositories::{SqlxBookmarkRepository, SqlxOfflineVideoRepository};
use crate::database::{self, DbPool};
use crate::downloads::{DownloadManager, InMemoryFetchQueue};
use crate::emotes::EmoteLoader;
use crate::paging::{Feature, FeatureSource, Providers};
use crate::store::{BookmarkStore, OfflineVideoStore};
use crate::utils::{fs, http_client};
use crate::Result;

pub struct App {
    pub config: AppConfig,
    pub pool: DbPool,
    pub session: Session,
    pub providers: Providers,
    pub offline_videos: Arc<OfflineVideoStore>,
    pub bookmarks: Arc<BookmarkStore>,
    pub fetch_queue: Arc<InMemoryFetchQueue>,
    pub downloads: DownloadManager,
    pub emotes: EmoteLoader,
}

impl App {
    pub async fn init(config: AppConfig) -> Result<Self> {
        let pool = database::init_pool(&config.database_url).await?;
        database::run_migrations(&pool).await?;
        Self::with_pool(config, pool).await
    }

    /// Build on an already migrated pool.
    pub async fn with_pool(config: AppConfig, pool: DbPool) -> Result<Self> {
        fs::ensure_dir_all_with_op("creating download directory", &config.download_dir).await?;

        let client = http_client::build_http_client(&config.proxy, config.http_timeout())?;
        let session = config.session();
        let providers = Providers::new(
            HelixApi::new(client.clone(), &session),
            GqlApi::new(client.clone(), &session),
        );

        let offline_videos = Arc::new(
            OfflineVideoStore::open(Arc::new(SqlxOfflineVideoRepository::new(pool.clone())))
                .await?,
        );
        let bookmarks = Arc::new(
            BookmarkStore::open(Arc::new(SqlxBookmarkRepository::new(pool.clone()))).await?,
        );
        let fetch_queue = Arc::new(InMemoryFetchQueue::new());
        let downloads = DownloadManager::new(
            offline_videos.clone(),
            fetch_queue.clone(),
            config.download_dir.clone(),
        );
        let emotes = EmoteLoader::with_default_providers(client);

        info!(
            signed_in = session.is_signed_in(),
            download_dir = %config.download_dir.display(),
            "services initialized"
        );

        Ok(Self {
            config,
            pool,
            session,
            providers,
            offline_videos,
            bookmarks,
            fetch_queue,
            downloads,
            emotes,
        })
    }

    /// Data source for `feature`, honouring the configured provider order.
    pub fn source_for(&self, feature: Feature) -> FeatureSource {
        self.providers
            .source_for(feature, &self.config.api_prefs)
            .with_page_size(self.config.page_size)
    }

    /// Followed streams of the signed-in user, if there is one.
    pub fn followed_streams(&self) -> Option<FeatureSource> {
        let user_id = self.session.user_id.clone()?;
        Some(self.source_for(Feature::FollowedStreams { user_id }))
    }
}
