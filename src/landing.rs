//! Landing page composition: live status, recent videos and latest episodes.
use serde::Serialize;

use crate::feed::{Episode, FeedAggregator};
use crate::video::{PageRequest, Video, VideoDirectory};

/// Videos requested for the landing page.
pub const LANDING_VIDEO_COUNT: u32 = 8;
pub const GRID_SIZE: usize = 6;
pub const LANDING_EPISODE_COUNT: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Landing {
    pub live: Option<Video>,
    /// Hero slot: the live broadcast, else the newest upload.
    pub featured: Option<Video>,
    pub grid: Vec<Video>,
    pub episodes: Vec<Episode>,
}

/// Fetches the three landing sources concurrently and lays them out.
pub async fn load_landing(aggregator: &FeedAggregator, directory: &VideoDirectory) -> Landing {
    let recent = PageRequest::first(LANDING_VIDEO_COUNT);
    let (live, page, mut episodes) = tokio::join!(
        directory.get_live_video(),
        directory.list_videos(&recent),
        aggregator.list_episodes(),
    );

    episodes.truncate(LANDING_EPISODE_COUNT);
    compose(live, page.videos, episodes)
}

/// Grid excludes whichever video is featured.
pub fn compose(live: Option<Video>, videos: Vec<Video>, episodes: Vec<Episode>) -> Landing {
    let (featured, grid) = match &live {
        Some(live_video) => {
            let grid = videos
                .into_iter()
                .filter(|v| v.id != live_video.id)
                .take(GRID_SIZE)
                .collect();
            (Some(live_video.clone()), grid)
        }
        None => {
            let mut rest = videos.into_iter();
            let featured = rest.next();
            (featured, rest.take(GRID_SIZE).collect())
        }
    };

    Landing {
        live,
        featured,
        grid,
        episodes,
    }
}
