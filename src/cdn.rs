//! URLs under which published attraction images are served.

use crate::ident::Task;
use crate::MAX_IMAGES;

const CDN_BASE: &str = "https://cdn.jsdelivr.net/gh";
pub const DEFAULT_USER: &str = "w2olves";
pub const DEFAULT_REPO: &str = "epictripwithadam";
pub const DEFAULT_TAG: &str = "v1";

/// Repository and release the `assets/poi` tree is published from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnTarget {
    pub user: String,
    pub repo: String,
    pub tag: String,
}

impl Default for CdnTarget {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            tag: DEFAULT_TAG.to_string(),
        }
    }
}

impl CdnTarget {
    pub fn image_url(&self, state_code: &str, poi_id: &str, index: usize) -> String {
        format!(
            "{CDN_BASE}/{}/{}@{}/assets/poi/{state_code}/{poi_id}/{index}.jpg",
            self.user, self.repo, self.tag
        )
    }

    /// URLs for `count` images, see [`image_indices`].
    pub fn image_urls(&self, state_code: &str, poi_id: &str, count: usize) -> Vec<String> {
        image_indices(count)
            .into_iter()
            .map(|index| self.image_url(state_code, poi_id, index))
            .collect()
    }

    pub fn task_image_urls(&self, task: &Task, count: usize) -> Vec<String> {
        self.image_urls(task.state_code, &task.poi_id, count)
    }
}

/// `1..=count` capped at `MAX_IMAGES`. An unknown (zero) count assumes a full set.
pub fn image_indices(count: usize) -> Vec<usize> {
    let count = if count == 0 {
        MAX_IMAGES
    } else {
        count.min(MAX_IMAGES)
    };
    (1..=count).collect()
}
