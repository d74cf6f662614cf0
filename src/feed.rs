use std::num::NonZeroU32;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::api::{DataService, FetchError, Newsletter, Podcast};
use crate::lifecycle::Lifecycle;

/// The editorial feeds the site knows how to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Newsletters,
    Podcasts,
}

impl FeedKind {
    pub fn api_path(self) -> &'static str {
        match self {
            FeedKind::Newsletters => "/newsletters",
            FeedKind::Podcasts => "/podcasts",
        }
    }

    /// Path of the "view all" listing, which also serves as the detail view.
    pub fn listing_path(self) -> &'static str {
        // Same shape as the backend paths today.
        self.api_path()
    }

    pub fn heading(self) -> &'static str {
        match self {
            FeedKind::Newsletters => "Newsletters",
            FeedKind::Podcasts => "Podcast",
        }
    }

    pub fn anchor(self) -> &'static str {
        match self {
            FeedKind::Newsletters => "newsletters",
            FeedKind::Podcasts => "podcasts",
        }
    }

    pub fn view_all_label(self) -> &'static str {
        match self {
            FeedKind::Newsletters => "View All Newsletters",
            FeedKind::Podcasts => "View All Podcasts",
        }
    }

    pub fn detail_href(self, id: &str) -> String {
        let query = serde_urlencoded::to_string([("id", id)]).unwrap_or_default();
        format!("{}?{}", self.listing_path(), query)
    }
}

pub trait FeedItem: DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: FeedKind;

    fn id(&self) -> &str;

    /// Summary card shown in a section, linking to the item's detail view.
    fn card(&self) -> Card;
}

impl FeedItem for Newsletter {
    const KIND: FeedKind = FeedKind::Newsletters;

    fn id(&self) -> &str {
        &self.id
    }

    fn card(&self) -> Card {
        Card {
            id: self.id.clone(),
            href: Self::KIND.detail_href(&self.id),
            title: self.title.clone(),
            summary: self.excerpt.clone(),
            meta: vec![self.date.clone(), self.read_time.clone()],
            link_label: "Read More →",
        }
    }
}

impl FeedItem for Podcast {
    const KIND: FeedKind = FeedKind::Podcasts;

    fn id(&self) -> &str {
        &self.id
    }

    fn card(&self) -> Card {
        Card {
            id: self.id.clone(),
            href: Self::KIND.detail_href(&self.id),
            title: self.title.clone(),
            summary: self.description.clone(),
            meta: [&self.date, &self.duration]
                .into_iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect(),
            link_label: "Listen →",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl FeedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedStatus::Idle => "idle",
            FeedStatus::Loading => "loading",
            FeedStatus::Loaded => "loaded",
            FeedStatus::Failed => "failed",
        }
    }
}

/// Items plus fetch status of one section. `Failed` always carries no items.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    items: Vec<T>,
    status: FeedStatus,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: FeedStatus::Idle,
        }
    }
}

impl<T> FeedState<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn start_loading(&mut self) {
        self.items.clear();
        self.status = FeedStatus::Loading;
    }

    pub fn resolve(&mut self, result: Result<Vec<T>, FetchError>) {
        match result {
            Ok(items) => {
                self.items = items;
                self.status = FeedStatus::Loaded;
            }
            Err(_) => {
                self.items.clear();
                self.status = FeedStatus::Failed;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub href: String,
    pub title: String,
    pub summary: String,
    pub meta: Vec<String>,
    pub link_label: &'static str,
}

/// What a template needs to draw a section.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub anchor: &'static str,
    pub heading: &'static str,
    pub status: &'static str,
    pub cards: Vec<Card>,
    pub view_all_href: &'static str,
    pub view_all_label: &'static str,
}

/// A bounded list of one feed, fetched once per activation.
pub struct FeedSection<T: FeedItem> {
    service: Arc<DataService>,
    limit: NonZeroU32,
    lifecycle: Lifecycle<FeedState<T>>,
}

impl<T: FeedItem> FeedSection<T> {
    pub fn new(service: Arc<DataService>, limit: NonZeroU32) -> Self {
        Self {
            service,
            limit,
            lifecycle: Lifecycle::new(FeedState::default()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Mount the section and start its single fetch. No-op while already active.
    pub fn activate(&mut self) {
        let Some(lease) = self.lifecycle.mount(FeedState::default()) else {
            debug!("{} section already active", T::KIND.heading());
            return;
        };
        lease.apply(FeedState::start_loading);

        let service = Arc::clone(&self.service);
        let limit = self.limit;
        self.lifecycle.spawn(async move {
            let result = service.get_feed::<T>(limit).await;
            match &result {
                Ok(items) => info!("Fetched {} {}", items.len(), T::KIND.anchor()),
                Err(e) => error!("Error fetching {}: {}", T::KIND.anchor(), e),
            }

            if !lease.apply(|state| state.resolve(result)) {
                debug!(
                    "Discarding {} result for a deactivated section",
                    T::KIND.anchor()
                );
            }
        });
    }

    /// Wait until the in-flight fetch, if any, has resolved.
    pub async fn settled(&mut self) {
        self.lifecycle.settled().await;
    }

    pub fn deactivate(&mut self) {
        self.lifecycle.deactivate();
    }

    pub fn state(&self) -> FeedState<T> {
        self.lifecycle.snapshot()
    }

    pub fn view(&self) -> SectionView {
        let kind = T::KIND;
        self.lifecycle.read(|state| SectionView {
            anchor: kind.anchor(),
            heading: kind.heading(),
            status: state.status().as_str(),
            cards: state.items().iter().map(FeedItem::card).collect(),
            view_all_href: kind.listing_path(),
            view_all_label: kind.view_all_label(),
        })
    }

    /// Card for the item with `id`, if the current state holds it.
    pub fn find(&self, id: &str) -> Option<Card> {
        self.lifecycle.read(|state| {
            state
                .items()
                .iter()
                .find(|item| item.id() == id)
                .map(FeedItem::card)
        })
    }
}
