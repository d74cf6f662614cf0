use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{debug, info, warn};

use crate::api::DataService;
use crate::lifecycle::Lifecycle;

/// Version of this frontend, fixed at build time.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// The footer is hidden on immersive pages, matched by exact path.
pub fn visibility(route: &str, immersive_routes: &[String]) -> Visibility {
    if immersive_routes.iter().any(|r| r == route) {
        Visibility::Hidden
    } else {
        Visibility::Visible
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusInfo {
    #[default]
    Unknown,
    Known(String),
}

impl StatusInfo {
    pub fn backend_version(&self) -> Option<&str> {
        match self {
            StatusInfo::Unknown => None,
            StatusInfo::Known(version) => Some(version.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterView {
    pub year: i32,
    pub app_version: &'static str,
    pub api_version: Option<String>,
}

pub struct Footer {
    service: Arc<DataService>,
    immersive_routes: Arc<[String]>,
    route: Option<String>,
    lifecycle: Lifecycle<StatusInfo>,
}

impl Footer {
    pub fn new(service: Arc<DataService>, immersive_routes: Arc<[String]>) -> Self {
        Self {
            service,
            immersive_routes,
            route: None,
            lifecycle: Lifecycle::new(StatusInfo::Unknown),
        }
    }

    /// Re-evaluate visibility for `route`, mounting or unmounting as needed.
    pub fn navigate(&mut self, route: &str) {
        self.route = Some(route.to_string());

        match visibility(route, &self.immersive_routes) {
            Visibility::Hidden => {
                if self.lifecycle.is_active() {
                    debug!("Footer hidden on {}", route);
                }
                self.lifecycle.deactivate();
            }
            Visibility::Visible => self.activate(),
        }
    }

    fn activate(&mut self) {
        let Some(lease) = self.lifecycle.mount(StatusInfo::Unknown) else {
            return;
        };

        let service = Arc::clone(&self.service);
        self.lifecycle.spawn(async move {
            match service.get_status().await {
                Ok(status) => {
                    info!("Backend reports version {}", status.version);
                    if !lease.apply(|info| *info = StatusInfo::Known(status.version)) {
                        debug!("Discarding status for a deactivated footer");
                    }
                }
                Err(e) => warn!("Failed to fetch backend status: {}", e),
            }
        });
    }

    pub fn visibility(&self) -> Visibility {
        match &self.route {
            Some(route) => visibility(route, &self.immersive_routes),
            None => Visibility::Hidden,
        }
    }

    pub async fn settled(&mut self) {
        self.lifecycle.settled().await;
    }

    pub fn status(&self) -> StatusInfo {
        self.lifecycle.snapshot()
    }

    /// `None` when the footer should not render at all.
    pub fn view(&self) -> Option<FooterView> {
        if self.visibility() == Visibility::Hidden {
            return None;
        }

        Some(FooterView {
            year: Utc::now().year(),
            app_version: APP_VERSION,
            api_version: self
                .lifecycle
                .read(|info| info.backend_version().map(str::to_string)),
        })
    }
}
