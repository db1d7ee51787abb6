//! Render cycles.
//!
//! Every filter change starts a new [`RenderSession`]. Starting one cancels
//! whichever cycle is still in flight, and only the newest session may install
//! its result, so a slow earlier request can never overwrite a newer map.

use crate::config::AppConfig;
use crate::data;
use crate::index::BoundaryIndex;
use crate::processing;
use crate::query::{self, ComplaintQuery};
use crate::render::{self, MapView};
use crate::types::FilterState;
use anyhow::Result;
use reqwest::Client;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

pub struct RenderSession {
    pub id: u64,
    token: CancellationToken,
}

impl RenderSession {
    pub fn is_superseded(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// One committed render cycle: the view plus the boundaries it was drawn from.
pub struct RenderedMap {
    pub session_id: u64,
    pub filter: FilterState,
    pub view: MapView,
    pub boundaries: BoundaryIndex,
}

pub enum CycleOutcome {
    Rendered(RenderedMap),
    Superseded,
}

#[derive(Default)]
struct SessionState {
    next_id: u64,
    active: Option<(u64, CancellationToken)>,
    current: Option<Arc<RenderedMap>>,
}

#[derive(Default)]
pub struct SessionManager {
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a new cycle, cancelling the previous one if it is still running.
    pub fn begin(&self) -> RenderSession {
        let mut state = self.lock();
        if let Some((id, token)) = state.active.take() {
            if !token.is_cancelled() {
                tracing::debug!(session = id, "superseding render session");
            }
            token.cancel();
        }
        state.next_id += 1;
        let id = state.next_id;
        let token = CancellationToken::new();
        state.active = Some((id, token.clone()));
        RenderSession { id, token }
    }

    /// Installs a finished cycle, tearing down the previous one. Returns
    /// `None` when a newer session has started since this one began.
    pub fn commit(&self, session: &RenderSession, rendered: RenderedMap) -> Option<Arc<RenderedMap>> {
        let mut state = self.lock();
        match &state.active {
            Some((id, _)) if *id == session.id && !session.is_superseded() => {
                let rendered = Arc::new(rendered);
                if let Some(previous) = state.current.replace(rendered.clone()) {
                    tracing::debug!(session = previous.session_id, "previous map view discarded");
                }
                Some(rendered)
            }
            _ => None,
        }
    }

    pub fn current(&self) -> Option<Arc<RenderedMap>> {
        self.lock().current.clone()
    }

    /// Begins, runs and commits one cycle.
    pub async fn render(
        &self,
        config: &AppConfig,
        client: &Client,
        filter: &FilterState,
    ) -> Result<Option<Arc<RenderedMap>>> {
        let session = self.begin();
        match run_cycle(config, client, filter, &session).await? {
            CycleOutcome::Rendered(rendered) => Ok(self.commit(&session, rendered)),
            CycleOutcome::Superseded => {
                tracing::info!(session = session.id, "render cycle superseded");
                Ok(None)
            }
        }
    }
}

/// Fetches complaints, narrows them by borough, fetches boundaries and builds
/// the view, in that order.
pub async fn run_cycle(
    config: &AppConfig,
    client: &Client,
    filter: &FilterState,
    session: &RenderSession,
) -> Result<CycleOutcome> {
    let query = ComplaintQuery::new(config, filter);

    let records = tokio::select! {
        biased;
        _ = session.token.cancelled() => return Ok(CycleOutcome::Superseded),
        res = query::fetch_complaints(client, &query) => res?,
    };
    let records = processing::filter_by_borough(records, &filter.borough);

    let boundaries = tokio::select! {
        biased;
        _ = session.token.cancelled() => return Ok(CycleOutcome::Superseded),
        res = data::load_boundaries(client, &config.source.boundaries) => res?,
    };

    if session.is_superseded() {
        return Ok(CycleOutcome::Superseded);
    }

    let view = render::build_map_view(&config.map, &records, &boundaries);
    Ok(CycleOutcome::Rendered(RenderedMap {
        session_id: session.id,
        filter: filter.clone(),
        view,
        boundaries: BoundaryIndex::new(boundaries),
    }))
}
