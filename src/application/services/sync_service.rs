//! Sync Service - Reconciles campaign content against the VTT
//!
//! Every entity goes through the same upsert: update against the stored
//! external id if there is one, otherwise create and keep the returned id.
//! Failures are recorded on the entity's SyncRecord and counted per category;
//! they never abort the run. Scenes, actors and journals run concurrently with
//! bounded fan-out per category; tokens run afterwards because they reference
//! both the scene and the actor ids.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{future, stream, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::application::dto::{
    CampaignSyncStatusDto, CategoryTally, EntityBadgeDto, SyncBadgeDto, SyncReport, SyncScope,
};
use crate::application::ports::outbound::{CampaignRepositoryPort, VttCollection, VttError, VttPort};
use crate::application::services::sync_lock::{SyncGuard, SyncLocks};
use crate::application::services::vtt::{
    ActorCompiler, ActorRef, JournalCompiler, PlacementFailure, SceneCompiler,
    TokenPlacementEngine, ValidationError,
};
use crate::domain::entities::{Campaign, MapEntity, NpcEntity, Session};
use crate::domain::value_objects::{
    CampaignId, MapId, NpcId, SessionId, SyncKey, SyncRecord, SyncSettings, SyncStateError,
};

/// Why one entity failed to sync; recorded on its SyncRecord
#[derive(Debug, thiserror::Error)]
pub enum EntitySyncError {
    #[error("invalid content: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Vtt(#[from] VttError),
    #[error("token placement failed: {0}")]
    Placement(#[from] PlacementFailure),
    #[error("VTT call timed out after {0:?}")]
    Timeout(Duration),
    #[error("missing dependency: {0}")]
    Dependency(String),
    #[error("repository read failed: {0}")]
    Repository(String),
    #[error("failed to encode document: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error(transparent)]
    State(#[from] SyncStateError),
}

/// Run-level failures; no entity was touched when these are returned
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("VTT is disconnected: {0}")]
    ExternalUnavailable(String),
    #[error("a sync is already in flight for campaign {0}")]
    AlreadyInFlight(CampaignId),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

/// One entity's upsert, with its document compiled up front
struct SyncJob {
    key: SyncKey,
    document: Result<(VttCollection, serde_json::Value), EntitySyncError>,
}

impl SyncJob {
    fn new<T: Serialize>(
        key: SyncKey,
        collection: VttCollection,
        document: Result<T, EntitySyncError>,
    ) -> Self {
        let document = document.and_then(|doc| {
            let body = serde_json::to_value(doc)?;
            Ok((collection, body))
        });
        Self { key, document }
    }

    fn failed(key: SyncKey, error: EntitySyncError) -> Self {
        Self {
            key,
            document: Err(error),
        }
    }
}

/// What a bulk run covers, resolved from its scope
struct SyncPlan {
    campaign: Campaign,
    maps: Vec<MapEntity>,
    npcs: Vec<NpcEntity>,
    sessions: Vec<Session>,
    include_lore: bool,
}

pub struct SyncService {
    repository: Arc<dyn CampaignRepositoryPort>,
    vtt: Arc<dyn VttPort>,
    settings: SyncSettings,
    locks: SyncLocks,
}

impl SyncService {
    pub fn new(
        repository: Arc<dyn CampaignRepositoryPort>,
        vtt: Arc<dyn VttPort>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            repository,
            vtt,
            settings,
            locks: SyncLocks::new(),
        }
    }

    /// Sync everything in scope and report per-category counts
    #[instrument(skip(self))]
    pub async fn sync_scope(&self, scope: SyncScope) -> Result<SyncReport, SyncError> {
        let campaign_id = self.resolve_campaign(scope).await?;
        let guard = self.acquire(campaign_id)?;
        self.ensure_connected().await?;

        let plan = self.plan(scope, campaign_id).await?;
        info!(
            campaign_id = %campaign_id,
            maps = plan.maps.len(),
            npcs = plan.npcs.len(),
            sessions = plan.sessions.len(),
            "Starting sync run"
        );

        let scene_jobs: Vec<SyncJob> = plan.maps.iter().map(scene_job).collect();
        let actor_jobs: Vec<SyncJob> = plan.npcs.iter().map(actor_job).collect();
        let mut journal_jobs = Vec::new();
        if plan.include_lore {
            if let Some(job) = lore_job(&plan.campaign) {
                journal_jobs.push(job);
            }
        }
        journal_jobs.extend(plan.sessions.iter().filter_map(scenario_job));
        let planned = scene_jobs.len() + actor_jobs.len() + journal_jobs.len();

        let (scenes, actors, journals) = tokio::join!(
            self.run_jobs(scene_jobs, &guard),
            self.run_jobs(actor_jobs, &guard),
            self.run_jobs(journal_jobs, &guard),
        );

        let token_jobs = if guard.is_cancelled() {
            Vec::new()
        } else {
            self.token_jobs(&plan).await
        };
        let planned = planned + token_jobs.len();
        let tokens = self.run_jobs(token_jobs, &guard).await;

        let attempted = scenes.total() + actors.total() + journals.total() + tokens.total();
        let report = SyncReport {
            scenes,
            actors,
            journals,
            tokens,
            cancelled: guard.is_cancelled() && attempted < planned,
        };

        info!(
            campaign_id = %campaign_id,
            failed = report.failed(),
            cancelled = report.cancelled,
            "Sync run finished: scenes {}/{}, actors {}/{}, journals {}/{}, tokens {}/{}",
            report.scenes.success,
            report.scenes.failed,
            report.actors.success,
            report.actors.failed,
            report.journals.success,
            report.journals.failed,
            report.tokens.success,
            report.tokens.failed,
        );
        Ok(report)
    }

    /// Sync a single map as a scene
    #[instrument(skip(self), fields(map_id = %map_id))]
    pub async fn sync_map(&self, map_id: MapId) -> Result<SyncRecord, SyncError> {
        let map = self
            .repository
            .get_map(map_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Map {}", map_id)))?;
        let _guard = self.acquire(map.campaign_id)?;
        self.ensure_connected().await?;
        Ok(self.reconcile(scene_job(&map)).await?)
    }

    /// Sync a single NPC as an actor
    #[instrument(skip(self), fields(npc_id = %npc_id))]
    pub async fn sync_npc(&self, npc_id: NpcId) -> Result<SyncRecord, SyncError> {
        let npc = self
            .repository
            .get_npc(npc_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("NPC {}", npc_id)))?;
        let _guard = self.acquire(npc.campaign_id)?;
        self.ensure_connected().await?;
        Ok(self.reconcile(actor_job(&npc)).await?)
    }

    /// Sync a campaign's lore as a journal entry
    #[instrument(skip(self), fields(campaign_id = %campaign_id))]
    pub async fn sync_campaign_lore(&self, campaign_id: CampaignId) -> Result<SyncRecord, SyncError> {
        let campaign = self.load_campaign(campaign_id).await?;
        let job = lore_job(&campaign)
            .ok_or_else(|| SyncError::NotFound(format!("Lore for campaign {}", campaign_id)))?;
        let _guard = self.acquire(campaign_id)?;
        self.ensure_connected().await?;
        Ok(self.reconcile(job).await?)
    }

    /// Ask the campaign's running sync to stop at the next entity boundary
    pub fn cancel(&self, campaign_id: CampaignId) -> bool {
        let cancelled = self.locks.cancel(campaign_id);
        if cancelled {
            info!(campaign_id = %campaign_id, "Sync cancellation requested");
        }
        cancelled
    }

    pub fn is_in_flight(&self, campaign_id: CampaignId) -> bool {
        self.locks.is_held(campaign_id)
    }

    /// Sync badges of every entity in the campaign
    #[instrument(skip(self), fields(campaign_id = %campaign_id))]
    pub async fn sync_status(&self, campaign_id: CampaignId) -> Result<CampaignSyncStatusDto, SyncError> {
        let campaign = self.load_campaign(campaign_id).await?;
        let maps = self.repository.list_maps(campaign_id).await?;
        let npcs = self.repository.list_npcs(campaign_id).await?;

        let lore = match campaign.lore {
            Some(_) => {
                let key = SyncKey::lore_journal(campaign_id);
                let record = self
                    .repository
                    .get_sync_record(&key)
                    .await?
                    .unwrap_or_else(|| SyncRecord::never(key));
                Some(SyncBadgeDto::from(&record))
            }
            None => None,
        };

        Ok(CampaignSyncStatusDto {
            campaign_id: campaign_id.to_string(),
            in_flight: self.is_in_flight(campaign_id),
            maps: maps
                .iter()
                .map(|m| EntityBadgeDto {
                    id: m.id.to_string(),
                    name: m.name.clone(),
                    sync: SyncBadgeDto::from(&m.sync),
                })
                .collect(),
            npcs: npcs
                .iter()
                .map(|n| EntityBadgeDto {
                    id: n.id.to_string(),
                    name: n.name.clone(),
                    sync: SyncBadgeDto::from(&n.sync),
                })
                .collect(),
            lore,
        })
    }

    // =========================================================================
    // Run setup
    // =========================================================================

    fn acquire(&self, campaign_id: CampaignId) -> Result<SyncGuard, SyncError> {
        self.locks.try_acquire(campaign_id).ok_or_else(|| {
            warn!(campaign_id = %campaign_id, "Rejected sync: another sync is in flight");
            SyncError::AlreadyInFlight(campaign_id)
        })
    }

    async fn ensure_connected(&self) -> Result<(), SyncError> {
        match tokio::time::timeout(self.settings.call_timeout(), self.vtt.health_check()).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(SyncError::ExternalUnavailable(
                "health check reported not ready".to_string(),
            )),
            Ok(Err(e)) => Err(SyncError::ExternalUnavailable(e.to_string())),
            Err(_) => Err(SyncError::ExternalUnavailable("health check timed out".to_string())),
        }
    }

    async fn load_campaign(&self, campaign_id: CampaignId) -> Result<Campaign, SyncError> {
        self.repository
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Campaign {}", campaign_id)))
    }

    async fn load_session(&self, session_id: SessionId) -> Result<Session, SyncError> {
        self.repository
            .get_session(session_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Session {}", session_id)))
    }

    async fn resolve_campaign(&self, scope: SyncScope) -> Result<CampaignId, SyncError> {
        match scope {
            SyncScope::Campaign(id) => self.load_campaign(id).await.map(|c| c.id),
            SyncScope::Session(id) => self.load_session(id).await.map(|s| s.campaign_id),
        }
    }

    async fn plan(&self, scope: SyncScope, campaign_id: CampaignId) -> Result<SyncPlan, SyncError> {
        let campaign = self.load_campaign(campaign_id).await?;

        match scope {
            SyncScope::Campaign(_) => Ok(SyncPlan {
                maps: self.repository.list_maps(campaign_id).await?,
                npcs: self.repository.list_npcs(campaign_id).await?,
                sessions: self.repository.list_sessions(campaign_id).await?,
                include_lore: true,
                campaign,
            }),
            SyncScope::Session(session_id) => {
                let session = self.load_session(session_id).await?;

                let mut maps = Vec::new();
                if let Some(map_id) = session.map_id {
                    match self.repository.get_map(map_id).await? {
                        Some(map) => maps.push(map),
                        None => warn!(map_id = %map_id, "Session links a missing map"),
                    }
                }
                let mut seen: HashSet<MapId> = maps.iter().map(|m| m.id).collect();
                for map in self.repository.list_maps(campaign_id).await? {
                    if map.session_id == Some(session_id) && seen.insert(map.id) {
                        maps.push(map);
                    }
                }

                let mut npcs = Vec::new();
                for npc_id in &session.npc_ids {
                    match self.repository.get_npc(*npc_id).await? {
                        Some(npc) => npcs.push(npc),
                        None => warn!(npc_id = %npc_id, "Session lists a missing NPC"),
                    }
                }

                Ok(SyncPlan {
                    campaign,
                    maps,
                    npcs,
                    sessions: vec![session],
                    include_lore: false,
                })
            }
        }
    }

    /// Token jobs for every session with a linked map. Reads ids stored by
    /// the scene and actor phases. A failed repository read fails only the
    /// tokens it affects.
    async fn token_jobs(&self, plan: &SyncPlan) -> Vec<SyncJob> {
        let mut jobs = Vec::new();

        for session in &plan.sessions {
            let Some(map_id) = session.map_id else {
                continue;
            };
            let keys: Vec<SyncKey> = session
                .npc_ids
                .iter()
                .map(|npc_id| SyncKey::token(session.id, npc_id))
                .collect();

            let map = match self.repository.get_map(map_id).await {
                Ok(Some(map)) => map,
                Ok(None) => {
                    jobs.extend(fail_all(keys, || {
                        EntitySyncError::Dependency(format!("map {} is missing", map_id))
                    }));
                    continue;
                }
                Err(e) => {
                    error!(session_id = %session.id, map_id = %map_id, error = %e, "Failed to load map for tokens");
                    let reason = e.to_string();
                    jobs.extend(fail_all(keys, || EntitySyncError::Repository(reason.clone())));
                    continue;
                }
            };
            let scene = match SceneCompiler::compile(&map) {
                Ok(scene) => scene,
                Err(e) => {
                    jobs.extend(fail_all(keys, || EntitySyncError::Validation(e.clone())));
                    continue;
                }
            };
            let scene_id = match self.repository.get_sync_record(&map.sync_key()).await {
                Ok(record) => record.and_then(|r| r.external_id),
                Err(e) => {
                    error!(session_id = %session.id, map_id = %map.id, error = %e, "Failed to load scene record for tokens");
                    let reason = e.to_string();
                    jobs.extend(fail_all(keys, || EntitySyncError::Repository(reason.clone())));
                    continue;
                }
            };

            // Actors that cannot be resolved fail here; the rest are placed together
            let mut actors = Vec::new();
            for (npc_id, key) in session.npc_ids.iter().zip(keys) {
                let actor = match self.repository.get_npc(*npc_id).await {
                    Ok(Some(npc)) => ActorRef::from_npc(&npc).map_err(EntitySyncError::from),
                    Ok(None) => Err(EntitySyncError::Dependency(format!("NPC {} is missing", npc_id))),
                    Err(e) => {
                        error!(npc_id = %npc_id, error = %e, "Failed to load NPC for token");
                        Err(EntitySyncError::Repository(e.to_string()))
                    }
                };
                let actor = match actor {
                    Ok(actor) => actor,
                    Err(e) => {
                        jobs.push(SyncJob::failed(key, e));
                        continue;
                    }
                };
                match self.repository.get_sync_record(&SyncKey::actor(npc_id)).await {
                    Ok(record) => actors.push((key, actor, record.and_then(|r| r.external_id))),
                    Err(e) => {
                        error!(npc_id = %npc_id, error = %e, "Failed to load actor record for token");
                        jobs.push(SyncJob::failed(key, EntitySyncError::Repository(e.to_string())));
                    }
                }
            }

            let refs: Vec<ActorRef> = actors.iter().map(|(_, actor, _)| actor.clone()).collect();
            let placements = TokenPlacementEngine::place(&scene, &refs);

            for ((key, actor, actor_id), placement) in actors.into_iter().zip(placements) {
                let document = placement
                    .outcome
                    .map_err(EntitySyncError::from)
                    .and_then(|placement| {
                        let scene_id = scene_id.clone().ok_or_else(|| {
                            EntitySyncError::Dependency(format!("scene for map {} is not synced", map.id))
                        })?;
                        let actor_id = actor_id.ok_or_else(|| {
                            EntitySyncError::Dependency(format!("actor {} is not synced", actor.name))
                        })?;
                        let token = placement.to_document(&actor, &actor_id, scene.grid.size);
                        Ok((VttCollection::Tokens { scene_id }, token))
                    });
                jobs.push(match document {
                    Ok((collection, token)) => SyncJob::new(key, collection, Ok(token)),
                    Err(e) => SyncJob::failed(key, e),
                });
            }
        }

        jobs
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Run one category with bounded fan-out, stopping at entity boundaries
    /// once the run is cancelled
    async fn run_jobs(&self, jobs: Vec<SyncJob>, guard: &SyncGuard) -> CategoryTally {
        stream::iter(jobs)
            .take_while(|_| future::ready(!guard.is_cancelled()))
            .map(|job| self.reconcile(job))
            .buffer_unordered(self.settings.fan_out())
            .fold(CategoryTally::default(), |mut tally, outcome| async move {
                match outcome {
                    Ok(record) => tally.record(record.is_synced()),
                    Err(e) => {
                        error!(error = %e, "Failed to persist sync record");
                        tally.record(false);
                    }
                }
                tally
            })
            .await
    }

    /// Upsert one entity and persist every state transition.
    ///
    /// Only repository failures are returned as errors; VTT and content
    /// failures end in an `error` record.
    async fn reconcile(&self, job: SyncJob) -> anyhow::Result<SyncRecord> {
        let SyncJob { key, document } = job;
        let mut record = self
            .repository
            .get_sync_record(&key)
            .await?
            .unwrap_or_else(|| SyncRecord::never(key.clone()));

        record.begin();
        self.repository.save_sync_record(&record).await?;

        let outcome = match document {
            Ok((collection, body)) => {
                self.upsert(&collection, record.external_id.as_deref(), &body)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome.and_then(|id| record.succeed(id).map_err(EntitySyncError::from)) {
            Ok(()) => debug!(key = %key, external_id = ?record.external_id, "Entity synced"),
            Err(e) => {
                warn!(key = %key, error = %e, "Entity sync failed");
                record.fail(e.to_string());
            }
        }

        self.repository.save_sync_record(&record).await?;
        Ok(record)
    }

    async fn upsert(
        &self,
        collection: &VttCollection,
        external_id: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<String, EntitySyncError> {
        let timeout = self.settings.call_timeout();
        let call = async {
            match external_id {
                Some(id) => self
                    .vtt
                    .update_document(collection, id, body)
                    .await
                    .map(|()| id.to_string()),
                None => self.vtt.create_document(collection, body).await,
            }
        };
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| EntitySyncError::Timeout(timeout))?
            .map_err(EntitySyncError::from)
    }
}

fn scene_job(map: &MapEntity) -> SyncJob {
    SyncJob::new(
        map.sync_key(),
        VttCollection::Scenes,
        SceneCompiler::compile(map).map_err(EntitySyncError::from),
    )
}

fn actor_job(npc: &NpcEntity) -> SyncJob {
    SyncJob::new(
        npc.sync_key(),
        VttCollection::Actors,
        ActorCompiler::compile(npc).map_err(EntitySyncError::from),
    )
}

fn lore_job(campaign: &Campaign) -> Option<SyncJob> {
    let lore = campaign.lore.as_ref()?;
    Some(SyncJob::new(
        SyncKey::lore_journal(campaign.id),
        VttCollection::JournalEntries,
        JournalCompiler::compile_lore(&campaign.name, lore).map_err(EntitySyncError::from),
    ))
}

fn scenario_job(session: &Session) -> Option<SyncJob> {
    let scenario = session.scenario.as_deref().filter(|s| !s.trim().is_empty())?;
    Some(SyncJob::new(
        SyncKey::scenario_journal(session.id),
        VttCollection::JournalEntries,
        Ok(JournalCompiler::compile_scenario(&session.name, scenario)),
    ))
}

fn fail_all(keys: Vec<SyncKey>, error: impl Fn() -> EntitySyncError) -> Vec<SyncJob> {
    keys.into_iter()
        .map(|key| SyncJob::failed(key, error()))
        .collect()
}
