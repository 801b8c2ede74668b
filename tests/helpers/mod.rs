//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

use looped_auth::jwt::TokenIssuer;
use looped_auth::password::{PasswordHasher, PasswordValidator};
use looped_auth::session::{MemorySessionStore, SessionRecord, SessionStore};
use looped_core::config::{AuthConfig, SessionConfig};
use looped_core::error::AppError;
use looped_core::result::AppResult;
use looped_core::traits::Clock;
use looped_core::types::{PageRequest, PageResponse, SessionId, StaffId};
use looped_database::memory::MemoryStaffRepository;
use looped_database::repositories::{StaffRepository, Visibility};
use looped_entity::staff::{NewStaff, StaffMember, StaffPatch, StaffRole};
use looped_notify::{MailTemplate, NotificationGateway, SendMailConfig};
use looped_service::{
    AcceptInviteRequest, InviteRequest, LoginRequest, LoginResult, RegisterRequest, StaffPolicy,
    StaffService,
};

/// A password that passes the default policy.
pub const STRONG_PASSWORD: &str = "correct-horse-battery-staple-42";
/// A second, different password that passes the default policy.
pub const OTHER_PASSWORD: &str = "glacier-violin-marmalade-77";

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Gateway that records every message and can be told to fail or hang.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SendMailConfig>>,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl RecordingGateway {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every send hang far beyond any notification timeout.
    pub fn stall(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SendMailConfig> {
        self.sent.lock().unwrap().clone()
    }

    /// The plaintext code in the latest message to `to`.
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|mail| mail.to == to)
            .map(|mail| match &mail.template {
                MailTemplate::StaffInvite { code, .. } => code.clone(),
                MailTemplate::PasswordReset { code } => code.clone(),
            })
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, mail: &SendMailConfig) -> AppResult<()> {
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::notification_failed("SMTP relay refused message"));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Repository whose email lookups hang far beyond any store timeout.
#[derive(Debug, Default)]
pub struct StalledRepository {
    inner: MemoryStaffRepository,
}

#[async_trait]
impl StaffRepository for StalledRepository {
    async fn insert(&self, staff: NewStaff) -> AppResult<StaffMember> {
        self.inner.insert(staff).await
    }

    async fn find_by_email(&self, email: &str, visibility: Visibility) -> AppResult<StaffMember> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        self.inner.find_by_email(email, visibility).await
    }

    async fn find_by_id(&self, id: StaffId, visibility: Visibility) -> AppResult<StaffMember> {
        self.inner.find_by_id(id, visibility).await
    }

    async fn update(
        &self,
        id: StaffId,
        expected_version: i64,
        patch: StaffPatch,
        now: DateTime<Utc>,
    ) -> AppResult<StaffMember> {
        self.inner.update(id, expected_version, patch, now).await
    }

    async fn purge(&self, id: StaffId) -> AppResult<()> {
        self.inner.purge(id).await
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<StaffMember>> {
        self.inner.list(page).await
    }

    async fn count_live(&self) -> AppResult<u64> {
        self.inner.count_live().await
    }
}

/// Session store that can hold the next `create` until released, and can
/// fail bulk revocation.
#[derive(Debug)]
pub struct GatedSessionStore {
    inner: MemorySessionStore,
    armed: AtomicBool,
    failing_revokes: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedSessionStore {
    pub fn new() -> Self {
        Self {
            inner: MemorySessionStore::new(&SessionConfig::default()),
            armed: AtomicBool::new(false),
            failing_revokes: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Hold the next `create` until `release` is notified.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn fail_revokes(&self, failing: bool) {
        self.failing_revokes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for GatedSessionStore {
    async fn create(&self, record: SessionRecord) -> AppResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.create(record).await
    }

    async fn is_active(&self, session_id: SessionId, now: DateTime<Utc>) -> AppResult<bool> {
        self.inner.is_active(session_id, now).await
    }

    async fn get(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        self.inner.get(session_id).await
    }

    async fn rebind(&self, session_id: SessionId, credential_tag: String) -> AppResult<bool> {
        self.inner.rebind(session_id, credential_tag).await
    }

    async fn revoke(&self, session_id: SessionId) -> AppResult<bool> {
        self.inner.revoke(session_id).await
    }

    async fn revoke_all_for_staff(
        &self,
        staff_id: StaffId,
        keep: Option<SessionId>,
    ) -> AppResult<u64> {
        if self.failing_revokes.load(Ordering::SeqCst) {
            return Err(AppError::database("session backend offline"));
        }
        self.inner.revoke_all_for_staff(staff_id, keep).await
    }

    async fn prune(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.inner.prune(now).await
    }
}

/// A staff service wired to in-memory collaborators.
pub struct TestApp {
    pub service: StaffService,
    pub repo: Arc<MemoryStaffRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub gateway: Arc<RecordingGateway>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(StaffPolicy::default())
    }

    pub fn with_policy(policy: StaffPolicy) -> Self {
        let repo = Arc::new(MemoryStaffRepository::new());
        Self::build(repo.clone(), repo, policy)
    }

    /// Build a service over `backing`, keeping `repo` for direct inspection.
    pub fn build(
        repo: Arc<MemoryStaffRepository>,
        backing: Arc<dyn StaffRepository>,
        policy: StaffPolicy,
    ) -> Self {
        let sessions = Arc::new(MemorySessionStore::new(&SessionConfig::default()));
        Self::build_with_sessions(repo, backing, sessions, policy)
    }

    /// Build a service over a shared repository and the given session store.
    pub fn with_sessions(sessions: Arc<dyn SessionStore>) -> Self {
        let repo = Arc::new(MemoryStaffRepository::new());
        Self::build_with_sessions(repo.clone(), repo, sessions, StaffPolicy::default())
    }

    pub fn build_with_sessions(
        repo: Arc<MemoryStaffRepository>,
        backing: Arc<dyn StaffRepository>,
        sessions: Arc<dyn SessionStore>,
        policy: StaffPolicy,
    ) -> Self {
        let session_config = SessionConfig::default();
        let auth_config = AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            ..AuthConfig::default()
        };
        let gateway = Arc::new(RecordingGateway::default());
        let clock = Arc::new(ManualClock::new(start_time()));

        let service = StaffService::new(
            backing,
            sessions.clone(),
            gateway.clone(),
            Arc::new(PasswordHasher::new()),
            Arc::new(PasswordValidator::new(&auth_config)),
            Arc::new(TokenIssuer::new(&auth_config, &session_config)),
            clock.clone(),
            policy,
        );

        Self {
            service,
            repo,
            sessions,
            gateway,
            clock,
        }
    }

    pub async fn register(&self, name: &str, email: &str) -> StaffMember {
        self.service
            .register(RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: STRONG_PASSWORD.to_string(),
            })
            .await
            .expect("registration failed")
    }

    /// Invite `email` and return the plaintext code that was mailed.
    pub async fn invite(&self, email: &str, role: StaffRole) -> (StaffMember, String) {
        let staff = self
            .service
            .send_invite(InviteRequest {
                email: email.to_string(),
                role,
            })
            .await
            .expect("invite failed");
        let code = self
            .gateway
            .last_code_for(&staff.email)
            .expect("no invite mail recorded");
        (staff, code)
    }

    pub fn accept_request(&self, email: &str, code: &str) -> AcceptInviteRequest {
        AcceptInviteRequest {
            email: email.to_string(),
            code: code.to_string(),
            name: Some("Alice".to_string()),
            password: STRONG_PASSWORD.to_string(),
            confirm_password: STRONG_PASSWORD.to_string(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResult> {
        self.service
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}
