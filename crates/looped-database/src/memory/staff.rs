//! In-memory staff repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use looped_core::error::AppError;
use looped_core::result::AppResult;
use looped_core::types::{PageRequest, PageResponse, StaffId};
use looped_entity::staff::{NewStaff, StaffMember, StaffPatch};

use crate::repositories::{StaffRepository, Visibility};

/// Staff repository backed by a concurrent map.
///
/// Reads go straight to the map. Writes take the write gate first, so the
/// live-email uniqueness scan and the version check observe the same state
/// as the write that follows them.
#[derive(Debug, Default)]
pub struct MemoryStaffRepository {
    records: DashMap<StaffId, StaffMember>,
    write_gate: Mutex<()>,
}

impl MemoryStaffRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live record other than `except` holds `email`.
    fn email_taken(&self, email: &str, except: Option<StaffId>) -> bool {
        self.records.iter().any(|entry| {
            let staff = entry.value();
            staff.is_live() && Some(staff.id) != except && staff.email.eq_ignore_ascii_case(email)
        })
    }

    fn load(&self, id: StaffId, visibility: Visibility) -> AppResult<StaffMember> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .filter(|staff| visibility.admits(staff))
            .ok_or_else(|| AppError::not_found(format!("Staff member {id} not found")))
    }
}

#[async_trait]
impl StaffRepository for MemoryStaffRepository {
    async fn insert(&self, staff: NewStaff) -> AppResult<StaffMember> {
        let _gate = self.write_gate.lock().await;

        if self.email_taken(&staff.email, None) {
            return Err(AppError::duplicate_email("Email is already in use"));
        }

        let member = staff.into_member(StaffId::new());
        self.records.insert(member.id, member.clone());
        debug!(staff_id = %member.id, "Inserted staff record");
        Ok(member)
    }

    async fn find_by_email(&self, email: &str, visibility: Visibility) -> AppResult<StaffMember> {
        self.records
            .iter()
            .filter(|entry| {
                let staff = entry.value();
                visibility.admits(staff) && staff.email.eq_ignore_ascii_case(email)
            })
            .map(|entry| entry.value().clone())
            .max_by_key(|staff| (staff.is_live(), staff.updated_at))
            .ok_or_else(|| AppError::not_found("Staff member not found"))
    }

    async fn find_by_id(&self, id: StaffId, visibility: Visibility) -> AppResult<StaffMember> {
        self.load(id, visibility)
    }

    async fn update(
        &self,
        id: StaffId,
        expected_version: i64,
        patch: StaffPatch,
        now: DateTime<Utc>,
    ) -> AppResult<StaffMember> {
        let _gate = self.write_gate.lock().await;

        let mut staff = self.load(id, Visibility::Live)?;
        if staff.version != expected_version {
            return Err(AppError::conflict(format!(
                "Staff member {id} was modified concurrently"
            )));
        }
        let email_clash = patch.changes_email(&staff)
            && patch
                .email
                .as_deref()
                .is_some_and(|email| self.email_taken(email, Some(id)));
        if email_clash {
            return Err(AppError::duplicate_email("Email is already in use"));
        }

        patch.apply(&mut staff, now);
        self.records.insert(id, staff.clone());
        Ok(staff)
    }

    async fn purge(&self, id: StaffId) -> AppResult<()> {
        let _gate = self.write_gate.lock().await;
        self.records.remove(&id);
        Ok(())
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<StaffMember>> {
        let mut live: Vec<StaffMember> = self
            .records
            .iter()
            .filter(|entry| entry.value().is_live())
            .map(|entry| entry.value().clone())
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(PageResponse::from_full(live, page))
    }

    async fn count_live(&self) -> AppResult<u64> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.value().is_live())
            .count() as u64)
    }
}
