//! Staff repository contract and PostgreSQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use looped_core::error::AppError;
use looped_core::result::AppResult;
use looped_core::types::{PageRequest, PageResponse, StaffId};
use looped_entity::staff::{NewStaff, StaffMember, StaffPatch, StaffRole, StaffState, TimedCode};

use crate::error::map_sqlx_error;

/// Which records a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Soft-deleted records are treated as absent.
    Live,
    /// Soft-deleted records are returned too. A live record wins over a
    /// deleted one holding the same email.
    IncludeDeleted,
}

impl Visibility {
    /// Whether a record passes this visibility filter.
    pub fn admits(self, staff: &StaffMember) -> bool {
        match self {
            Self::Live => staff.is_live(),
            Self::IncludeDeleted => true,
        }
    }
}

/// Persistence contract for staff records.
///
/// Every write is a compare-and-swap on `version`: a writer holding a stale
/// version gets `Conflict` and nothing is written.
#[async_trait]
pub trait StaffRepository: Send + Sync + 'static {
    /// Insert a new record and assign its id.
    async fn insert(&self, staff: NewStaff) -> AppResult<StaffMember>;

    /// Find a record by email (case-insensitive).
    async fn find_by_email(&self, email: &str, visibility: Visibility) -> AppResult<StaffMember>;

    /// Find a record by id.
    async fn find_by_id(&self, id: StaffId, visibility: Visibility) -> AppResult<StaffMember>;

    /// Apply `patch` if the stored version still equals `expected_version`.
    async fn update(
        &self,
        id: StaffId,
        expected_version: i64,
        patch: StaffPatch,
        now: DateTime<Utc>,
    ) -> AppResult<StaffMember>;

    /// Mark a live record deleted and drop its pending codes.
    async fn soft_delete(
        &self,
        id: StaffId,
        expected_version: i64,
        at: DateTime<Utc>,
    ) -> AppResult<StaffMember> {
        self.update(id, expected_version, StaffPatch::soft_delete(at), at)
            .await
    }

    /// Physically remove a record.
    async fn purge(&self, id: StaffId) -> AppResult<()>;

    /// List live records, newest first.
    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<StaffMember>>;

    /// Count live records.
    async fn count_live(&self) -> AppResult<u64>;
}

const STAFF_COLUMNS: &str = "id, name, email, hashed_password, role, state, email_verified, \
     invite_code_hash, invite_expires_at, reset_token_hash, reset_expires_at, \
     created_at, updated_at, deleted_at, version";

/// Row shape of the `staff` table.
#[derive(Debug, FromRow)]
struct StaffRow {
    id: Uuid,
    name: String,
    email: String,
    hashed_password: Option<String>,
    role: StaffRole,
    state: StaffState,
    email_verified: bool,
    invite_code_hash: Option<String>,
    invite_expires_at: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    version: i64,
}

impl From<StaffRow> for StaffMember {
    fn from(row: StaffRow) -> Self {
        Self {
            id: StaffId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            hashed_password: row.hashed_password,
            role: row.role,
            state: row.state,
            email_verified: row.email_verified,
            invite_code: TimedCode::from_columns(row.invite_code_hash, row.invite_expires_at),
            reset_token: TimedCode::from_columns(row.reset_token_hash, row.reset_expires_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            version: row.version,
        }
    }
}

/// PostgreSQL-backed staff repository.
#[derive(Debug, Clone)]
pub struct PgStaffRepository {
    pool: PgPool,
}

impl PgStaffRepository {
    /// Create a new staff repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_row(&self, id: StaffId) -> AppResult<Option<StaffMember>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = $1");
        let row = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to find staff by id"))?;
        Ok(row.map(StaffMember::from))
    }
}

#[async_trait]
impl StaffRepository for PgStaffRepository {
    async fn insert(&self, staff: NewStaff) -> AppResult<StaffMember> {
        let member = staff.into_member(StaffId::new());
        let (invite_hash, invite_expiry) = split_code(&member.invite_code);
        let sql = format!(
            "INSERT INTO staff ({STAFF_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, NULL, $10, $11, NULL, $12) \
             RETURNING {STAFF_COLUMNS}"
        );

        let row = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(member.id.into_uuid())
            .bind(&member.name)
            .bind(&member.email)
            .bind(&member.hashed_password)
            .bind(member.role)
            .bind(member.state)
            .bind(member.email_verified)
            .bind(invite_hash)
            .bind(invite_expiry)
            .bind(member.created_at)
            .bind(member.updated_at)
            .bind(member.version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to insert staff"))?;

        debug!(staff_id = %member.id, "Inserted staff record");
        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str, visibility: Visibility) -> AppResult<StaffMember> {
        let filter = match visibility {
            Visibility::Live => "AND deleted_at IS NULL",
            Visibility::IncludeDeleted => "",
        };
        let sql = format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE LOWER(email) = LOWER($1) {filter} \
             ORDER BY deleted_at IS NOT NULL, updated_at DESC LIMIT 1"
        );

        sqlx::query_as::<_, StaffRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to find staff by email"))?
            .map(StaffMember::from)
            .ok_or_else(|| AppError::not_found("Staff member not found"))
    }

    async fn find_by_id(&self, id: StaffId, visibility: Visibility) -> AppResult<StaffMember> {
        self.find_row(id)
            .await?
            .filter(|staff| visibility.admits(staff))
            .ok_or_else(|| AppError::not_found(format!("Staff member {id} not found")))
    }

    async fn update(
        &self,
        id: StaffId,
        expected_version: i64,
        patch: StaffPatch,
        now: DateTime<Utc>,
    ) -> AppResult<StaffMember> {
        let mut staff = self.find_by_id(id, Visibility::Live).await?;
        if staff.version != expected_version {
            return Err(AppError::conflict(format!(
                "Staff member {id} was modified concurrently"
            )));
        }
        patch.apply(&mut staff, now);

        let (invite_hash, invite_expiry) = split_code(&staff.invite_code);
        let (reset_hash, reset_expiry) = split_code(&staff.reset_token);
        let sql = format!(
            "UPDATE staff SET name = $3, email = $4, hashed_password = $5, role = $6, \
             state = $7, email_verified = $8, invite_code_hash = $9, invite_expires_at = $10, \
             reset_token_hash = $11, reset_expires_at = $12, updated_at = $13, \
             deleted_at = $14, version = $15 \
             WHERE id = $1 AND version = $2 AND deleted_at IS NULL \
             RETURNING {STAFF_COLUMNS}"
        );

        let row = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(id.into_uuid())
            .bind(expected_version)
            .bind(&staff.name)
            .bind(&staff.email)
            .bind(&staff.hashed_password)
            .bind(staff.role)
            .bind(staff.state)
            .bind(staff.email_verified)
            .bind(invite_hash)
            .bind(invite_expiry)
            .bind(reset_hash)
            .bind(reset_expiry)
            .bind(staff.updated_at)
            .bind(staff.deleted_at)
            .bind(staff.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to update staff"))?;

        match row {
            Some(row) => Ok(row.into()),
            None => match self.find_row(id).await? {
                Some(current) if current.is_live() => Err(AppError::conflict(format!(
                    "Staff member {id} was modified concurrently"
                ))),
                _ => Err(AppError::not_found(format!("Staff member {id} not found"))),
            },
        }
    }

    async fn purge(&self, id: StaffId) -> AppResult<()> {
        sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to purge staff"))?;
        Ok(())
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<StaffMember>> {
        let total = self.count_live().await?;

        let sql = format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to list staff"))?;

        Ok(PageResponse::new(
            rows.into_iter().map(StaffMember::from).collect(),
            page,
            total,
        ))
    }

    async fn count_live(&self) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count staff"))?;
        Ok(total as u64)
    }
}

fn split_code(code: &Option<TimedCode>) -> (Option<&str>, Option<DateTime<Utc>>) {
    match code {
        Some(code) => (Some(code.code_hash.as_str()), Some(code.expiry)),
        None => (None, None),
    }
}
