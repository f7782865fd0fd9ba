//! `PostgreSQL` mirror store.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE albums (
//!     album_id BIGINT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     artists TEXT[] NOT NULL DEFAULT '{}'
//! );
//! CREATE TABLE profiles (
//!     user_id BIGINT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     invitations BIGINT[] NOT NULL DEFAULT '{}'
//! );
//! ```
//!
//! # Concurrency
//!
//! Every guarded write is a single conditional `UPDATE`, so Postgres row
//! locks serialize writers on the same profile and the loser re-evaluates the
//! guard against the winner's committed row. Operations that read the album
//! take its row lock first (`FOR SHARE` when proposing, `FOR UPDATE` when
//! accepting), giving one lock order (album, then profile) across the store.

use album_invitations_core::mirror_store::{
    MirrorStore, ProposeOutcome, ProposeRejection, StoreError, StoreFuture,
};
use album_invitations_core::types::{Album, AlbumId, InvitationSummary, Profile, ProfileId};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::Instrument;

/// Connection pool settings.
#[derive(Clone, Debug)]
pub struct PoolSettings {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// How long to wait for a connection before failing.
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL-backed [`MirrorStore`].
///
/// # Example
///
/// ```ignore
/// use album_invitations_postgres::{PoolSettings, PostgresMirrorStore};
///
/// let store = PostgresMirrorStore::connect("postgres://localhost/invitations", &PoolSettings::default()).await?;
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct PostgresMirrorStore {
    pool: PgPool,
}

impl PostgresMirrorStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if no connection can be
    /// established.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect: {e}")))?;

        tracing::info!(
            max_connections = settings.max_connections,
            "Connected to mirror database"
        );
        Ok(Self::from_pool(pool))
    }

    /// Create the `profiles` and `albums` tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MirrorStore for PostgresMirrorStore {
    fn insert_profile(&self, profile: Profile) -> StoreFuture<'_, bool> {
        let span = tracing::debug_span!("insert_profile", user_id = %profile.user_id);
        Box::pin(
            async move {
                let invitations: Vec<i64> =
                    profile.invitations.iter().map(|id| i64::from(id.get())).collect();

                let result = sqlx::query(
                    "INSERT INTO profiles (user_id, name, invitations)
                     VALUES ($1, $2, $3)
                     ON CONFLICT (user_id) DO NOTHING",
                )
                .bind(i64::from(profile.user_id.get()))
                .bind(&profile.name)
                .bind(&invitations)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;

                Ok(result.rows_affected() == 1)
            }
            .instrument(span),
        )
    }

    fn insert_album(&self, album: Album) -> StoreFuture<'_, bool> {
        let span = tracing::debug_span!("insert_album", album_id = %album.album_id);
        Box::pin(
            async move {
                let result = sqlx::query(
                    "INSERT INTO albums (album_id, name, artists)
                     VALUES ($1, $2, $3)
                     ON CONFLICT (album_id) DO NOTHING",
                )
                .bind(i64::from(album.album_id.get()))
                .bind(&album.name)
                .bind(&album.artists)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;

                Ok(result.rows_affected() == 1)
            }
            .instrument(span),
        )
    }

    fn profile(&self, id: ProfileId) -> StoreFuture<'_, Option<Profile>> {
        Box::pin(async move {
            let row: Option<(i64, String, Vec<i64>)> = sqlx::query_as(
                "SELECT user_id, name, invitations FROM profiles WHERE user_id = $1",
            )
            .bind(i64::from(id.get()))
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

            row.map(|(user_id, name, invitations)| {
                Ok(Profile {
                    user_id: ProfileId::new(narrow(user_id, "profiles.user_id")?),
                    name,
                    invitations: album_ids(invitations)?,
                })
            })
            .transpose()
        })
    }

    fn album(&self, id: AlbumId) -> StoreFuture<'_, Option<Album>> {
        Box::pin(async move {
            let row: Option<(i64, String, Vec<String>)> = sqlx::query_as(
                "SELECT album_id, name, artists FROM albums WHERE album_id = $1",
            )
            .bind(i64::from(id.get()))
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

            row.map(|(album_id, name, artists)| {
                Ok(Album {
                    album_id: AlbumId::new(narrow(album_id, "albums.album_id")?),
                    name,
                    artists,
                })
            })
            .transpose()
        })
    }

    fn add_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, ProposeOutcome> {
        let span = tracing::debug_span!("add_invitation", %profile, %album);
        Box::pin(
            async move {
                let profile_id = i64::from(profile.get());
                let album_id = i64::from(album.get());
                let mut tx = self.pool.begin().await.map_err(storage_error)?;

                let locked: Option<(i64,)> =
                    sqlx::query_as("SELECT album_id FROM albums WHERE album_id = $1 FOR SHARE")
                        .bind(album_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(storage_error)?;
                if locked.is_none() {
                    return Ok(ProposeOutcome::Rejected(ProposeRejection::AlbumMissing));
                }

                let updated = sqlx::query(
                    "UPDATE profiles AS p
                     SET invitations = array_append(p.invitations, a.album_id)
                     FROM albums AS a
                     WHERE p.user_id = $1
                       AND a.album_id = $2
                       AND NOT (a.album_id = ANY(p.invitations))
                       AND NOT (p.name = ANY(a.artists))",
                )
                .bind(profile_id)
                .bind(album_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?
                .rows_affected();

                if updated == 1 {
                    tx.commit().await.map_err(storage_error)?;
                    return Ok(ProposeOutcome::Added);
                }

                // Guard failed: find out which precondition, inside the same
                // transaction so the album row is still locked.
                let state: Option<(bool, bool)> = sqlx::query_as(
                    "SELECT $2 = ANY(p.invitations), p.name = ANY(a.artists)
                     FROM profiles AS p, albums AS a
                     WHERE p.user_id = $1 AND a.album_id = $2",
                )
                .bind(profile_id)
                .bind(album_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;

                let rejection = match state {
                    None => ProposeRejection::ProfileMissing,
                    Some((true, _)) => ProposeRejection::AlreadyInvited,
                    Some((false, true)) => ProposeRejection::AlreadyCollaborator,
                    Some((false, false)) => {
                        // Another writer changed the row between the update
                        // and this read; it can only have added the invitation.
                        tracing::debug!("Guard failed but state looks clean; reporting as invited");
                        ProposeRejection::AlreadyInvited
                    },
                };
                Ok(ProposeOutcome::Rejected(rejection))
            }
            .instrument(span),
        )
    }

    fn remove_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, Option<Vec<AlbumId>>> {
        let span = tracing::debug_span!("remove_invitation", %profile, %album);
        Box::pin(
            async move {
                let remaining: Option<(Vec<i64>,)> = sqlx::query_as(
                    "UPDATE profiles
                     SET invitations = array_remove(invitations, $2)
                     WHERE user_id = $1
                       AND $2 = ANY(invitations)
                       AND EXISTS (SELECT 1 FROM albums WHERE album_id = $2)
                     RETURNING invitations",
                )
                .bind(i64::from(profile.get()))
                .bind(i64::from(album.get()))
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

                remaining.map(|(ids,)| album_ids(ids)).transpose()
            }
            .instrument(span),
        )
    }

    fn accept_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, Option<Vec<String>>> {
        let span = tracing::debug_span!("accept_invitation", %profile, %album);
        Box::pin(
            async move {
                let profile_id = i64::from(profile.get());
                let album_id = i64::from(album.get());
                // Dropping `tx` without commit rolls back, including on
                // cancellation.
                let mut tx = self.pool.begin().await.map_err(storage_error)?;

                let locked: Option<(i64,)> =
                    sqlx::query_as("SELECT album_id FROM albums WHERE album_id = $1 FOR UPDATE")
                        .bind(album_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(storage_error)?;
                if locked.is_none() {
                    return Ok(None);
                }

                let name: Option<(String,)> = sqlx::query_as(
                    "UPDATE profiles
                     SET invitations = array_remove(invitations, $2)
                     WHERE user_id = $1 AND $2 = ANY(invitations)
                     RETURNING name",
                )
                .bind(profile_id)
                .bind(album_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;
                let Some((name,)) = name else {
                    return Ok(None);
                };

                let (artists,): (Vec<String>,) = sqlx::query_as(
                    "UPDATE albums
                     SET artists = CASE
                         WHEN $2 = ANY(artists) THEN artists
                         ELSE array_append(artists, $2)
                     END
                     WHERE album_id = $1
                     RETURNING artists",
                )
                .bind(album_id)
                .bind(&name)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage_error)?;

                tx.commit().await.map_err(storage_error)?;
                Ok(Some(artists))
            }
            .instrument(span),
        )
    }

    fn invitations(&self, profile: ProfileId) -> StoreFuture<'_, Vec<InvitationSummary>> {
        Box::pin(async move {
            let rows: Vec<(i64, String)> = sqlx::query_as(
                "SELECT a.album_id, a.name
                 FROM profiles AS p
                 CROSS JOIN LATERAL unnest(p.invitations) WITH ORDINALITY AS inv(album_id, position)
                 JOIN albums AS a ON a.album_id = inv.album_id
                 WHERE p.user_id = $1
                 ORDER BY inv.position",
            )
            .bind(i64::from(profile.get()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

            rows.into_iter()
                .map(|(album_id, album_name)| {
                    Ok(InvitationSummary {
                        album_id: AlbumId::new(narrow(album_id, "albums.album_id")?),
                        album_name,
                    })
                })
                .collect()
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
            Ok(())
        })
    }
}

fn storage_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupted(err.to_string())
        },
        other => {
            metrics::counter!("mirror_store_errors_total").increment(1);
            StoreError::Unavailable(other.to_string())
        },
    }
}

fn narrow(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupted(format!("{column} value {value} out of range")))
}

fn album_ids(raw: Vec<i64>) -> Result<Vec<AlbumId>, StoreError> {
    raw.into_iter()
        .map(|id| narrow(id, "profiles.invitations").map(AlbumId::new))
        .collect()
}
