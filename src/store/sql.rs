//! SQLite backend.
//!
//! Each entity maps to a table; the session-speaker relationship is a
//! many-to-many join table. Session reads reconstruct `speakerIds` via an
//! aggregate join, and speaker-link writes are delete-all-then-reinsert.
//! Multi-statement writes run inside a transaction.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use super::{clean_optional, dedup_ids, generate_id, now_rfc3339, rating, Store};
use crate::errors::AppError;
use crate::models::{
    Admin, CreateEventRequest, CreateReviewRequest, CreateSessionRequest, CreateSpeakerRequest,
    Datastore, Event, MigrationReport, Review, ReviewFilter, Session, Speaker,
    UpdateEventRequest, UpdateSessionRequest, UpdateSpeakerRequest,
};

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS speakers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            title TEXT NOT NULL,
            company TEXT,
            bio TEXT,
            image TEXT NOT NULL DEFAULT '',
            twitter TEXT,
            linkedin TEXT,
            github TEXT,
            rating REAL NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            start_time TEXT NOT NULL DEFAULT '',
            end_time TEXT NOT NULL DEFAULT '',
            track TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session_speakers (
            session_id TEXT NOT NULL,
            speaker_id TEXT NOT NULL,
            PRIMARY KEY (session_id, speaker_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            image TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            speaker_id TEXT,
            session_id TEXT,
            user_name TEXT NOT NULL,
            user_email TEXT,
            user_avatar TEXT NOT NULL DEFAULT '',
            rating INTEGER NOT NULL,
            comment TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_speakers_created_at ON speakers(created_at);
        CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
        CREATE INDEX IF NOT EXISTS idx_session_speakers_speaker ON session_speakers(speaker_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_speaker_id ON reviews(speaker_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_session_id ON reviews(session_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str = r#"
    s.id, s.title, s.description, s.start_time, s.end_time, s.track, s.tags,
    s.created_at, s.updated_at,
    GROUP_CONCAT(ss.speaker_id) AS speaker_ids
"#;

#[async_trait]
impl Store for SqliteStore {
    async fn list_speakers(&self) -> Result<Vec<Speaker>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, title, company, bio, image, twitter, linkedin, github, \
             rating, review_count, created_at, updated_at \
             FROM speakers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(speaker_from_row).collect())
    }

    async fn get_speaker(&self, id: &str) -> Result<Option<Speaker>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, title, company, bio, image, twitter, linkedin, github, \
             rating, review_count, created_at, updated_at \
             FROM speakers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(speaker_from_row))
    }

    async fn create_speaker(&self, request: &CreateSpeakerRequest) -> Result<Speaker, AppError> {
        let id = generate_id();
        let now = now_rfc3339();
        let company = clean_optional(request.company.as_deref());
        let bio = clean_optional(request.bio.as_deref());
        let twitter = clean_optional(request.twitter.as_deref());
        let linkedin = clean_optional(request.linkedin.as_deref());
        let github = clean_optional(request.github.as_deref());

        sqlx::query(
            "INSERT INTO speakers (id, name, title, company, bio, image, twitter, linkedin, \
             github, rating, review_count, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)",
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.title)
        .bind(&company)
        .bind(&bio)
        .bind(&request.image)
        .bind(&twitter)
        .bind(&linkedin)
        .bind(&github)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Speaker {
            id,
            name: request.name.clone(),
            title: request.title.clone(),
            company,
            bio,
            image: request.image.clone(),
            twitter,
            linkedin,
            github,
            rating: 0.0,
            review_count: 0,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update_speaker(
        &self,
        id: &str,
        request: &UpdateSpeakerRequest,
    ) -> Result<(), AppError> {
        let Some(existing) = self.get_speaker(id).await? else {
            return Ok(());
        };

        let now = now_rfc3339();
        let name = request.name.as_ref().unwrap_or(&existing.name);
        let title = request.title.as_ref().unwrap_or(&existing.title);
        let image = request.image.as_ref().unwrap_or(&existing.image);
        let company = merge_optional(&request.company, &existing.company);
        let bio = merge_optional(&request.bio, &existing.bio);
        let twitter = merge_optional(&request.twitter, &existing.twitter);
        let linkedin = merge_optional(&request.linkedin, &existing.linkedin);
        let github = merge_optional(&request.github, &existing.github);

        sqlx::query(
            "UPDATE speakers SET name = ?, title = ?, company = ?, bio = ?, image = ?, \
             twitter = ?, linkedin = ?, github = ?, updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(title)
        .bind(&company)
        .bind(&bio)
        .bind(image)
        .bind(&twitter)
        .bind(&linkedin)
        .bind(&github)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_speaker(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Referential cleanup before the row itself
        sqlx::query("DELETE FROM session_speakers WHERE speaker_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM speakers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions s \
             LEFT JOIN session_speakers ss ON s.id = ss.session_id \
             GROUP BY s.id ORDER BY s.start_time"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions s \
             LEFT JOIN session_speakers ss ON s.id = ss.session_id \
             WHERE s.id = ? GROUP BY s.id"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(session_from_row))
    }

    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session, AppError> {
        let id = generate_id();
        let now = now_rfc3339();
        let speaker_ids = dedup_ids(&request.speaker_ids);
        let tags_json = serde_json::to_string(&request.tags)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sessions (id, title, description, start_time, end_time, track, tags, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.start_time)
        .bind(&request.end_time)
        .bind(&request.track)
        .bind(&tags_json)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for speaker_id in &speaker_ids {
            sqlx::query("INSERT INTO session_speakers (session_id, speaker_id) VALUES (?, ?)")
                .bind(&id)
                .bind(speaker_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Session {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            start_time: request.start_time.clone(),
            end_time: request.end_time.clone(),
            track: request.track.clone(),
            speaker_ids,
            tags: request.tags.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update_session(
        &self,
        id: &str,
        request: &UpdateSessionRequest,
    ) -> Result<(), AppError> {
        let Some(existing) = self.get_session(id).await? else {
            return Ok(());
        };

        let now = now_rfc3339();
        let title = request.title.as_ref().unwrap_or(&existing.title);
        let description = request
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let start_time = request.start_time.as_ref().unwrap_or(&existing.start_time);
        let end_time = request.end_time.as_ref().unwrap_or(&existing.end_time);
        let track = request.track.as_ref().unwrap_or(&existing.track);
        let tags = request.tags.as_ref().unwrap_or(&existing.tags);
        let tags_json = serde_json::to_string(tags)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE sessions SET title = ?, description = ?, start_time = ?, end_time = ?, \
             track = ?, tags = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(start_time)
        .bind(end_time)
        .bind(track)
        .bind(&tags_json)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Speaker links are replaced wholesale, not diffed
        if let Some(speaker_ids) = &request.speaker_ids {
            sqlx::query("DELETE FROM session_speakers WHERE session_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for speaker_id in dedup_ids(speaker_ids) {
                sqlx::query("INSERT INTO session_speakers (session_id, speaker_id) VALUES (?, ?)")
                    .bind(id)
                    .bind(&speaker_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM session_speakers WHERE session_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_event(&self) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, description, date, location, image, created_at, updated_at \
             FROM events LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(event_from_row))
    }

    async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, AppError> {
        let id = generate_id();
        let now = now_rfc3339();

        let mut tx = self.pool.begin().await?;

        // Singleton: replace whatever was there
        sqlx::query("DELETE FROM events").execute(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO events (id, name, description, date, location, image, created_at, \
             updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.date)
        .bind(&request.location)
        .bind(&request.image)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Event {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            date: request.date.clone(),
            location: request.location.clone(),
            image: request.image.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update_event(&self, id: &str, request: &UpdateEventRequest) -> Result<(), AppError> {
        let row = sqlx::query(
            "SELECT id, name, description, date, location, image, created_at, updated_at \
             FROM events WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(existing) = row.as_ref().map(event_from_row) else {
            return Ok(());
        };

        let now = now_rfc3339();
        let name = request.name.as_ref().unwrap_or(&existing.name);
        let description = request
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let date = request.date.as_ref().unwrap_or(&existing.date);
        let location = request.location.as_ref().unwrap_or(&existing.location);
        let image = request.image.as_ref().unwrap_or(&existing.image);

        sqlx::query(
            "UPDATE events SET name = ?, description = ?, date = ?, location = ?, image = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(date)
        .bind(location)
        .bind(image)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>, AppError> {
        let base = "SELECT id, speaker_id, session_id, user_name, user_email, user_avatar, \
                    rating, comment, date, created_at FROM reviews";

        let rows = match (&filter.speaker_id, &filter.session_id) {
            (Some(speaker_id), Some(session_id)) => {
                sqlx::query(&format!(
                    "{base} WHERE speaker_id = ? AND session_id = ? ORDER BY created_at DESC"
                ))
                .bind(speaker_id)
                .bind(session_id)
                .fetch_all(&self.pool)
                .await?
            }
            (Some(speaker_id), None) => {
                sqlx::query(&format!(
                    "{base} WHERE speaker_id = ? ORDER BY created_at DESC"
                ))
                .bind(speaker_id)
                .fetch_all(&self.pool)
                .await?
            }
            (None, Some(session_id)) => {
                sqlx::query(&format!(
                    "{base} WHERE session_id = ? ORDER BY created_at DESC"
                ))
                .bind(session_id)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query(&format!("{base} ORDER BY created_at DESC"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.iter().map(review_from_row).collect())
    }

    async fn create_review(&self, request: &CreateReviewRequest) -> Result<Review, AppError> {
        let id = generate_id();
        let now = now_rfc3339();
        let speaker_id = clean_optional(request.speaker_id.as_deref());
        let session_id = clean_optional(request.session_id.as_deref());
        let user_email = clean_optional(request.user_email.as_deref());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO reviews (id, speaker_id, session_id, user_name, user_email, \
             user_avatar, rating, comment, date, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&speaker_id)
        .bind(&session_id)
        .bind(&request.user_name)
        .bind(&user_email)
        .bind(&request.user_avatar)
        .bind(request.rating)
        .bind(&request.comment)
        .bind(&request.date)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if let Some(speaker_id) = &speaker_id {
            reaggregate_speaker(&mut tx, speaker_id).await?;
        }

        tx.commit().await?;

        Ok(Review {
            id,
            speaker_id,
            session_id,
            user_name: request.user_name.clone(),
            user_email,
            user_avatar: request.user_avatar.clone(),
            rating: request.rating,
            comment: request.comment.clone(),
            date: request.date.clone(),
            created_at: now,
        })
    }

    async fn delete_review(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT speaker_id FROM reviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(());
        };
        let speaker_id: Option<String> = row.get("speaker_id");

        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(speaker_id) = &speaker_id {
            reaggregate_speaker(&mut tx, speaker_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM admins WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(admin_from_row))
    }

    async fn create_admin(&self, username: &str, password_hash: &str) -> Result<Admin, AppError> {
        if self.get_admin_by_username(username).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Admin \"{}\" already exists",
                username
            )));
        }

        let admin = Admin {
            id: generate_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO admins (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&admin.id)
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(&admin.created_at)
        .execute(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn import(&self, incoming: &Datastore) -> Result<MigrationReport, AppError> {
        let mut report = MigrationReport::default();
        let mut tx = self.pool.begin().await?;

        for speaker in &incoming.speakers {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO speakers (id, name, title, company, bio, image, twitter, \
                 linkedin, github, rating, review_count, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&speaker.id)
            .bind(&speaker.name)
            .bind(&speaker.title)
            .bind(&speaker.company)
            .bind(&speaker.bio)
            .bind(&speaker.image)
            .bind(&speaker.twitter)
            .bind(&speaker.linkedin)
            .bind(&speaker.github)
            .bind(speaker.rating)
            .bind(speaker.review_count)
            .bind(&speaker.created_at)
            .bind(&speaker.updated_at)
            .execute(&mut *tx)
            .await?;
            report.speakers += result.rows_affected() as usize;
        }

        for session in &incoming.sessions {
            let tags_json = serde_json::to_string(&session.tags)?;
            let result = sqlx::query(
                "INSERT OR IGNORE INTO sessions (id, title, description, start_time, end_time, \
                 track, tags, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&session.id)
            .bind(&session.title)
            .bind(&session.description)
            .bind(&session.start_time)
            .bind(&session.end_time)
            .bind(&session.track)
            .bind(&tags_json)
            .bind(&session.created_at)
            .bind(&session.updated_at)
            .execute(&mut *tx)
            .await?;
            report.sessions += result.rows_affected() as usize;

            for speaker_id in dedup_ids(&session.speaker_ids) {
                sqlx::query(
                    "INSERT OR IGNORE INTO session_speakers (session_id, speaker_id) \
                     VALUES (?, ?)",
                )
                .bind(&session.id)
                .bind(&speaker_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        for event in &incoming.events {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO events (id, name, description, date, location, image, \
                 created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&event.id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.date)
            .bind(&event.location)
            .bind(&event.image)
            .bind(&event.created_at)
            .bind(&event.updated_at)
            .execute(&mut *tx)
            .await?;
            report.events += result.rows_affected() as usize;
        }

        for review in &incoming.reviews {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO reviews (id, speaker_id, session_id, user_name, \
                 user_email, user_avatar, rating, comment, date, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&review.id)
            .bind(&review.speaker_id)
            .bind(&review.session_id)
            .bind(&review.user_name)
            .bind(&review.user_email)
            .bind(&review.user_avatar)
            .bind(review.rating)
            .bind(&review.comment)
            .bind(&review.date)
            .bind(&review.created_at)
            .execute(&mut *tx)
            .await?;
            report.reviews += result.rows_affected() as usize;
        }

        for admin in &incoming.admins {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO admins (id, username, password_hash, created_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&admin.id)
            .bind(&admin.username)
            .bind(&admin.password_hash)
            .bind(&admin.created_at)
            .execute(&mut *tx)
            .await?;
            report.admins += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(report)
    }
}

/// Recompute one speaker's derived rating fields inside an open transaction.
async fn reaggregate_speaker(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    speaker_id: &str,
) -> Result<(), AppError> {
    let rows = sqlx::query("SELECT rating FROM reviews WHERE speaker_id = ?")
        .bind(speaker_id)
        .fetch_all(&mut **tx)
        .await?;
    let ratings: Vec<i64> = rows.iter().map(|row| row.get("rating")).collect();
    let summary = rating::summarize(&ratings);

    sqlx::query("UPDATE speakers SET rating = ?, review_count = ? WHERE id = ?")
        .bind(summary.rating)
        .bind(summary.review_count)
        .bind(speaker_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Merge a patch field into the stored value: a present field wins (after
/// empty-string normalization), an absent field keeps what was stored.
fn merge_optional(incoming: &Option<String>, existing: &Option<String>) -> Option<String> {
    if incoming.is_some() {
        clean_optional(incoming.as_deref())
    } else {
        existing.clone()
    }
}

// Helper functions for row conversion

fn speaker_from_row(row: &SqliteRow) -> Speaker {
    Speaker {
        id: row.get("id"),
        name: row.get("name"),
        title: row.get("title"),
        company: row.get("company"),
        bio: row.get("bio"),
        image: row.get("image"),
        twitter: row.get("twitter"),
        linkedin: row.get("linkedin"),
        github: row.get("github"),
        rating: row.get("rating"),
        review_count: row.get("review_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn session_from_row(row: &SqliteRow) -> Session {
    let tags_str: String = row.get("tags");
    let speaker_ids_str: Option<String> = row.get("speaker_ids");
    Session {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        track: row.get("track"),
        speaker_ids: speaker_ids_str
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        tags: parse_json_array(&tags_str),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn event_from_row(row: &SqliteRow) -> Event {
    Event {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        date: row.get("date"),
        location: row.get("location"),
        image: row.get("image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn review_from_row(row: &SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        speaker_id: row.get("speaker_id"),
        session_id: row.get("session_id"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        user_avatar: row.get("user_avatar"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        date: row.get("date"),
        created_at: row.get("created_at"),
    }
}

fn admin_from_row(row: &SqliteRow) -> Admin {
    Admin {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
