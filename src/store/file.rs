//! Flat-file JSON backend.
//!
//! The entire datastore is one JSON document; every write re-serializes the
//! whole document. Read-modify-write cycles are serialized behind an
//! in-process mutex, but there is no protection against a second process
//! writing the same file (accepted for single-admin, low-traffic use).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{clean_optional, dedup_ids, generate_id, now_rfc3339, rating, Store};
use crate::errors::AppError;
use crate::models::{
    Admin, CreateEventRequest, CreateReviewRequest, CreateSessionRequest, CreateSpeakerRequest,
    Datastore, Event, MigrationReport, Review, ReviewFilter, Session, Speaker,
    UpdateEventRequest, UpdateSessionRequest, UpdateSpeakerRequest,
};

/// File-backed store keeping all collections in a single JSON document.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the whole document. A missing file is an empty store.
    pub async fn load(&self) -> Result<Datastore, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Datastore::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, data: &Datastore) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// Recompute one speaker's derived rating fields from the live review set.
    fn reaggregate_speaker(data: &mut Datastore, speaker_id: &str) {
        let ratings: Vec<i64> = data
            .reviews
            .iter()
            .filter(|r| r.speaker_id.as_deref() == Some(speaker_id))
            .map(|r| r.rating)
            .collect();
        let summary = rating::summarize(&ratings);
        if let Some(speaker) = data.speakers.iter_mut().find(|s| s.id == speaker_id) {
            speaker.rating = summary.rating;
            speaker.review_count = summary.review_count;
        }
    }
}

#[async_trait]
impl Store for FileStore {
    async fn list_speakers(&self) -> Result<Vec<Speaker>, AppError> {
        let mut speakers = self.load().await?.speakers;
        speakers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(speakers)
    }

    async fn get_speaker(&self, id: &str) -> Result<Option<Speaker>, AppError> {
        Ok(self.load().await?.speakers.into_iter().find(|s| s.id == id))
    }

    async fn create_speaker(&self, request: &CreateSpeakerRequest) -> Result<Speaker, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let now = now_rfc3339();
        let speaker = Speaker {
            id: generate_id(),
            name: request.name.clone(),
            title: request.title.clone(),
            company: clean_optional(request.company.as_deref()),
            bio: clean_optional(request.bio.as_deref()),
            image: request.image.clone(),
            twitter: clean_optional(request.twitter.as_deref()),
            linkedin: clean_optional(request.linkedin.as_deref()),
            github: clean_optional(request.github.as_deref()),
            rating: 0.0,
            review_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };
        data.speakers.push(speaker.clone());
        self.save(&data).await?;
        Ok(speaker)
    }

    async fn update_speaker(
        &self,
        id: &str,
        request: &UpdateSpeakerRequest,
    ) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let Some(speaker) = data.speakers.iter_mut().find(|s| s.id == id) else {
            return Ok(());
        };
        if let Some(name) = &request.name {
            speaker.name = name.clone();
        }
        if let Some(title) = &request.title {
            speaker.title = title.clone();
        }
        if let Some(image) = &request.image {
            speaker.image = image.clone();
        }
        if request.company.is_some() {
            speaker.company = clean_optional(request.company.as_deref());
        }
        if request.bio.is_some() {
            speaker.bio = clean_optional(request.bio.as_deref());
        }
        if request.twitter.is_some() {
            speaker.twitter = clean_optional(request.twitter.as_deref());
        }
        if request.linkedin.is_some() {
            speaker.linkedin = clean_optional(request.linkedin.as_deref());
        }
        if request.github.is_some() {
            speaker.github = clean_optional(request.github.as_deref());
        }
        speaker.updated_at = now_rfc3339();
        self.save(&data).await
    }

    async fn delete_speaker(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        data.speakers.retain(|s| s.id != id);
        // Referential cleanup: drop the id from every session's speaker list
        for session in &mut data.sessions {
            session.speaker_ids.retain(|sid| sid != id);
        }
        self.save(&data).await
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        let mut sessions = self.load().await?.sessions;
        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(sessions)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        Ok(self.load().await?.sessions.into_iter().find(|s| s.id == id))
    }

    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let now = now_rfc3339();
        let session = Session {
            id: generate_id(),
            title: request.title.clone(),
            description: request.description.clone(),
            start_time: request.start_time.clone(),
            end_time: request.end_time.clone(),
            track: request.track.clone(),
            speaker_ids: dedup_ids(&request.speaker_ids),
            tags: request.tags.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        data.sessions.push(session.clone());
        self.save(&data).await?;
        Ok(session)
    }

    async fn update_session(
        &self,
        id: &str,
        request: &UpdateSessionRequest,
    ) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let Some(session) = data.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(());
        };
        if let Some(title) = &request.title {
            session.title = title.clone();
        }
        if let Some(description) = &request.description {
            session.description = description.clone();
        }
        if let Some(start_time) = &request.start_time {
            session.start_time = start_time.clone();
        }
        if let Some(end_time) = &request.end_time {
            session.end_time = end_time.clone();
        }
        if let Some(track) = &request.track {
            session.track = track.clone();
        }
        if let Some(speaker_ids) = &request.speaker_ids {
            session.speaker_ids = dedup_ids(speaker_ids);
        }
        if let Some(tags) = &request.tags {
            session.tags = tags.clone();
        }
        session.updated_at = now_rfc3339();
        self.save(&data).await
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        data.sessions.retain(|s| s.id != id);
        self.save(&data).await
    }

    async fn get_event(&self) -> Result<Option<Event>, AppError> {
        Ok(self.load().await?.events.into_iter().next())
    }

    async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let now = now_rfc3339();
        let event = Event {
            id: generate_id(),
            name: request.name.clone(),
            description: request.description.clone(),
            date: request.date.clone(),
            location: request.location.clone(),
            image: request.image.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        // Singleton: replace whatever was there
        data.events = vec![event.clone()];
        self.save(&data).await?;
        Ok(event)
    }

    async fn update_event(&self, id: &str, request: &UpdateEventRequest) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let Some(event) = data.events.iter_mut().find(|e| e.id == id) else {
            return Ok(());
        };
        if let Some(name) = &request.name {
            event.name = name.clone();
        }
        if let Some(description) = &request.description {
            event.description = description.clone();
        }
        if let Some(date) = &request.date {
            event.date = date.clone();
        }
        if let Some(location) = &request.location {
            event.location = location.clone();
        }
        if let Some(image) = &request.image {
            event.image = image.clone();
        }
        event.updated_at = now_rfc3339();
        self.save(&data).await
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>, AppError> {
        let mut reviews = self.load().await?.reviews;
        if let Some(speaker_id) = &filter.speaker_id {
            reviews.retain(|r| r.speaker_id.as_deref() == Some(speaker_id.as_str()));
        }
        if let Some(session_id) = &filter.session_id {
            reviews.retain(|r| r.session_id.as_deref() == Some(session_id.as_str()));
        }
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn create_review(&self, request: &CreateReviewRequest) -> Result<Review, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let review = Review {
            id: generate_id(),
            speaker_id: clean_optional(request.speaker_id.as_deref()),
            session_id: clean_optional(request.session_id.as_deref()),
            user_name: request.user_name.clone(),
            user_email: clean_optional(request.user_email.as_deref()),
            user_avatar: request.user_avatar.clone(),
            rating: request.rating,
            comment: request.comment.clone(),
            date: request.date.clone(),
            created_at: now_rfc3339(),
        };
        data.reviews.push(review.clone());
        if let Some(speaker_id) = review.speaker_id.clone() {
            Self::reaggregate_speaker(&mut data, &speaker_id);
        }
        self.save(&data).await?;
        Ok(review)
    }

    async fn delete_review(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let Some(position) = data.reviews.iter().position(|r| r.id == id) else {
            return Ok(());
        };
        let removed = data.reviews.remove(position);
        if let Some(speaker_id) = removed.speaker_id {
            Self::reaggregate_speaker(&mut data, &speaker_id);
        }
        self.save(&data).await
    }

    async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        Ok(self
            .load()
            .await?
            .admins
            .into_iter()
            .find(|a| a.username == username))
    }

    async fn create_admin(&self, username: &str, password_hash: &str) -> Result<Admin, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        if data.admins.iter().any(|a| a.username == username) {
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
        data.admins.push(admin.clone());
        self.save(&data).await?;
        Ok(admin)
    }

    async fn import(&self, incoming: &Datastore) -> Result<MigrationReport, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let mut report = MigrationReport::default();

        for speaker in &incoming.speakers {
            if !data.speakers.iter().any(|s| s.id == speaker.id) {
                data.speakers.push(speaker.clone());
                report.speakers += 1;
            }
        }
        for session in &incoming.sessions {
            if !data.sessions.iter().any(|s| s.id == session.id) {
                data.sessions.push(session.clone());
                report.sessions += 1;
            }
        }
        // Singleton event: only take one when the store has none
        if data.events.is_empty() {
            if let Some(event) = incoming.events.first() {
                data.events.push(event.clone());
                report.events += 1;
            }
        }
        for review in &incoming.reviews {
            if !data.reviews.iter().any(|r| r.id == review.id) {
                data.reviews.push(review.clone());
                report.reviews += 1;
            }
        }
        for admin in &incoming.admins {
            if !data.admins.iter().any(|a| a.username == admin.username) {
                data.admins.push(admin.clone());
                report.admins += 1;
            }
        }

        self.save(&data).await?;
        Ok(report)
    }
}
