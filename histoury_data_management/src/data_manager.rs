use std::path::{Path, PathBuf};

use chrono::Utc;
use histoury_lib::{journey::{Journey, JourneyPhoto}, trip::{NewTrip, Trip}, user::{GoogleProfile, User}};
use uuid::Uuid;

use crate::{database::db::HistouryDatabase, media::media_store::{MediaKind, MediaStore}, DataManagerError, DATABASE_FILE, MEDIA_DIR};

/// An image about to be attached to a journey.
pub struct PhotoUpload<'a> {
    pub content_type: &'a str,
    pub extension: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: HistouryDatabase,
    pub(crate) media: MediaStore,
}

/// The public interface for all Histoury data management.
impl DataManager {
    /// Opens (or creates) the database and media directories below `data_dir`.
    pub async fn start(data_dir: &Path) -> Result<Self, DataManagerError> {
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir)
                .map_err(|_| DataManagerError::Database(format!("Failed to create data directory: {:?}", data_dir)))?;
        }

        let database = HistouryDatabase::connect(&data_dir.join(DATABASE_FILE)).await?;
        let media = MediaStore::start(data_dir.join(MEDIA_DIR)).await?;

        Ok(DataManager { database, media })
    }

    /// In-memory database with media kept in `media_dir`.
    pub async fn start_in_memory(media_dir: PathBuf) -> Result<Self, DataManagerError> {
        let database = HistouryDatabase::connect_in_memory().await?;
        let media = MediaStore::start(media_dir).await?;

        Ok(DataManager { database, media })
    }

    /// Creates the user on first login, otherwise refreshes profile details and `last_login`.
    pub async fn upsert_user(&self, profile: &GoogleProfile) -> Result<User, DataManagerError> {
        let now = Utc::now();
        match self.database.get_user_by_email(&profile.email).await? {
            Some(existing) => {
                tracing::info!("Returning user {} logged in", existing.user_id);
                self.database.update_user_login(&existing.user_id, profile, now).await
            }
            None => {
                let user_id = Uuid::new_v4().to_string();
                tracing::info!("Registering new user {}", user_id);
                self.database.insert_user(&user_id, profile, now).await
            }
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, DataManagerError> {
        self.database.get_user(user_id).await
    }

    pub async fn create_trip(&self, user_id: &str, new_trip: NewTrip) -> Result<Trip, DataManagerError> {
        let trip = new_trip.into_trip(Uuid::new_v4().to_string(), user_id.to_string(), Utc::now());
        self.database.insert_trip(&trip).await?;
        tracing::debug!("Created trip {} for user {}", trip.trip_id, user_id);
        Ok(trip)
    }

    /// Newest first.
    pub async fn get_trips(&self, user_id: &str) -> Result<Vec<Trip>, DataManagerError> {
        self.database.get_trips(user_id).await
    }

    pub async fn get_trip(&self, user_id: &str, trip_id: &str) -> Result<Trip, DataManagerError> {
        self.database.get_trip(user_id, trip_id).await
    }

    /// Persists the mutable fields of an already merged trip.
    pub async fn save_trip(&self, trip: &Trip) -> Result<(), DataManagerError> {
        self.database.update_trip(trip).await
    }

    pub async fn delete_trip(&self, user_id: &str, trip_id: &str) -> Result<(), DataManagerError> {
        if self.database.delete_trip(user_id, trip_id).await? {
            Ok(())
        } else {
            Err(DataManagerError::NotFound("Trip not found or does not belong to user".to_string()))
        }
    }

    /// Moves a trip into the journeys table. Either both changes happen or neither does.
    pub async fn complete_trip(&self, user_id: &str, trip_id: &str) -> Result<Journey, DataManagerError> {
        let trip = self.database.get_trip(user_id, trip_id).await?;
        let journey = Journey::from_trip(&trip, Uuid::new_v4().to_string(), Utc::now());

        self.database.move_trip_to_journeys(&trip, &journey).await?;
        tracing::info!("Trip {} completed as journey {}", trip_id, journey.journey_id);

        Ok(journey)
    }

    /// Newest first, photos attached.
    pub async fn get_journeys(&self, user_id: &str) -> Result<Vec<Journey>, DataManagerError> {
        let mut journeys = self.database.get_journeys(user_id).await?;

        for journey in journeys.iter_mut() {
            journey.photos = self.database.get_journey_photos(&journey.journey_id).await?;
        }

        Ok(journeys)
    }

    pub async fn get_journey(&self, user_id: &str, journey_id: &str) -> Result<Journey, DataManagerError> {
        let mut journey = self.database.get_journey(user_id, journey_id).await?;
        journey.photos = self.database.get_journey_photos(journey_id).await?;
        Ok(journey)
    }

    pub async fn delete_journey(&self, user_id: &str, journey_id: &str) -> Result<(), DataManagerError> {
        let journey = self.get_journey(user_id, journey_id).await?;

        if !self.database.delete_journey(user_id, journey_id).await? {
            return Err(DataManagerError::NotFound("Journey not found or does not belong to user".to_string()));
        }

        for photo in journey.photos {
            if let Err(err) = self.media.remove(MediaKind::Photo, &photo.file_name).await {
                tracing::warn!("Failed to remove photo {} of deleted journey: {err:?}", photo.photo_id);
            }
        }

        Ok(())
    }

    pub async fn add_journey_photo(&self, user_id: &str, journey_id: &str, content_type: &str, extension: &str, bytes: &[u8]) -> Result<JourneyPhoto, DataManagerError> {
        // Ownership check
        self.database.get_journey(user_id, journey_id).await?;

        let photo_id = Uuid::new_v4().to_string();
        let file_name = self.media.write(MediaKind::Photo, &format!("{photo_id}.{extension}"), bytes).await?;

        let photo = JourneyPhoto {
            photo_id,
            journey_id: journey_id.to_string(),
            content_type: content_type.to_string(),
            file_name,
            created_at: Utc::now(),
        };

        if let Err(err) = self.database.insert_journey_photo(&photo).await {
            self.media.remove(MediaKind::Photo, &photo.file_name).await?;
            return Err(err);
        }

        Ok(photo)
    }

    /// Attaches all uploads or none: photos stored before a failure are removed again.
    pub async fn add_journey_photos(&self, user_id: &str, journey_id: &str, uploads: &[PhotoUpload<'_>]) -> Result<Vec<JourneyPhoto>, DataManagerError> {
        let mut stored = Vec::with_capacity(uploads.len());

        for upload in uploads {
            match self.add_journey_photo(user_id, journey_id, upload.content_type, upload.extension, upload.bytes).await {
                Ok(photo) => stored.push(photo),
                Err(err) => {
                    for photo in &stored {
                        if let Err(cleanup) = self.remove_journey_photo(photo).await {
                            tracing::warn!("Failed to remove photo {} after a failed upload: {cleanup:?}", photo.photo_id);
                        }
                    }
                    return Err(err);
                }
            }
        }

        Ok(stored)
    }

    async fn remove_journey_photo(&self, photo: &JourneyPhoto) -> Result<(), DataManagerError> {
        self.database.delete_journey_photo(&photo.photo_id).await?;
        self.media.remove(MediaKind::Photo, &photo.file_name).await
    }

    pub async fn get_journey_photo(&self, user_id: &str, journey_id: &str, photo_id: &str) -> Result<(JourneyPhoto, Vec<u8>), DataManagerError> {
        let journey = self.get_journey(user_id, journey_id).await?;
        let photo = journey.photos.into_iter()
            .find(|photo| photo.photo_id == photo_id)
            .ok_or(DataManagerError::NotFound("Photo not found".to_string()))?;

        let bytes = self.media.read(MediaKind::Photo, &photo.file_name).await?;
        Ok((photo, bytes))
    }

    /// Stores an image sent for recognition under a unique name.
    pub async fn store_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, DataManagerError> {
        let original_name = crate::media::media_store::sanitize_file_name(original_name).unwrap_or_else(|| "image".to_string());
        self.media.write(MediaKind::Upload, &format!("{}_{}", Uuid::new_v4().simple(), original_name), bytes).await
    }

    pub async fn store_audio(&self, file_name: &str, bytes: &[u8]) -> Result<String, DataManagerError> {
        self.media.write(MediaKind::Audio, file_name, bytes).await
    }

    pub async fn read_audio(&self, file_name: &str) -> Result<Vec<u8>, DataManagerError> {
        self.media.read(MediaKind::Audio, file_name).await
    }
}
