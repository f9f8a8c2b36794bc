use std::{path::Path, str::FromStr};

use chrono::{DateTime, Utc};
use const_format::concatcp;
use histoury_lib::{journey::{Journey, JourneyPhoto}, trip::Trip, user::{GoogleProfile, User}};
use sqlx::{query, query_as, sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Executor, Pool, Sqlite, SqlitePool};

use crate::DataManagerError;

use super::constants::*;

const TRIP_COLUMNS: &str = concatcp!(
    TRIP_ID, ", ", USER_ID, ", ", LAT, ", ", LNG, ", ", DESCRIPTION, ", ", PLACE_NAME, ", ",
    START_DATE, ", ", END_DATE, ", ", CREATED_AT, ", ", UPDATED_AT
);

const JOURNEY_COLUMNS: &str = concatcp!(
    JOURNEY_ID, ", ", USER_ID, ", ", LAT, ", ", LNG, ", ", DESCRIPTION, ", ", PLACE_NAME, ", ",
    START_DATE, ", ", END_DATE, ", ", CREATED_AT
);

const PHOTO_COLUMNS: &str = concatcp!(PHOTO_ID, ", ", JOURNEY_ID, ", ", CONTENT_TYPE, ", ", FILE_NAME, ", ", CREATED_AT);

#[derive(Clone)]
pub struct HistouryDatabase {
    pool: Pool<Sqlite>,
}

impl HistouryDatabase {
    pub async fn connect(path: &Path) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await
            .map_err(|err| DataManagerError::Database(format!("Failed to connect to database {:?}: {err}", path)))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// A private database living as long as the pool. Used by tests.
    pub async fn connect_in_memory() -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|err| DataManagerError::Database(format!("Invalid in-memory options: {err}")))?
            .foreign_keys(true);

        // Every connection would otherwise open its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options).await
            .map_err(|err| DataManagerError::Database(format!("Failed to open in-memory database: {err}")))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    pub async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", USERS_TABLE_NAME, "(",
                USER_ID,             " TEXT PRIMARY KEY,",
                GOOGLE_ID,           " TEXT NOT NULL,",
                EMAIL,               " TEXT NOT NULL UNIQUE,",
                DISPLAY_NAME,        " TEXT NOT NULL,",
                PROFILE_PICTURE_URL, " TEXT NOT NULL,",
                CREATED_AT,          " TIMESTAMP NOT NULL,",
                LAST_LOGIN,          " TIMESTAMP NOT NULL);

            CREATE TABLE IF NOT EXISTS ", TRIPS_TABLE_NAME, "(",
                TRIP_ID,     " TEXT PRIMARY KEY,",
                USER_ID,     " TEXT NOT NULL,",
                LAT,         " REAL NOT NULL,",
                LNG,         " REAL NOT NULL,",
                DESCRIPTION, " TEXT NOT NULL,",
                PLACE_NAME,  " TEXT NOT NULL,",
                START_DATE,  " TIMESTAMP NOT NULL,",
                END_DATE,    " TIMESTAMP,",
                CREATED_AT,  " TIMESTAMP NOT NULL,",
                UPDATED_AT,  " TIMESTAMP,
                FOREIGN KEY(", USER_ID, ") REFERENCES ", USERS_TABLE_NAME, "(", USER_ID, ") ON DELETE CASCADE);

            CREATE TABLE IF NOT EXISTS ", JOURNEYS_TABLE_NAME, "(",
                JOURNEY_ID,  " TEXT PRIMARY KEY,",
                USER_ID,     " TEXT NOT NULL,",
                LAT,         " REAL NOT NULL,",
                LNG,         " REAL NOT NULL,",
                DESCRIPTION, " TEXT NOT NULL,",
                PLACE_NAME,  " TEXT NOT NULL,",
                START_DATE,  " TIMESTAMP NOT NULL,",
                END_DATE,    " TIMESTAMP,",
                CREATED_AT,  " TIMESTAMP NOT NULL,
                FOREIGN KEY(", USER_ID, ") REFERENCES ", USERS_TABLE_NAME, "(", USER_ID, ") ON DELETE CASCADE);

            CREATE TABLE IF NOT EXISTS ", JOURNEY_PHOTOS_TABLE_NAME, "(",
                PHOTO_ID,     " TEXT PRIMARY KEY,",
                JOURNEY_ID,   " TEXT NOT NULL,",
                CONTENT_TYPE, " TEXT NOT NULL,",
                FILE_NAME,    " TEXT NOT NULL,",
                CREATED_AT,   " TIMESTAMP NOT NULL,
                FOREIGN KEY(", JOURNEY_ID, ") REFERENCES ", JOURNEYS_TABLE_NAME, "(", JOURNEY_ID, ") ON DELETE CASCADE
            )")).await
            .map_err(|err| DataManagerError::Database(format!("Failed to create tables: {err}")))
            .map(|_| ())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DataManagerError> {
        query_as::<_, User>(concatcp!("SELECT * FROM ", USERS_TABLE_NAME, " WHERE ", EMAIL, " = ?1"))
            .bind(email)
            .fetch_optional(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get user by email: {err}")))
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, DataManagerError> {
        query_as::<_, User>(concatcp!("SELECT * FROM ", USERS_TABLE_NAME, " WHERE ", USER_ID, " = ?1"))
            .bind(user_id)
            .fetch_optional(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get user: {err}")))?
            .ok_or(DataManagerError::NotFound("User not found".to_string()))
    }

    pub async fn insert_user(&self, user_id: &str, profile: &GoogleProfile, now: DateTime<Utc>) -> Result<User, DataManagerError> {
        query_as::<_, User>(concatcp!("
            INSERT INTO ", USERS_TABLE_NAME, "(",
            USER_ID, ", ", GOOGLE_ID, ", ", EMAIL, ", ", DISPLAY_NAME, ", ", PROFILE_PICTURE_URL, ", ", CREATED_AT, ", ", LAST_LOGIN, ")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING *"))
                .bind(user_id)
                .bind(&profile.google_id)
                .bind(&profile.email)
                .bind(&profile.display_name)
                .bind(&profile.profile_picture_url)
                .bind(now)
                .fetch_one(&self.pool).await
                .map_err(|err| DataManagerError::Database(format!("Failed to insert user: {err}")))
    }

    pub async fn update_user_login(&self, user_id: &str, profile: &GoogleProfile, now: DateTime<Utc>) -> Result<User, DataManagerError> {
        query_as::<_, User>(concatcp!("
            UPDATE ", USERS_TABLE_NAME, " SET ",
            GOOGLE_ID, " = ?1, ", DISPLAY_NAME, " = ?2, ", PROFILE_PICTURE_URL, " = ?3, ", LAST_LOGIN, " = ?4
            WHERE ", USER_ID, " = ?5 RETURNING *"))
                .bind(&profile.google_id)
                .bind(&profile.display_name)
                .bind(&profile.profile_picture_url)
                .bind(now)
                .bind(user_id)
                .fetch_one(&self.pool).await
                .map_err(|err| DataManagerError::Database(format!("Failed to update user: {err}")))
    }

    pub async fn insert_trip(&self, trip: &Trip) -> Result<(), DataManagerError> {
        query(concatcp!("INSERT INTO ", TRIPS_TABLE_NAME, "(", TRIP_COLUMNS, ") VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"))
            .bind(&trip.trip_id)
            .bind(&trip.user_id)
            .bind(trip.lat)
            .bind(trip.lng)
            .bind(&trip.description)
            .bind(&trip.place_name)
            .bind(trip.start_date)
            .bind(trip.end_date)
            .bind(trip.created_at)
            .bind(trip.updated_at)
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to insert trip: {err}")))
            .map(|_| ())
    }

    pub async fn get_trips(&self, user_id: &str) -> Result<Vec<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!(
            "SELECT ", TRIP_COLUMNS, " FROM ", TRIPS_TABLE_NAME,
            " WHERE ", USER_ID, " = ?1 ORDER BY ", CREATED_AT, " DESC, rowid DESC"))
            .bind(user_id)
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get trips: {err}")))
    }

    /// Only finds trips owned by `user_id`.
    pub async fn get_trip(&self, user_id: &str, trip_id: &str) -> Result<Trip, DataManagerError> {
        query_as::<_, Trip>(concatcp!(
            "SELECT ", TRIP_COLUMNS, " FROM ", TRIPS_TABLE_NAME,
            " WHERE ", TRIP_ID, " = ?1 AND ", USER_ID, " = ?2"))
            .bind(trip_id)
            .bind(user_id)
            .fetch_optional(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get trip: {err}")))?
            .ok_or(DataManagerError::NotFound("Trip not found or does not belong to user".to_string()))
    }

    pub async fn update_trip(&self, trip: &Trip) -> Result<(), DataManagerError> {
        query(concatcp!("
            UPDATE ", TRIPS_TABLE_NAME, " SET ",
            DESCRIPTION, " = ?1, ", PLACE_NAME, " = ?2, ", START_DATE, " = ?3, ", END_DATE, " = ?4, ", UPDATED_AT, " = ?5
            WHERE ", TRIP_ID, " = ?6 AND ", USER_ID, " = ?7"))
                .bind(&trip.description)
                .bind(&trip.place_name)
                .bind(trip.start_date)
                .bind(trip.end_date)
                .bind(trip.updated_at)
                .bind(&trip.trip_id)
                .bind(&trip.user_id)
                .execute(&self.pool).await
                .map_err(|err| DataManagerError::Database(format!("Failed to update trip: {err}")))
                .map(|_| ())
    }

    /// Returns whether a trip was deleted.
    pub async fn delete_trip(&self, user_id: &str, trip_id: &str) -> Result<bool, DataManagerError> {
        query(concatcp!("DELETE FROM ", TRIPS_TABLE_NAME, " WHERE ", TRIP_ID, " = ?1 AND ", USER_ID, " = ?2"))
            .bind(trip_id)
            .bind(user_id)
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to delete trip: {err}")))
            .map(|result| result.rows_affected() > 0)
    }

    /// Inserts the journey and removes the trip it came from in one transaction.
    pub async fn move_trip_to_journeys(&self, trip: &Trip, journey: &Journey) -> Result<(), DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|err| DataManagerError::Database(format!("Failed to begin transaction: {err}")))?;

        query(concatcp!("INSERT INTO ", JOURNEYS_TABLE_NAME, "(", JOURNEY_COLUMNS, ") VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"))
            .bind(&journey.journey_id)
            .bind(&journey.user_id)
            .bind(journey.lat)
            .bind(journey.lng)
            .bind(&journey.description)
            .bind(&journey.place_name)
            .bind(journey.start_date)
            .bind(journey.end_date)
            .bind(journey.created_at)
            .execute(&mut *tx).await
            .map_err(|err| DataManagerError::Database(format!("Failed to create journey record: {err}")))?;

        let deleted = query(concatcp!("DELETE FROM ", TRIPS_TABLE_NAME, " WHERE ", TRIP_ID, " = ?1 AND ", USER_ID, " = ?2"))
            .bind(&trip.trip_id)
            .bind(&trip.user_id)
            .execute(&mut *tx).await
            .map_err(|err| DataManagerError::Database(format!("Failed to delete completed trip: {err}")))?
            .rows_affected();

        if deleted == 0 {
            // Dropping the transaction rolls back the journey insert
            return Err(DataManagerError::NotFound("Trip not found or does not belong to user".to_string()));
        }

        tx.commit().await
            .map_err(|err| DataManagerError::Database(format!("Failed to commit trip completion: {err}")))
    }

    pub async fn get_journeys(&self, user_id: &str) -> Result<Vec<Journey>, DataManagerError> {
        query_as::<_, Journey>(concatcp!(
            "SELECT ", JOURNEY_COLUMNS, " FROM ", JOURNEYS_TABLE_NAME,
            " WHERE ", USER_ID, " = ?1 ORDER BY ", CREATED_AT, " DESC, rowid DESC"))
            .bind(user_id)
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get journeys: {err}")))
    }

    pub async fn get_journey(&self, user_id: &str, journey_id: &str) -> Result<Journey, DataManagerError> {
        query_as::<_, Journey>(concatcp!(
            "SELECT ", JOURNEY_COLUMNS, " FROM ", JOURNEYS_TABLE_NAME,
            " WHERE ", JOURNEY_ID, " = ?1 AND ", USER_ID, " = ?2"))
            .bind(journey_id)
            .bind(user_id)
            .fetch_optional(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get journey: {err}")))?
            .ok_or(DataManagerError::NotFound("Journey not found or does not belong to user".to_string()))
    }

    pub async fn delete_journey(&self, user_id: &str, journey_id: &str) -> Result<bool, DataManagerError> {
        query(concatcp!("DELETE FROM ", JOURNEYS_TABLE_NAME, " WHERE ", JOURNEY_ID, " = ?1 AND ", USER_ID, " = ?2"))
            .bind(journey_id)
            .bind(user_id)
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to delete journey: {err}")))
            .map(|result| result.rows_affected() > 0)
    }

    pub async fn insert_journey_photo(&self, photo: &JourneyPhoto) -> Result<(), DataManagerError> {
        query(concatcp!("INSERT INTO ", JOURNEY_PHOTOS_TABLE_NAME, "(", PHOTO_COLUMNS, ") VALUES (?1, ?2, ?3, ?4, ?5)"))
            .bind(&photo.photo_id)
            .bind(&photo.journey_id)
            .bind(&photo.content_type)
            .bind(&photo.file_name)
            .bind(photo.created_at)
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to insert journey photo: {err}")))
            .map(|_| ())
    }

    pub async fn delete_journey_photo(&self, photo_id: &str) -> Result<(), DataManagerError> {
        query(concatcp!("DELETE FROM ", JOURNEY_PHOTOS_TABLE_NAME, " WHERE ", PHOTO_ID, " = ?1"))
            .bind(photo_id)
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to delete journey photo: {err}")))
            .map(|_| ())
    }

    pub async fn get_journey_photos(&self, journey_id: &str) -> Result<Vec<JourneyPhoto>, DataManagerError> {
        query_as::<_, JourneyPhoto>(concatcp!(
            "SELECT ", PHOTO_COLUMNS, " FROM ", JOURNEY_PHOTOS_TABLE_NAME,
            " WHERE ", JOURNEY_ID, " = ?1 ORDER BY ", CREATED_AT, " ASC, rowid ASC"))
            .bind(journey_id)
            .fetch_all(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to get journey photos: {err}")))
    }
}
