pub const USERS_TABLE_NAME: &str = "Users";
pub const USER_ID: &str = "user_id";
pub const GOOGLE_ID: &str = "google_id";
pub const EMAIL: &str = "email";
pub const DISPLAY_NAME: &str = "display_name";
pub const PROFILE_PICTURE_URL: &str = "profile_picture_url";
pub const LAST_LOGIN: &str = "last_login";

pub const TRIPS_TABLE_NAME: &str = "Trips";
pub const TRIP_ID: &str = "trip_id";
pub const LAT: &str = "lat";
pub const LNG: &str = "lng";
pub const DESCRIPTION: &str = "description";
pub const PLACE_NAME: &str = "place_name";
pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

pub const JOURNEYS_TABLE_NAME: &str = "Journeys";
pub const JOURNEY_ID: &str = "journey_id";

pub const JOURNEY_PHOTOS_TABLE_NAME: &str = "JourneyPhotos";
pub const PHOTO_ID: &str = "photo_id";
pub const CONTENT_TYPE: &str = "content_type";
pub const FILE_NAME: &str = "file_name";
