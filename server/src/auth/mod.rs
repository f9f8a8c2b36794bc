mod extractor;
pub mod google;
pub mod oauth_state;
pub mod token;

pub use extractor::CurrentUser;
