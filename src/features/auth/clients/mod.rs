mod google_auth_client;

pub use google_auth_client::{GoogleAuthClient, GoogleUserInfo};
