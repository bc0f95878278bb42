use serde::{Deserialize, Serialize};

/// Represents a user as exchanged with the user service.
///
/// Passwords never travel in this type; see [`NewUser`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// The unique identifier for the user.
    pub id: String,
    pub name: String,
    pub surname: String,
    /// The user's email address, also the login.
    pub mail: String,
    pub about: String,
    /// Where the avatar is served from.
    pub img_url: String,
}

/// The data needed to register a user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub mail: String,
    pub password: String,
    #[serde(default)]
    pub about: String,
}
