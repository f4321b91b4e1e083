//! The signed-in user's profile: viewing it, editing it and uploading an avatar.

mod avatar;
mod me;
mod update;

pub use avatar::{AvatarResponse, MAX_AVATAR_SIZE, upload_avatar};
pub use me::{MeResponse, get_me};
pub use update::{ProfileForm, update_me};
