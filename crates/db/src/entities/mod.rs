//! Database entities.

pub mod contact_message;
pub mod news;
pub mod news_attachment;
pub mod profile;
pub mod user;

pub use contact_message::Entity as ContactMessage;
pub use news::Entity as News;
pub use news_attachment::Entity as NewsAttachment;
pub use profile::Entity as Profile;
pub use user::Entity as User;
