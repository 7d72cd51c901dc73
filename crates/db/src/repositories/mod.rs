//! Repository layer.

mod attachment;
mod contact_message;
mod news;
mod profile;
mod user;

pub use attachment::AttachmentRepository;
pub use contact_message::ContactMessageRepository;
pub use news::NewsRepository;
pub use profile::ProfileRepository;
pub use user::UserRepository;
