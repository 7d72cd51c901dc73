//! Business logic services.

#![allow(missing_docs)]

pub mod attachment;
pub mod auth;
pub mod contact;
pub mod i18n;
pub mod news;
pub mod site;

pub use attachment::{AttachmentList, AttachmentService, AttachmentView, UploadFile, format_file_size};
pub use auth::{AuthService, Credentials, Session, SignedIn};
pub use contact::{ContactService, SubmitContactInput};
pub use i18n::{Language, Translator};
pub use news::{CreateNewsInput, LocalizedNews, NewsService, UpdateNewsInput, localize};
pub use site::{Page, PageView, SitemapEntry};
