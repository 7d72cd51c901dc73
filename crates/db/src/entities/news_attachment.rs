//! News attachment entity (files stored in the attachment bucket).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news_attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning news post
    pub news_id: String,

    /// Original file name
    pub file_name: String,

    /// Storage key within the bucket
    pub file_path: String,

    /// MIME type
    pub file_type: String,

    /// File size in bytes
    pub file_size: i64,

    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Whether this attachment belongs in the image gallery.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::news::Entity",
        from = "Column::NewsId",
        to = "super::news::Column::Id",
        on_delete = "Cascade"
    )]
    News,
}

impl Related<super::news::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::News.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
