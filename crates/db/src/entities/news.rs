//! News entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// News post shown on the public news page.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news")]
pub struct Model {
    /// Unique news ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Title in the default language.
    pub title: String,

    /// English title.
    #[sea_orm(nullable)]
    pub title_en: Option<String>,

    /// Body in the default language.
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// English body.
    #[sea_orm(column_type = "Text", nullable)]
    pub content_en: Option<String>,

    /// Short summary for list views.
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// English summary.
    #[sea_orm(column_type = "Text", nullable)]
    pub summary_en: Option<String>,

    /// Cover image URL.
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Whether the post is visible to the public.
    pub published: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::news_attachment::Entity")]
    Attachments,
}

impl Related<super::news_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
