//! Chunk entity: one classified passage of source text
//!
//! The primary key is content-derived (`{stem}_{timestamp}_{offset}_{hash8}`),
//! assigned by the content store at ingest time.

use crate::models::{ChunkMetadata, ContentType, Difficulty};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Class (grade) level, 5-10
    pub class_num: i32,

    #[sea_orm(column_type = "Text")]
    pub subject: String,

    #[sea_orm(column_type = "Text")]
    pub chapter: String,

    #[sea_orm(column_type = "Text")]
    pub topic: String,

    /// Stored as its lowercase string form (definition, formula, ...)
    #[sea_orm(column_type = "Text")]
    pub content_type: String,

    /// Stored as its lowercase string form (easy, medium, hard)
    #[sea_orm(column_type = "Text")]
    pub difficulty: String,

    /// Empty for synthetic/seed rows; such rows never reach generation
    #[sea_orm(column_type = "Text")]
    pub source_file: String,

    pub page: i32,

    pub paragraph_index: i32,

    /// pgvector embedding stored as text for SeaORM compatibility;
    /// vector operations go through raw SQL with ::vector casts
    #[sea_orm(column_type = "Text", nullable)]
    pub embedding: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Classification metadata view of this row. Unrecognized stored
    /// labels fall back to the enum defaults.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            class_num: self.class_num,
            subject: self.subject.clone(),
            chapter: self.chapter.clone(),
            topic: self.topic.clone(),
            content_type: self.content_type.parse::<ContentType>().unwrap_or_default(),
            difficulty: self.difficulty.parse::<Difficulty>().unwrap_or_default(),
            source_file: self.source_file.clone(),
            page: self.page,
            paragraph_index: self.paragraph_index,
        }
    }
}
