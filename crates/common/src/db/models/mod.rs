//! SeaORM entity models

pub mod chunk;

pub use chunk::{
    ActiveModel as ChunkActiveModel, Column as ChunkColumn, Entity as ChunkEntity,
    Model as Chunk,
};
