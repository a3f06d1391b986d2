//! Data Transfer Objects
//!
//! Request DTOs for the write operations and the reports returned by
//! sweeps and cascades.

pub mod request;
pub mod response;

pub use request::{
    CreateArticleDto, CreateChannelDto, CreateCommentDto, CreateGroupDto, CreatePostDto,
    SendMessageDto, UpdateArticleDto, UpdateGroupDto,
};
pub use response::{CascadeReport, KindReport, SweepReport, SyncOutcome};
