mod message_type;
pub use message_type::*;

pub mod messages;
pub use messages::*;

pub mod prompt;
pub use prompt::*;

mod builder_error;
pub use builder_error::*;

mod tool_call;
pub use tool_call::*;

mod with_usage;
pub use with_usage::*;

mod token_usage;
pub use token_usage::*;

pub mod asset;
pub use asset::*;

pub mod flow;
pub use flow::*;

pub mod threat;
pub use threat::*;

pub mod gap;
pub use gap::*;

pub mod job;
pub use job::*;

pub mod merge;
pub use merge::*;

pub mod upload;
pub use upload::*;
