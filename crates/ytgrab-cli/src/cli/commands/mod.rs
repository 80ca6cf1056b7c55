//! CLI command handlers, one file per command.

mod checksum;
mod fetch;
mod formats;
mod progress;
mod ytdl;

pub use checksum::run_checksum;
pub use fetch::{run_fetch, FetchArgs};
pub use formats::run_formats;
pub use ytdl::run_ytdl;
