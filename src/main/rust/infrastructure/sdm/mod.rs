mod command_client;

pub use command_client::{SdmCommandClient, StaticTokenProvider};
