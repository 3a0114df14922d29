pub mod daemon;
pub mod health;
pub mod init;
pub mod input;
pub mod key;
pub mod open;
pub mod receive;
pub mod seal;
pub mod send;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use key::Key;
pub use open::Open;
pub use receive::Receive;
pub use seal::Seal;
pub use send::SendMessage;
pub use version::Version;
