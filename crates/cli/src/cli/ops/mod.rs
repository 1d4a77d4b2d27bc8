pub mod init;
pub mod sign;
pub mod sign_all;
pub mod verify;
pub mod version;

pub use init::Init;
pub use sign::Sign;
pub use sign_all::SignAll;
pub use verify::Verify;
pub use version::Version;
