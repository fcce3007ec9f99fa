mod init;
pub use init::init;

mod list;
pub use list::list;
