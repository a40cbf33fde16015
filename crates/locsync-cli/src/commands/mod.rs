pub mod init;
pub mod schema;
pub mod status;
pub mod sync;
