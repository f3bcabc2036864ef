pub mod init;
pub mod install;
pub mod list;
pub mod restore;
pub mod search;
pub mod uninstall;
pub mod update;
