pub mod hash;
pub mod restore;
pub mod show;
