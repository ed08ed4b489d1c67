pub mod env_guard;
pub mod store_dir;
