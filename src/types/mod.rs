pub mod download_target;
