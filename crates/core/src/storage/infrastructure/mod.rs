pub mod local_blob_store;
pub mod memory_blob_store;
