pub mod object_store;
pub mod remote_exec;
pub mod s3_object_store;
pub mod ssh_remote_exec;

pub use object_store::{normalize_object_key, ObjectStoreError, ObjectStoreRepository};
pub use remote_exec::{RemoteExecError, RemoteExecRepository};
pub use s3_object_store::S3ObjectStore;
pub use ssh_remote_exec::SshRemoteExec;
