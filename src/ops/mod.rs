//! Operation Façade
//!
//! Public storage operations as methods on [`Connection`]. Every operation
//! follows the same template:
//!
//! 1. validate arguments locally, failing without contacting the plugin
//! 2. encode arguments through the entity codec
//! 3. issue the RPC; mutating calls resolve to a [`Completion`]
//! 4. surface plugin faults unchanged
//!
//! Operations are grouped by area: [`system`], [`pool`], [`volume`],
//! [`access`], [`fs`] and [`nfs`].

pub mod access;
pub mod fs;
pub mod nfs;
pub mod pool;
pub mod system;
pub mod volume;

use crate::codec::{decode_list, Record};
use crate::connection::Connection;
use crate::domain::{
    AccessGroup, Disk, FileSystem, Initiator, NfsExport, Pool, RecordKind, Snapshot, System,
    Volume,
};
use crate::error::{Error, Result};
use crate::job::{Completion, JobOutput};
use crate::value::Value;

/// Records that carry a plugin-assigned identifier
pub(crate) trait Identified: Record {
    fn record_id(&self) -> &str;
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn record_id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

identified!(System, Pool, Volume, Disk, Initiator, AccessGroup, FileSystem, Snapshot, NfsExport);

/// Reject records that could not have come from a plugin
pub(crate) fn check<R: Identified>(record: &R) -> Result<()> {
    if record.record_id().is_empty() {
        return Err(Error::invalid(R::KIND, "identifier must not be empty"));
    }
    Ok(())
}

/// Reject an empty string argument
pub(crate) fn non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::argument(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Reject an empty identifier of the given record kind
pub(crate) fn non_empty_id(kind: RecordKind, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(kind, "identifier must not be empty"));
    }
    Ok(())
}

impl Connection {
    /// Call `method` and decode an array of records
    pub(crate) async fn list<R: Record, const N: usize>(
        &self,
        method: &str,
        params: [(&str, Value); N],
    ) -> Result<Vec<R>> {
        let value = self.rpc(method, params).await?;
        decode_list(&value)
    }

    /// Call a potentially asynchronous `method`
    pub(crate) async fn mutate<T: JobOutput, const N: usize>(
        &self,
        method: &str,
        params: [(&str, Value); N],
    ) -> Result<Completion<T>> {
        let value = self.rpc(method, params).await?;
        self.completion(method, value)
    }

    /// Call a synchronous `method` whose result carries no data
    pub(crate) async fn invoke<const N: usize>(
        &self,
        method: &str,
        params: [(&str, Value); N],
    ) -> Result<()> {
        self.rpc(method, params).await.map(|_| ())
    }

    /// Call `method` and read a boolean answer
    pub(crate) async fn ask<const N: usize>(
        &self,
        method: &str,
        params: [(&str, Value); N],
    ) -> Result<bool> {
        let value = self.rpc(method, params).await?;
        value
            .as_bool()
            .map_err(|e| Error::Serialization(format!("{}: {}", method, e)))
    }
}
