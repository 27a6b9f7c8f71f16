//! NFS exports

use super::{check, non_empty_id};
use crate::codec::{encode_string_list, Record};
use crate::connection::Connection;
use crate::domain::{NfsExport, NfsExportRequest, RecordKind};
use crate::error::{Error, Result};
use crate::value::Value;

impl Connection {
    pub async fn exports(&self) -> Result<Vec<NfsExport>> {
        self.tracked(self.list("exports", [])).await
    }

    /// Export a file system. At least one host list must be given.
    pub async fn export_fs(&self, request: &NfsExportRequest) -> Result<NfsExport> {
        self.tracked(async {
            non_empty_id(RecordKind::FileSystem, &request.fs_id)?;
            if request.root_list.is_none()
                && request.rw_list.is_none()
                && request.ro_list.is_none()
            {
                return Err(Error::argument(
                    "one of root_list, rw_list or ro_list is required",
                ));
            }
            let value = self
                .rpc(
                    "export_fs",
                    [
                        ("fs_id", Value::from(request.fs_id.as_str())),
                        ("export_path", Value::from(request.export_path.as_deref())),
                        ("root_list", encode_string_list(request.root_list.as_deref())),
                        ("rw_list", encode_string_list(request.rw_list.as_deref())),
                        ("ro_list", encode_string_list(request.ro_list.as_deref())),
                        ("anon_uid", Value::from(request.anon_uid)),
                        ("anon_gid", Value::from(request.anon_gid)),
                        ("auth_type", Value::from(request.auth_type.as_deref())),
                        ("options", Value::from(request.options.as_deref())),
                    ],
                )
                .await?;
            NfsExport::decode(&value)
        })
        .await
    }

    pub async fn export_remove(&self, export: &NfsExport) -> Result<()> {
        self.tracked(async {
            check(export)?;
            self.invoke("export_remove", [("export", export.encode())]).await
        })
        .await
    }
}
