//! File storage record codecs

use super::{encode_string_list, record_object, Fields, Record};
use crate::domain::{FileSystem, NfsExport, RecordKind, Snapshot};
use crate::error::Result;
use crate::value::Value;

impl Record for FileSystem {
    const CLASS: &'static str = "FileSystem";
    const KIND: RecordKind = RecordKind::FileSystem;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("total_space", Value::from(self.total_space)),
                ("free_space", Value::from(self.free_space)),
                ("pool_id", Value::from(&self.pool_id)),
                ("system_id", Value::from(&self.system_id)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            name: f.string("name")?,
            total_space: f.u64("total_space")?,
            free_space: f.u64("free_space")?,
            pool_id: f.string("pool_id")?,
            system_id: f.string("system_id")?,
        })
    }
}

impl Record for Snapshot {
    const CLASS: &'static str = "Snapshot";
    const KIND: RecordKind = RecordKind::Snapshot;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("ts", Value::from(self.ts)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            name: f.string("name")?,
            ts: f.u64("ts")?,
        })
    }
}

impl Record for NfsExport {
    const CLASS: &'static str = "NfsExport";
    const KIND: RecordKind = RecordKind::NfsExport;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("fs_id", Value::from(&self.fs_id)),
                ("export_path", Value::from(self.export_path.as_deref())),
                ("auth", Value::from(self.auth.as_deref())),
                ("root", encode_string_list(Some(self.root.as_slice()))),
                ("rw", encode_string_list(Some(self.rw.as_slice()))),
                ("ro", encode_string_list(Some(self.ro.as_slice()))),
                ("anonuid", Value::from(self.anonuid)),
                ("anongid", Value::from(self.anongid)),
                ("options", Value::from(self.options.as_deref())),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            fs_id: f.string("fs_id")?,
            export_path: f.opt_string("export_path")?,
            auth: f.opt_string("auth")?,
            root: f.string_list("root")?,
            rw: f.string_list("rw")?,
            ro: f.string_list("ro")?,
            anonuid: f.u64("anonuid")?,
            anongid: f.u64("anongid")?,
            options: f.opt_string("options")?,
        })
    }
}
