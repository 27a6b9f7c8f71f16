//! Block storage record codecs

use super::{encode_string_list, record_object, Fields, Record};
use crate::domain::{
    AccessGroup, BlockRange, Disk, DiskType, Initiator, InitiatorType, Pool, RecordKind, System,
    Volume,
};
use crate::error::Result;
use crate::value::Value;

impl Record for System {
    const CLASS: &'static str = "System";
    const KIND: RecordKind = RecordKind::System;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("status", Value::from(self.status)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            name: f.string("name")?,
            status: f.u32("status")?,
        })
    }
}

impl Record for Pool {
    const CLASS: &'static str = "Pool";
    const KIND: RecordKind = RecordKind::Pool;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("total_space", Value::from(self.total_space)),
                ("free_space", Value::from(self.free_space)),
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
            system_id: f.string("system_id")?,
        })
    }
}

impl Record for Volume {
    const CLASS: &'static str = "Volume";
    const KIND: RecordKind = RecordKind::Volume;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("vpd83", Value::from(&self.vpd83)),
                ("block_size", Value::from(self.block_size)),
                ("num_of_blocks", Value::from(self.num_of_blocks)),
                ("status", Value::from(self.status)),
                ("system_id", Value::from(&self.system_id)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            name: f.string("name")?,
            vpd83: f.string("vpd83")?,
            block_size: f.u64("block_size")?,
            num_of_blocks: f.u64("num_of_blocks")?,
            status: f.u32("status")?,
            system_id: f.string("system_id")?,
        })
    }
}

impl Record for Disk {
    const CLASS: &'static str = "Disk";
    const KIND: RecordKind = RecordKind::Disk;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("disk_type", Value::from(self.disk_type.code())),
                ("block_size", Value::from(self.block_size)),
                ("num_of_blocks", Value::from(self.num_of_blocks)),
                ("status", Value::from(self.status)),
                ("system_id", Value::from(&self.system_id)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            name: f.string("name")?,
            disk_type: f.code("disk_type", DiskType::from_code)?,
            block_size: f.u64("block_size")?,
            num_of_blocks: f.u64("num_of_blocks")?,
            status: f.u64("status")?,
            system_id: f.string("system_id")?,
        })
    }
}

impl Record for Initiator {
    const CLASS: &'static str = "Initiator";
    const KIND: RecordKind = RecordKind::Initiator;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("type", Value::from(self.initiator_type.code())),
                ("name", Value::from(&self.name)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            initiator_type: f.code("type", InitiatorType::from_code)?,
            name: f.string("name")?,
        })
    }
}

impl Record for AccessGroup {
    const CLASS: &'static str = "AccessGroup";
    const KIND: RecordKind = RecordKind::AccessGroup;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("id", Value::from(&self.id)),
                ("name", Value::from(&self.name)),
                ("initiators", encode_string_list(Some(self.initiators.as_slice()))),
                ("system_id", Value::from(&self.system_id)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            id: f.string("id")?,
            name: f.string("name")?,
            initiators: f.string_list("initiators")?,
            system_id: f.string("system_id")?,
        })
    }
}

impl Record for BlockRange {
    const CLASS: &'static str = "BlockRange";
    const KIND: RecordKind = RecordKind::BlockRange;

    fn encode(&self) -> Value {
        record_object(
            Self::CLASS,
            [
                ("src_block", Value::from(self.src_block)),
                ("dest_block", Value::from(self.dest_block)),
                ("block_count", Value::from(self.block_count)),
            ],
        )
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        Ok(Self {
            src_block: f.u64("src_block")?,
            dest_block: f.u64("dest_block")?,
            block_count: f.u64("block_count")?,
        })
    }
}
