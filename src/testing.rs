//! In-process plugin used by the test suite
//!
//! Serves the plugin wire protocol on a real Unix socket inside a temporary
//! IPC directory and keeps a small in-memory array: one system, a couple of
//! pools, a volume, disks, an initiator and a file system. Tests can inject
//! faults, canned replies, dropped connections and asynchronous jobs.

use crate::codec::{decode_string_list, encode_list, Record};
use crate::config::{ClientConfig, JobPollConfig};
use crate::connection::Connector;
use crate::domain::{
    AccessGroup, Disk, DiskType, FileSystem, Initiator, InitiatorType, NfsExport, Pool,
    StorageCapabilities, Snapshot, System, Volume,
};
use crate::transport::FrameCodec;
use crate::value::Value;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

const BLOCK: u64 = 512;
const GIB: u64 = 1 << 30;

const NO_SUPPORT: i32 = 153;
const NOT_FOUND: i32 = 202;
const BAD_REQUEST: i32 = 101;

/// Methods whose results may be delivered through a job
const JOB_METHODS: &[&str] = &[
    "pool_create",
    "pool_create_from_disks",
    "pool_create_from_volumes",
    "pool_create_from_pool",
    "pool_delete",
    "volume_create",
    "volume_resize",
    "volume_replicate",
    "volume_replicate_range",
    "volume_delete",
    "volume_child_dependency_rm",
    "fs_create",
    "fs_delete",
    "fs_resize",
    "fs_clone",
    "file_clone",
    "fs_child_dependency_rm",
    "fs_snapshot_create",
    "fs_snapshot_delete",
    "fs_snapshot_revert",
];

type Fault = (i32, String);
type Reply = std::result::Result<Value, Fault>;

fn not_found(what: &str, id: &str) -> Fault {
    (NOT_FOUND, format!("{} {} not found", what, id))
}

fn param<'a>(params: &'a Value, key: &str) -> std::result::Result<&'a Value, Fault> {
    params
        .get(key)
        .ok()
        .flatten()
        .ok_or_else(|| (BAD_REQUEST, format!("missing parameter {:?}", key)))
}

fn record<R: Record>(params: &Value, key: &str) -> std::result::Result<R, Fault> {
    R::decode(param(params, key)?).map_err(|e| (BAD_REQUEST, e.to_string()))
}

fn text(params: &Value, key: &str) -> std::result::Result<String, Fault> {
    param(params, key)?
        .as_str()
        .map(str::to_string)
        .map_err(|e| (BAD_REQUEST, e.to_string()))
}

fn number(params: &Value, key: &str) -> std::result::Result<u64, Fault> {
    param(params, key)?
        .as_u64()
        .map_err(|e| (BAD_REQUEST, e.to_string()))
}

fn strings(params: &Value, key: &str) -> std::result::Result<Vec<String>, Fault> {
    decode_string_list(param(params, key)?).map_err(|e| (BAD_REQUEST, e.to_string()))
}

// =============================================================================
// Simulated Array
// =============================================================================

struct SimJob {
    polls: u32,
    result: Value,
}

struct SimFault {
    code: i32,
    message: String,
    domain: Option<i32>,
    level: Option<i32>,
}

enum Action {
    Reply(Reply),
    Raise(SimFault),
    HangUp,
}

struct SimState {
    calls: HashMap<String, usize>,
    last_params: HashMap<String, Value>,
    failures: HashMap<String, (Fault, Option<(i32, i32)>)>,
    hang_ups: HashSet<String>,
    canned: HashMap<String, Value>,
    async_jobs: bool,
    fail_jobs: bool,
    jobs: HashMap<String, SimJob>,
    next_id: u64,
    timeout_ms: u64,

    systems: Vec<System>,
    pools: Vec<Pool>,
    volumes: Vec<Volume>,
    disks: Vec<Disk>,
    initiators: Vec<Initiator>,
    groups: Vec<AccessGroup>,
    group_grants: Vec<(String, String)>,
    initiator_grants: Vec<(Initiator, String)>,
    volume_deps: HashSet<String>,
    filesystems: Vec<FileSystem>,
    snapshots: HashMap<String, Vec<Snapshot>>,
    exports: Vec<NfsExport>,
}

impl SimState {
    fn new() -> Self {
        let system = System {
            id: "SYS-1".into(),
            name: "Simulated array".into(),
            status: System::STATUS_OK,
        };
        let pool = |id: &str, name: &str, total: u64| Pool {
            id: id.into(),
            name: name.into(),
            total_space: total,
            free_space: total / 2,
            system_id: system.id.clone(),
        };
        let disks = (1..=4)
            .map(|n| Disk {
                id: format!("DISK-{}", n),
                name: format!("Simulated SAS disk {}", n),
                disk_type: DiskType::Sas,
                block_size: BLOCK,
                num_of_blocks: 1_953_525_168,
                status: 1,
                system_id: system.id.clone(),
            })
            .collect();

        Self {
            calls: HashMap::new(),
            last_params: HashMap::new(),
            failures: HashMap::new(),
            hang_ups: HashSet::new(),
            canned: HashMap::new(),
            async_jobs: false,
            fail_jobs: false,
            jobs: HashMap::new(),
            next_id: 1,
            timeout_ms: 30_000,

            pools: vec![pool("POOL-1", "pool-a", 4096 * GIB), pool("POOL-2", "pool-b", 1024 * GIB)],
            volumes: vec![Volume {
                id: "VOL-1".into(),
                name: "vol-1".into(),
                vpd83: "600a0b800026b25a00000c4c4f2e1d1a".into(),
                block_size: BLOCK,
                num_of_blocks: 2 * GIB / BLOCK,
                status: Volume::STATUS_OK,
                system_id: system.id.clone(),
            }],
            disks,
            initiators: vec![Initiator {
                id: "iqn.1994-05.com.example:host01".into(),
                initiator_type: InitiatorType::Iscsi,
                name: "host01".into(),
            }],
            groups: Vec::new(),
            group_grants: Vec::new(),
            initiator_grants: Vec::new(),
            volume_deps: HashSet::new(),
            filesystems: vec![FileSystem {
                id: "FS-1".into(),
                name: "fs-a".into(),
                total_space: 100 * GIB,
                free_space: 50 * GIB,
                pool_id: "POOL-1".into(),
                system_id: system.id.clone(),
            }],
            snapshots: HashMap::new(),
            exports: Vec::new(),
            systems: vec![system],
        }
    }

    fn next(&mut self, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    fn handle(&mut self, method: &str, params: &Value) -> Action {
        *self.calls.entry(method.to_string()).or_default() += 1;
        self.last_params.insert(method.to_string(), params.clone());

        if self.hang_ups.contains(method) {
            return Action::HangUp;
        }
        if let Some(((code, message), origin)) = self.failures.get(method) {
            return Action::Raise(SimFault {
                code: *code,
                message: message.clone(),
                domain: origin.map(|(d, _)| d),
                level: origin.map(|(_, l)| l),
            });
        }
        if let Some(value) = self.canned.get(method) {
            return Action::Reply(Ok(value.clone()));
        }

        let reply = self.dispatch(method, params);
        match reply {
            Ok(result) if self.async_jobs && JOB_METHODS.contains(&method) => {
                let id = self.next("JOB");
                self.jobs.insert(id.clone(), SimJob { polls: 0, result });
                Action::Reply(Ok(Value::from(id)))
            }
            other => Action::Reply(other),
        }
    }

    fn dispatch(&mut self, method: &str, params: &Value) -> Reply {
        match method {
            "plugin_register" | "shutdown" | "iscsi_chap_auth" | "file_clone"
            | "volume_replicate_range" | "fs_child_dependency_rm" => Ok(Value::Null),
            "plugin_info" => Ok(Value::from(vec![
                "Simulated storage plugin".to_string(),
                crate::VERSION.to_string(),
            ])),
            "time_out_set" => {
                self.timeout_ms = number(params, "ms")?;
                Ok(Value::Null)
            }
            "time_out_get" => Ok(Value::from(self.timeout_ms)),
            "job_status" => self.job_status(params),
            "job_free" => {
                let id = text(params, "job_id")?;
                self.jobs
                    .remove(&id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found("job", &id))
            }

            "systems" => Ok(encode_list(&self.systems)),
            "capabilities" => {
                let system: System = record(params, "system")?;
                if !self.systems.iter().any(|s| s.id == system.id) {
                    return Err(not_found("system", &system.id));
                }
                let mut caps = StorageCapabilities::new();
                caps.enable_all();
                Ok(caps.encode())
            }
            "disks" => Ok(encode_list(&self.disks)),
            "initiators" => Ok(encode_list(&self.initiators)),

            "pools" => Ok(encode_list(&self.pools)),
            "pool_create" | "pool_create_from_pool" => {
                let size = number(params, "size_bytes")?;
                self.add_pool(params, size)
            }
            "pool_create_from_disks" => {
                let disks = crate::codec::decode_list::<Disk>(param(params, "disks")?)
                    .map_err(|e| (BAD_REQUEST, e.to_string()))?;
                let size = disks.iter().map(Disk::size_bytes).sum();
                self.add_pool(params, size)
            }
            "pool_create_from_volumes" => {
                let volumes = crate::codec::decode_list::<Volume>(param(params, "volumes")?)
                    .map_err(|e| (BAD_REQUEST, e.to_string()))?;
                let size = volumes.iter().map(Volume::size_bytes).sum();
                self.add_pool(params, size)
            }
            "pool_delete" => {
                let pool: Pool = record(params, "pool")?;
                remove_by(&mut self.pools, |p| p.id == pool.id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found("pool", &pool.id))
            }

            "volumes" => Ok(encode_list(&self.volumes)),
            "volume_create" => {
                let pool: Pool = record(params, "pool")?;
                let volume = Volume {
                    id: self.next("VOL"),
                    name: text(params, "volume_name")?,
                    vpd83: format!("600a0b80{:024x}", self.next_id),
                    block_size: BLOCK,
                    num_of_blocks: number(params, "size_bytes")?.div_ceil(BLOCK),
                    status: Volume::STATUS_OK,
                    system_id: pool.system_id,
                };
                self.volumes.push(volume.clone());
                Ok(volume.encode())
            }
            "volume_resize" => {
                let target: Volume = record(params, "volume")?;
                let size = number(params, "new_size_bytes")?;
                let volume = self
                    .volumes
                    .iter_mut()
                    .find(|v| v.id == target.id)
                    .ok_or_else(|| not_found("volume", &target.id))?;
                volume.num_of_blocks = size.div_ceil(volume.block_size);
                Ok(volume.encode())
            }
            "volume_replicate" => {
                let source: Volume = record(params, "volume_src")?;
                let replica = Volume {
                    id: self.next("VOL"),
                    name: text(params, "name")?,
                    vpd83: format!("600a0b80{:024x}", self.next_id),
                    ..source.clone()
                };
                self.volume_deps.insert(source.id);
                self.volumes.push(replica.clone());
                Ok(replica.encode())
            }
            "volume_replicate_range_block_size" => Ok(Value::from(BLOCK as u32)),
            "volume_delete" => {
                let volume: Volume = record(params, "volume")?;
                remove_by(&mut self.volumes, |v| v.id == volume.id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found("volume", &volume.id))
            }
            "volume_online" | "volume_offline" => {
                let volume: Volume = record(params, "volume")?;
                self.find_volume(&volume.id).map(|_| Value::Null)
            }
            "volume_child_dependency" => {
                let volume: Volume = record(params, "volume")?;
                Ok(Value::from(self.volume_deps.contains(&volume.id)))
            }
            "volume_child_dependency_rm" => {
                let volume: Volume = record(params, "volume")?;
                self.volume_deps.remove(&volume.id);
                Ok(Value::Null)
            }

            "initiator_grant" => {
                let id = text(params, "initiator_id")?;
                let volume: Volume = record(params, "volume")?;
                let initiator = self
                    .initiators
                    .iter()
                    .find(|i| i.id == id)
                    .cloned()
                    .unwrap_or(Initiator {
                        id: id.clone(),
                        initiator_type: InitiatorType::Other,
                        name: id,
                    });
                self.initiator_grants.push((initiator, volume.id));
                Ok(Value::Null)
            }
            "initiator_revoke" => {
                let initiator: Initiator = record(params, "initiator")?;
                let volume: Volume = record(params, "volume")?;
                self.initiator_grants
                    .retain(|(i, v)| !(i.id == initiator.id && *v == volume.id));
                Ok(Value::Null)
            }
            "volumes_accessible_by_initiator" => {
                let initiator: Initiator = record(params, "initiator")?;
                let ids: Vec<&String> = self
                    .initiator_grants
                    .iter()
                    .filter(|(i, _)| i.id == initiator.id)
                    .map(|(_, v)| v)
                    .collect();
                let volumes: Vec<Volume> =
                    self.volumes.iter().filter(|v| ids.contains(&&v.id)).cloned().collect();
                Ok(encode_list(&volumes))
            }
            "initiators_granted_to_volume" => {
                let volume: Volume = record(params, "volume")?;
                let initiators: Vec<Initiator> = self
                    .initiator_grants
                    .iter()
                    .filter(|(_, v)| *v == volume.id)
                    .map(|(i, _)| i.clone())
                    .collect();
                Ok(encode_list(&initiators))
            }

            "access_group_list" => Ok(encode_list(&self.groups)),
            "access_group_create" => {
                let group = AccessGroup {
                    id: self.next("AG"),
                    name: text(params, "name")?,
                    initiators: vec![text(params, "initiator_id")?],
                    system_id: text(params, "system_id")?,
                };
                self.groups.push(group.clone());
                Ok(group.encode())
            }
            "access_group_del" => {
                let group: AccessGroup = record(params, "group")?;
                self.group_grants.retain(|(g, _)| *g != group.id);
                remove_by(&mut self.groups, |g| g.id == group.id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found("access group", &group.id))
            }
            "access_group_add_initiator" | "access_group_del_initiator" => {
                let target: AccessGroup = record(params, "group")?;
                let initiator = text(params, "initiator_id")?;
                let group = self
                    .groups
                    .iter_mut()
                    .find(|g| g.id == target.id)
                    .ok_or_else(|| not_found("access group", &target.id))?;
                if method == "access_group_add_initiator" {
                    group.initiators.push(initiator);
                } else {
                    group.initiators.retain(|i| *i != initiator);
                }
                Ok(Value::Null)
            }
            "access_group_grant" => {
                let group: AccessGroup = record(params, "group")?;
                let volume: Volume = record(params, "volume")?;
                self.group_grants.push((group.id, volume.id));
                Ok(Value::Null)
            }
            "access_group_revoke" => {
                let group: AccessGroup = record(params, "group")?;
                let volume: Volume = record(params, "volume")?;
                self.group_grants
                    .retain(|(g, v)| !(*g == group.id && *v == volume.id));
                Ok(Value::Null)
            }
            "volumes_accessible_by_access_group" => {
                let group: AccessGroup = record(params, "group")?;
                let volumes: Vec<Volume> = self
                    .volumes
                    .iter()
                    .filter(|v| self.group_grants.contains(&(group.id.clone(), v.id.clone())))
                    .cloned()
                    .collect();
                Ok(encode_list(&volumes))
            }
            "access_groups_granted_to_volume" => {
                let volume: Volume = record(params, "volume")?;
                let groups: Vec<AccessGroup> = self
                    .groups
                    .iter()
                    .filter(|g| self.group_grants.contains(&(g.id.clone(), volume.id.clone())))
                    .cloned()
                    .collect();
                Ok(encode_list(&groups))
            }

            "fs" => Ok(encode_list(&self.filesystems)),
            "fs_create" => {
                let pool: Pool = record(params, "pool")?;
                let size = number(params, "size_bytes")?;
                let fs = FileSystem {
                    id: self.next("FS"),
                    name: text(params, "name")?,
                    total_space: size,
                    free_space: size,
                    pool_id: pool.id,
                    system_id: pool.system_id,
                };
                self.filesystems.push(fs.clone());
                Ok(fs.encode())
            }
            "fs_delete" => {
                let fs: FileSystem = record(params, "fs")?;
                self.snapshots.remove(&fs.id);
                remove_by(&mut self.filesystems, |f| f.id == fs.id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found("file system", &fs.id))
            }
            "fs_resize" => {
                let target: FileSystem = record(params, "fs")?;
                let size = number(params, "new_size_bytes")?;
                let fs = self
                    .filesystems
                    .iter_mut()
                    .find(|f| f.id == target.id)
                    .ok_or_else(|| not_found("file system", &target.id))?;
                fs.free_space = size.saturating_sub(fs.total_space - fs.free_space);
                fs.total_space = size;
                Ok(fs.encode())
            }
            "fs_clone" => {
                let source: FileSystem = record(params, "src_fs")?;
                let clone = FileSystem {
                    id: self.next("FS"),
                    name: text(params, "dest_fs_name")?,
                    ..source
                };
                self.filesystems.push(clone.clone());
                Ok(clone.encode())
            }
            "fs_child_dependency" => {
                let fs: FileSystem = record(params, "fs")?;
                let busy = self.snapshots.get(&fs.id).is_some_and(|s| !s.is_empty());
                Ok(Value::from(busy))
            }
            "fs_snapshots" => {
                let fs: FileSystem = record(params, "fs")?;
                let snapshots = self.snapshots.get(&fs.id).cloned().unwrap_or_default();
                Ok(encode_list(&snapshots))
            }
            "fs_snapshot_create" => {
                let fs: FileSystem = record(params, "fs")?;
                strings(params, "files")?;
                let snapshot = Snapshot {
                    id: self.next("SS"),
                    name: text(params, "snapshot_name")?,
                    ts: chrono::Utc::now().timestamp().unsigned_abs(),
                };
                self.snapshots.entry(fs.id).or_default().push(snapshot.clone());
                Ok(snapshot.encode())
            }
            "fs_snapshot_delete" | "fs_snapshot_revert" => {
                let fs: FileSystem = record(params, "fs")?;
                let snapshot: Snapshot = record(params, "snapshot")?;
                let list = self.snapshots.entry(fs.id).or_default();
                if !list.iter().any(|s| s.id == snapshot.id) {
                    return Err(not_found("snapshot", &snapshot.id));
                }
                if method == "fs_snapshot_delete" {
                    list.retain(|s| s.id != snapshot.id);
                }
                Ok(Value::Null)
            }

            "exports" => Ok(encode_list(&self.exports)),
            "export_fs" => {
                let fs_id = text(params, "fs_id")?;
                let optional = |key: &str| -> std::result::Result<Option<String>, Fault> {
                    match param(params, key)? {
                        Value::Null => Ok(None),
                        other => other
                            .as_str()
                            .map(|s| Some(s.to_string()))
                            .map_err(|e| (BAD_REQUEST, e.to_string())),
                    }
                };
                let export = NfsExport {
                    id: self.next("EXP"),
                    export_path: Some(
                        optional("export_path")?.unwrap_or_else(|| format!("/exports/{}", fs_id)),
                    ),
                    fs_id,
                    auth: optional("auth_type")?,
                    root: strings(params, "root_list")?,
                    rw: strings(params, "rw_list")?,
                    ro: strings(params, "ro_list")?,
                    anonuid: number(params, "anon_uid")?,
                    anongid: number(params, "anon_gid")?,
                    options: optional("options")?,
                };
                self.exports.push(export.clone());
                Ok(export.encode())
            }
            "export_remove" => {
                let export: NfsExport = record(params, "export")?;
                remove_by(&mut self.exports, |e| e.id == export.id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found("export", &export.id))
            }

            other => Err((NO_SUPPORT, format!("{} is not supported", other))),
        }
    }

    fn add_pool(&mut self, params: &Value, size: u64) -> Reply {
        let system: System = record(params, "system")?;
        let pool = Pool {
            id: self.next("POOL"),
            name: text(params, "pool_name")?,
            total_space: size,
            free_space: size,
            system_id: system.id,
        };
        self.pools.push(pool.clone());
        Ok(pool.encode())
    }

    fn find_volume(&self, id: &str) -> std::result::Result<&Volume, Fault> {
        self.volumes
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| not_found("volume", id))
    }

    fn job_status(&mut self, params: &Value) -> Reply {
        let id = text(params, "job_id")?;
        let fail = self.fail_jobs;
        let job = self.jobs.get_mut(&id).ok_or_else(|| not_found("job", &id))?;
        job.polls += 1;
        let (status, percent, result) = if job.polls < 3 {
            (1, job.polls * 33, Value::Null)
        } else if fail {
            (4, 100, Value::Null)
        } else {
            (2, 100, job.result.clone())
        };
        Ok(Value::Array(vec![Value::from(status), Value::from(percent), result]))
    }
}

fn remove_by<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    let idx = items.iter().position(pred)?;
    Some(items.remove(idx))
}

// =============================================================================
// Socket Server
// =============================================================================

/// Simulated plugin listening on `<tempdir>/<name>`
pub(crate) struct SimulatedPlugin {
    dir: TempDir,
    state: Arc<Mutex<SimState>>,
    accept: JoinHandle<()>,
}

impl SimulatedPlugin {
    pub(crate) async fn start(name: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let listener = UnixListener::bind(dir.path().join(name)).unwrap();
        let state = Arc::new(Mutex::new(SimState::new()));

        let shared = state.clone();
        let accept = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, shared.clone()));
            }
        });

        Self { dir, state, accept }
    }

    pub(crate) fn ipc_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Connector bound to this plugin's directory with fast job polling
    pub(crate) fn connector(&self) -> Connector {
        let config = ClientConfig {
            job_poll: JobPollConfig {
                initial_interval_ms: 1,
                max_interval_ms: 5,
                max_elapsed_ms: Some(5_000),
            },
            ..ClientConfig::default()
        }
        .with_ipc_dir(self.dir.path());
        Connector::new(config)
    }

    /// Number of requests received for `method`
    pub(crate) fn calls(&self, method: &str) -> usize {
        self.state.lock().calls.get(method).copied().unwrap_or(0)
    }

    pub(crate) fn last_params(&self, method: &str) -> Option<Value> {
        self.state.lock().last_params.get(method).cloned()
    }

    /// Answer `method` with a plugin fault
    pub(crate) fn fail_method(&self, method: &str, code: i32, message: &str) {
        self.state
            .lock()
            .failures
            .insert(method.to_string(), ((code, message.to_string()), None));
    }

    /// Answer `method` with a plugin fault tagged with a backend domain and level
    pub(crate) fn fail_method_in(
        &self,
        method: &str,
        code: i32,
        message: &str,
        domain: i32,
        level: i32,
    ) {
        self.state.lock().failures.insert(
            method.to_string(),
            ((code, message.to_string()), Some((domain, level))),
        );
    }

    /// Close the connection instead of answering `method`
    pub(crate) fn hang_up_on(&self, method: &str) {
        self.state.lock().hang_ups.insert(method.to_string());
    }

    /// Answer `method` with `result` verbatim
    pub(crate) fn respond_with(&self, method: &str, result: Value) {
        self.state.lock().canned.insert(method.to_string(), result);
    }

    /// Deliver mutating results through jobs that finish on the third poll
    pub(crate) fn set_async_jobs(&self, enabled: bool) {
        self.state.lock().async_jobs = enabled;
    }

    /// Make every job end in the error state
    pub(crate) fn fail_jobs(&self, enabled: bool) {
        self.state.lock().fail_jobs = enabled;
    }
}

impl Drop for SimulatedPlugin {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

async fn serve(stream: UnixStream, state: Arc<Mutex<SimState>>) {
    let mut framed = Framed::new(stream, FrameCodec::new(32 * 1024 * 1024));
    while let Some(Ok(frame)) = framed.next().await {
        let Ok(request) = Value::from_wire(&frame) else {
            return;
        };
        let field = |key: &str| request.get(key).ok().flatten().cloned().unwrap_or_default();
        let id = field("id");
        let method = field("method").into_string().unwrap_or_default();
        let params = field("params");

        let action = state.lock().handle(&method, &params);
        let envelope = match action {
            Action::HangUp => return,
            Action::Reply(Ok(result)) => Value::object([("id", id), ("result", result)]),
            Action::Reply(Err((code, message))) => Value::object([
                ("id", id),
                ("error", fault_object(code, message, None, None)),
            ]),
            Action::Raise(fault) => Value::object([
                ("id", id),
                (
                    "error",
                    fault_object(fault.code, fault.message, fault.domain, fault.level),
                ),
            ]),
        };
        let payload = envelope.to_wire().unwrap();
        if framed.send(Bytes::from(payload)).await.is_err() {
            return;
        }
    }
}

fn fault_object(code: i32, message: String, domain: Option<i32>, level: Option<i32>) -> Value {
    let mut fields = vec![
        ("code", Value::from(code)),
        ("message", Value::from(message)),
        ("data", Value::Null),
    ];
    if let Some(domain) = domain {
        fields.push(("domain", Value::from(domain)));
    }
    if let Some(level) = level {
        fields.push(("level", Value::from(level)));
    }
    Value::object(fields)
}
