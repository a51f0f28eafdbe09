//! Request parameter and result records
//!
//! Every record keeps unrecognized keys in `additional_properties` and writes
//! them back out on serialization, so newer servers can add fields without
//! breaking older clients. Optional fields are omitted from the wire when
//! unset; `Some` of an empty value is still sent.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Free-form string keyed attributes stored on a Shock node
pub type Attributes = HashMap<String, Value>;

/// Boolean carried as an integer on the wire (`0` or `1`)
///
/// Decoding also accepts JSON booleans; any non-zero integer is true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoolFlag(pub bool);

impl BoolFlag {
    pub fn is_set(&self) -> bool {
        self.0
    }
}

impl From<bool> for BoolFlag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl Serialize for BoolFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(i64::from(self.0))
    }
}

impl<'de> Deserialize<'de> for BoolFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagVisitor;

        impl Visitor<'_> for FlagVisitor {
            type Value = BoolFlag;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or boolean flag")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<BoolFlag, E> {
                Ok(BoolFlag(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BoolFlag, E> {
                Ok(BoolFlag(v != 0))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BoolFlag, E> {
                Ok(BoolFlag(v != 0))
            }
        }

        deserializer.deserialize_any(FlagVisitor)
    }
}

/// Adds `with_additional_property` to records carrying an extra-field map
macro_rules! additional_properties {
    ($($record:ty),* $(,)?) => {
        $(
            impl $record {
                /// Set a field outside the known schema; it is sent as-is
                pub fn with_additional_property(
                    mut self,
                    key: impl Into<String>,
                    value: Value,
                ) -> Self {
                    self.additional_properties.insert(key.into(), value);
                    self
                }
            }
        )*
    };
}

additional_properties!(
    ShockToFileParams,
    ShockToFileOutput,
    FileToShockParams,
    FileToShockOutput,
    CopyShockNodeParams,
    CopyShockNodeOutput,
    OwnShockNodeParams,
    OwnShockNodeOutput,
    UnpackFileParams,
    UnpackFileResult,
    PackFileParams,
    PackFileResult,
    PackageForDownloadParams,
    PackageForDownloadOutput,
    ObjectSaveData,
    SaveObjectsParams,
    GetObjectsParams,
    ObjectData,
    GetObjectsResults,
    ServiceStatus,
);

// ============================================================================
// Shock Transfer
// ============================================================================

/// Request to download a Shock node to a local path
///
/// `file_path` may name a directory, in which case the node's stored file
/// name is appended on the server side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockToFileParams {
    pub shock_id: String,
    pub file_path: String,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ShockToFileParams {
    pub fn new(shock_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            shock_id: shock_id.into(),
            file_path: file_path.into(),
            additional_properties: Map::new(),
        }
    }

    pub fn with_shock_id(mut self, shock_id: impl Into<String>) -> Self {
        self.shock_id = shock_id.into();
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }
}

/// Result of downloading a Shock node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockToFileOutput {
    /// File name stored on the node
    pub node_file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ShockToFileOutput {
    pub fn new(node_file_name: impl Into<String>) -> Self {
        Self {
            node_file_name: node_file_name.into(),
            ..Default::default()
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Request to upload a local file into a new Shock node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileToShockParams {
    pub file_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,

    /// Create a persistent handle for the new node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_handle: Option<BoolFlag>,

    /// Compress the file before upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gzip: Option<BoolFlag>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl FileToShockParams {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_make_handle(mut self, make_handle: bool) -> Self {
        self.make_handle = Some(BoolFlag(make_handle));
        self
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = Some(BoolFlag(gzip));
        self
    }
}

/// Result of uploading a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileToShockOutput {
    pub shock_id: String,

    /// Present only when a handle was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_id: Option<String>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl FileToShockOutput {
    pub fn new(shock_id: impl Into<String>) -> Self {
        Self {
            shock_id: shock_id.into(),
            ..Default::default()
        }
    }

    pub fn with_handle_id(mut self, handle_id: impl Into<String>) -> Self {
        self.handle_id = Some(handle_id.into());
        self
    }
}

// ============================================================================
// Shock Node Management
// ============================================================================

/// Request to copy a Shock node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CopyShockNodeParams {
    pub shock_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_handle: Option<BoolFlag>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl CopyShockNodeParams {
    pub fn new(shock_id: impl Into<String>) -> Self {
        Self {
            shock_id: shock_id.into(),
            ..Default::default()
        }
    }

    pub fn with_make_handle(mut self, make_handle: bool) -> Self {
        self.make_handle = Some(BoolFlag(make_handle));
        self
    }
}

/// Result of copying a Shock node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CopyShockNodeOutput {
    /// Id of the new copy
    pub shock_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_id: Option<String>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl CopyShockNodeOutput {
    pub fn new(shock_id: impl Into<String>) -> Self {
        Self {
            shock_id: shock_id.into(),
            ..Default::default()
        }
    }

    pub fn with_handle_id(mut self, handle_id: impl Into<String>) -> Self {
        self.handle_id = Some(handle_id.into());
        self
    }
}

/// Request to gain ownership of a Shock node
///
/// The service returns the same node if the caller already owns it, and a
/// copy otherwise. An existing handle is reused when the node was already
/// owned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnShockNodeParams {
    pub shock_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_handle: Option<BoolFlag>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl OwnShockNodeParams {
    pub fn new(shock_id: impl Into<String>) -> Self {
        Self {
            shock_id: shock_id.into(),
            ..Default::default()
        }
    }

    pub fn with_make_handle(mut self, make_handle: bool) -> Self {
        self.make_handle = Some(BoolFlag(make_handle));
        self
    }
}

/// Result of gaining ownership of a Shock node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnShockNodeOutput {
    pub shock_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_id: Option<String>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl OwnShockNodeOutput {
    pub fn new(shock_id: impl Into<String>) -> Self {
        Self {
            shock_id: shock_id.into(),
            ..Default::default()
        }
    }

    pub fn with_handle_id(mut self, handle_id: impl Into<String>) -> Self {
        self.handle_id = Some(handle_id.into());
        self
    }
}

// ============================================================================
// Archives
// ============================================================================

/// Request to decompress and unbundle a local file in place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnpackFileParams {
    pub file_path: String,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl UnpackFileParams {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            additional_properties: Map::new(),
        }
    }
}

/// Result of unpacking a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnpackFileResult {
    /// Path of the unpacked file
    pub file_path: String,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl UnpackFileResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            additional_properties: Map::new(),
        }
    }
}

/// Archive format for `pack_file`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackFormat {
    Gzip,
    Targz,
    Zip,
}

impl PackFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackFormat::Gzip => "gzip",
            PackFormat::Targz => "targz",
            PackFormat::Zip => "zip",
        }
    }
}

impl std::str::FromStr for PackFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(PackFormat::Gzip),
            "targz" => Ok(PackFormat::Targz),
            "zip" => Ok(PackFormat::Zip),
            other => Err(format!("unknown pack format: {}", other)),
        }
    }
}

/// Request to pack a file or directory into an archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackFileParams {
    pub file_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<PackFormat>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl PackFileParams {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn with_pack(mut self, pack: PackFormat) -> Self {
        self.pack = Some(pack);
        self
    }
}

/// Result of packing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackFileResult {
    /// Path of the archive
    pub file_path: String,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl PackFileResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            additional_properties: Map::new(),
        }
    }
}

/// Request to bundle a file with workspace provenance and upload it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageForDownloadParams {
    pub file_path: String,

    /// Workspace object references whose provenance is included
    #[serde(default)]
    pub ws_refs: Vec<String>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl PackageForDownloadParams {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn with_ws_refs(mut self, ws_refs: Vec<String>) -> Self {
        self.ws_refs = ws_refs;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageForDownloadOutput {
    pub shock_id: String,
    pub node_file_name: String,
    /// Package size in bytes
    pub size: i64,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl PackageForDownloadOutput {
    pub fn new(shock_id: impl Into<String>, node_file_name: impl Into<String>, size: i64) -> Self {
        Self {
            shock_id: shock_id.into(),
            node_file_name: node_file_name.into(),
            size,
            additional_properties: Map::new(),
        }
    }
}

// ============================================================================
// Workspace Objects
// ============================================================================

/// Workspace object metadata, the 11-element tuple on the wire:
/// `[objid, name, type, save_date, version, saved_by, wsid, workspace, chsum, size, meta]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ObjectInfoTuple", into = "ObjectInfoTuple")]
pub struct ObjectInfo {
    pub objid: i64,
    pub name: String,
    pub type_string: String,
    pub save_date: String,
    pub version: i64,
    pub saved_by: String,
    pub wsid: i64,
    pub workspace: String,
    pub chsum: String,
    pub size: i64,
    pub meta: Option<HashMap<String, String>>,
}

impl ObjectInfo {
    /// `wsid/objid/version` reference to this exact object version
    pub fn reference(&self) -> String {
        format!("{}/{}/{}", self.wsid, self.objid, self.version)
    }
}

type ObjectInfoTuple = (
    i64,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    i64,
    Option<HashMap<String, String>>,
);

impl From<ObjectInfoTuple> for ObjectInfo {
    fn from(t: ObjectInfoTuple) -> Self {
        Self {
            objid: t.0,
            name: t.1,
            type_string: t.2,
            save_date: t.3,
            version: t.4,
            saved_by: t.5,
            wsid: t.6,
            workspace: t.7,
            chsum: t.8,
            size: t.9,
            meta: t.10,
        }
    }
}

impl From<ObjectInfo> for ObjectInfoTuple {
    fn from(info: ObjectInfo) -> Self {
        (
            info.objid,
            info.name,
            info.type_string,
            info.save_date,
            info.version,
            info.saved_by,
            info.wsid,
            info.workspace,
            info.chsum,
            info.size,
            info.meta,
        )
    }
}

/// One object to save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSaveData {
    /// Workspace type string, e.g. `KBaseGenomes.Genome-8.2`
    #[serde(rename = "type")]
    pub type_string: String,

    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objid: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<BoolFlag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_provenance_input_refs: Option<Vec<String>>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ObjectSaveData {
    pub fn new(type_string: impl Into<String>, data: Value) -> Self {
        Self {
            type_string: type_string.into(),
            data,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_objid(mut self, objid: i64) -> Self {
        self.objid = Some(objid);
        self
    }

    pub fn with_meta(mut self, meta: HashMap<String, String>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(BoolFlag(hidden));
        self
    }

    pub fn with_extra_provenance_input_refs(mut self, refs: Vec<String>) -> Self {
        self.extra_provenance_input_refs = Some(refs);
        self
    }
}

/// Request to save objects into a workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveObjectsParams {
    /// Numeric workspace id
    pub id: i64,
    pub objects: Vec<ObjectSaveData>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl SaveObjectsParams {
    pub fn new(id: i64, objects: Vec<ObjectSaveData>) -> Self {
        Self {
            id,
            objects,
            additional_properties: Map::new(),
        }
    }

    pub fn with_object(mut self, object: ObjectSaveData) -> Self {
        self.objects.push(object);
        self
    }
}

/// Request to fetch workspace objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetObjectsParams {
    pub object_refs: Vec<String>,

    /// Skip inaccessible objects instead of failing the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_errors: Option<BoolFlag>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl GetObjectsParams {
    pub fn new(object_refs: Vec<String>) -> Self {
        Self {
            object_refs,
            ..Default::default()
        }
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = Some(BoolFlag(ignore_errors));
        self
    }
}

/// An object and its metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub data: Value,
    pub info: ObjectInfo,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ObjectData {
    pub fn new(data: Value, info: ObjectInfo) -> Self {
        Self {
            data,
            info,
            additional_properties: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetObjectsResults {
    pub data: Vec<ObjectData>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl GetObjectsResults {
    pub fn new(data: Vec<ObjectData>) -> Self {
        Self {
            data,
            additional_properties: Map::new(),
        }
    }
}

// ============================================================================
// Service Information
// ============================================================================

/// Free-form service status
///
/// The well-known keys are surfaced as fields; anything else the service
/// reports lands in `additional_properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit_hash: Option<String>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ServiceStatus {
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.state.as_deref() == Some("OK")
    }
}
