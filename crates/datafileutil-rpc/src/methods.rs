//! Remote method catalog
//!
//! Every operation lives under the `DataFileUtil.` namespace on the wire.

use std::fmt;

/// Service namespace prefixed to every method name
pub const SERVICE_NAME: &str = "DataFileUtil";

/// A remote DataFileUtil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    // ========================================================================
    // Shock Operations
    // ========================================================================
    ShockToFile,
    ShockToFileMass,
    FileToShock,
    FileToShockMass,
    CopyShockNode,
    OwnShockNode,

    // ========================================================================
    // Archive Operations
    // ========================================================================
    UnpackFile,
    PackFile,
    PackageForDownload,

    // ========================================================================
    // Workspace Operations
    // ========================================================================
    WsNameToId,
    SaveObjects,
    GetObjects,

    // ========================================================================
    // Service Information
    // ========================================================================
    Versions,
    Status,
}

impl Method {
    pub const ALL: [Method; 14] = [
        Method::ShockToFile,
        Method::ShockToFileMass,
        Method::FileToShock,
        Method::FileToShockMass,
        Method::CopyShockNode,
        Method::OwnShockNode,
        Method::UnpackFile,
        Method::PackFile,
        Method::PackageForDownload,
        Method::WsNameToId,
        Method::SaveObjects,
        Method::GetObjects,
        Method::Versions,
        Method::Status,
    ];

    /// Operation name without the service namespace
    pub fn name(&self) -> &'static str {
        match self {
            Method::ShockToFile => "shock_to_file",
            Method::ShockToFileMass => "shock_to_file_mass",
            Method::FileToShock => "file_to_shock",
            Method::FileToShockMass => "file_to_shock_mass",
            Method::CopyShockNode => "copy_shock_node",
            Method::OwnShockNode => "own_shock_node",
            Method::UnpackFile => "unpack_file",
            Method::PackFile => "pack_file",
            Method::PackageForDownload => "package_for_download",
            Method::WsNameToId => "ws_name_to_id",
            Method::SaveObjects => "save_objects",
            Method::GetObjects => "get_objects",
            Method::Versions => "versions",
            Method::Status => "status",
        }
    }

    /// Fully qualified name as sent in the envelope's `method` member
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", SERVICE_NAME, self.name())
    }

    /// Whether the call must carry a credential
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Method::Status)
    }

    /// Look up a method by its qualified or bare name
    pub fn from_name(name: &str) -> Option<Method> {
        let bare = name
            .strip_prefix(SERVICE_NAME)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        Method::ALL.iter().copied().find(|m| m.name() == bare)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", SERVICE_NAME, self.name())
    }
}
