use crate::entity::resource_over_entity;
use crate::Result;
use uuid::Uuid;

resource_over_entity!(
    /// Facts about the server at `server/info`.
    ServerInfo
);

impl ServerInfo {
    /// Name of the server instance.
    pub fn server_name(&self) -> Result<Option<String>> {
        self.get("ServerName")
    }

    /// Product version, e.g. `6.0.1`.
    pub fn version(&self) -> Result<Option<String>> {
        self.get("Version")
    }

    /// Build identifier.
    pub fn build(&self) -> Result<Option<String>> {
        self.get("Build")
    }

    /// Operating system the server runs on.
    pub fn os_name(&self) -> Result<Option<String>> {
        self.get("Os_name")
    }

    /// Unique ID of the server.
    pub fn guid(&self) -> Result<Option<Uuid>> {
        self.get("Guid")
    }

    /// True for the free license, which has no authentication.
    pub fn is_free(&self) -> Result<bool> {
        self.get_or("IsFree", false)
    }
}
