use crate::entity::resource_over_entity;
use crate::Result;

resource_over_entity!(
    /// An installed app at `apps/local/<name>`.
    Application
);

impl Application {
    /// Display name.
    pub fn label(&self) -> Result<Option<String>> {
        self.get("Label")
    }

    /// Version string.
    pub fn version(&self) -> Result<Option<String>> {
        self.get("Version")
    }

    /// Author of the app.
    pub fn author(&self) -> Result<Option<String>> {
        self.get("Author")
    }

    /// True when the app is disabled.
    pub fn is_disabled(&self) -> Result<bool> {
        self.get_or("Disabled", false)
    }

    /// True when the app shows up in the app menu.
    pub fn is_visible(&self) -> Result<bool> {
        self.get_or("Visible", true)
    }
}
