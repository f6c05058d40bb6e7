use crate::entity::resource_over_entity;
use crate::http::ToArguments;
use crate::resources::job::read_sid;
use crate::resources::Job;
use crate::Result;
use tracing::instrument;

resource_over_entity!(
    /// A saved search at `saved/searches/<name>`.
    SavedSearch
);

impl SavedSearch {
    /// The search string.
    pub fn search(&self) -> Result<Option<String>> {
        self.get("Search")
    }

    /// Description entered by its author.
    pub fn description(&self) -> Result<Option<String>> {
        self.get("Description")
    }

    /// True when the search runs on a schedule.
    pub fn is_scheduled(&self) -> Result<bool> {
        self.get_or("Is_scheduled", false)
    }

    /// Cron expression of the schedule.
    pub fn cron_schedule(&self) -> Result<Option<String>> {
        self.get("Cron_schedule")
    }

    /// Runs the saved search, returning the unpopulated job it started.
    #[instrument(skip_all, fields(resource = %self.name()))]
    pub async fn dispatch(&self, args: &impl ToArguments) -> Result<Job> {
        self.identity().ensure_specific()?;
        let response = self.identity().child("dispatch")?.post(&args.to_arguments()).await?;
        let sid = read_sid(response).await?;

        Job::for_sid(self.identity().context().clone(), self.namespace().clone(), &sid)
    }
}
