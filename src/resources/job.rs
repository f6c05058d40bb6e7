use crate::atom::{AtomEntry, Value};
use crate::convert::from_value_using_from_str;
use crate::entity::{resource_over_entity, Entity, Resource, ResourceIdentity};
use crate::errors::ParseError;
use crate::http::{ArgumentSet, Context, Response, ToArguments};
use crate::name::{Namespace, ResourceName};
use crate::results::SearchResultStream;
use crate::Result;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{debug, instrument};

/// Pause between two polls of [`Job::wait_until_done`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle state of a search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DispatchState {
    /// Waiting for a search slot.
    Queued,
    /// The search string is being parsed.
    Parsing,
    /// Events are being searched.
    Running,
    /// Paused by a user.
    Paused,
    /// Finalized by a user; results are being completed.
    Finalizing,
    /// The search failed.
    Failed,
    /// The search finished and its results are final.
    Done,
}

from_value_using_from_str![DispatchState as "DispatchState"];

resource_over_entity!(
    /// A search job at `search/jobs/<sid>`.
    ///
    /// A job created through the service is unpopulated until it is [`update`]d or [`wait_until_done`] returns.
    ///
    /// [`update`]: crate::Entity::update
    /// [`wait_until_done`]: Job::wait_until_done
    Job,
    entry_name = entry_sid
);

// Jobs are titled with their search string.
fn entry_sid(entry: &AtomEntry) -> &str {
    entry
        .content()
        .and_then(|content| content.get("Sid"))
        .and_then(Value::as_str)
        .unwrap_or_else(|| entry.title())
}

impl Job {
    pub(crate) fn for_sid(context: Context, namespace: Namespace, sid: &str) -> Result<Self> {
        let name = ResourceName::new(["search", "jobs", sid])?;

        Ok(Self::from_entity(Entity::new(ResourceIdentity::new(context, namespace, name))))
    }

    /// The search ID.
    pub fn sid(&self) -> &str {
        self.title()
    }

    /// The current dispatch state, if reported.
    pub fn dispatch_state(&self) -> Result<Option<DispatchState>> {
        self.get("DispatchState")
    }

    /// True once the results are final, whether the search succeeded or not.
    pub fn is_done(&self) -> Result<bool> {
        self.get_or("IsDone", false)
    }

    /// True when the search failed.
    pub fn is_failed(&self) -> Result<bool> {
        self.get_or("IsFailed", false)
    }

    /// Number of results produced so far.
    pub fn result_count(&self) -> Result<u64> {
        self.get_or("ResultCount", 0)
    }

    /// Number of events matched so far.
    pub fn event_count(&self) -> Result<u64> {
        self.get_or("EventCount", 0)
    }

    /// Progress between 0 and 1.
    pub fn done_progress(&self) -> Result<f64> {
        self.get_or("DoneProgress", 0.0)
    }

    /// The search string.
    pub fn search(&self) -> Result<Option<String>> {
        self.get("Search")
    }

    /// Polls the job every 500 ms until it is done.
    #[instrument(skip_all, fields(sid = %self.sid()))]
    pub async fn wait_until_done(&mut self) -> Result<()> {
        loop {
            self.update().await?;
            if self.is_done()? {
                debug!(state = ?self.dispatch_state()?, "job done");
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn get_child(&self, child: &str, args: &impl ToArguments) -> Result<SearchResultStream<'static>> {
        let response = self.identity().child(child)?.get(&args.to_arguments()).await?;

        SearchResultStream::new(response.into_cursor()).await
    }

    /// Streams the final results.
    pub async fn results(&self, args: &impl ToArguments) -> Result<SearchResultStream<'static>> {
        self.get_child("results", args).await
    }

    /// Streams a preview of the results of a running job.
    pub async fn preview(&self, args: &impl ToArguments) -> Result<SearchResultStream<'static>> {
        self.get_child("results_preview", args).await
    }

    /// Streams the events the search matched.
    pub async fn events(&self, args: &impl ToArguments) -> Result<SearchResultStream<'static>> {
        self.get_child("events", args).await
    }

    async fn control(&self, action: &str) -> Result<()> {
        self.identity().ensure_specific()?;
        self.identity()
            .child("control")?
            .post(&ArgumentSet::new().with("action", action))
            .await?;

        Ok(())
    }

    /// Stops the job and deletes its results.
    pub async fn cancel(&self) -> Result<()> {
        self.control("cancel").await
    }

    /// Stops the job, keeping the results found so far.
    pub async fn finalize(&self) -> Result<()> {
        self.control("finalize").await
    }

    /// Suspends the job.
    pub async fn pause(&self) -> Result<()> {
        self.control("pause").await
    }

    /// Resumes a paused job.
    pub async fn unpause(&self) -> Result<()> {
        self.control("unpause").await
    }
}

/// Reads the `<sid>` of a `<response>` that created a job.
pub(crate) async fn read_sid(response: Response) -> Result<String> {
    let mut cursor = response.into_cursor();
    let sid = match cursor.read_to_following(&["sid"]).await? {
        Some(_) => cursor.read_text().await?.trim().to_owned(),
        None => return Err(ParseError::missing("sid", "response").into()),
    };
    cursor.close();

    Ok(sid)
}
