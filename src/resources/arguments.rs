use crate::http::{ArgumentSet, ToArguments};

/// Arguments of a search run through `search/jobs`, `search/jobs/export` or a oneshot search.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::{SearchArgs, ToArguments};
/// let args = SearchArgs::new()
///     .with_earliest_time("-24h")
///     .with_max_count(500)
///     .with_required_field("host");
///
/// assert_eq!("earliest_time=-24h&max_count=500&rf=host", args.to_arguments().encode());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchArgs {
    earliest_time: Option<String>,
    latest_time: Option<String>,
    max_count: Option<u64>,
    status_buckets: Option<u32>,
    sid: Option<String>,
    required_fields: Vec<String>,
}

impl SearchArgs {
    /// Creates empty arguments; the server applies its defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest event time, absolute or relative such as `-1h`.
    pub fn with_earliest_time(mut self, time: impl Into<String>) -> Self {
        self.earliest_time = Some(time.into());
        self
    }

    /// Latest event time, absolute or relative such as `now`.
    pub fn with_latest_time(mut self, time: impl Into<String>) -> Self {
        self.latest_time = Some(time.into());
        self
    }

    /// Number of results the job keeps.
    pub fn with_max_count(mut self, count: u64) -> Self {
        self.max_count = Some(count);
        self
    }

    /// Number of timeline buckets. Zero disables the timeline.
    pub fn with_status_buckets(mut self, buckets: u32) -> Self {
        self.status_buckets = Some(buckets);
        self
    }

    /// Requests a specific search ID instead of a generated one.
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Adds a field every result must carry, even if the search does not use it.
    pub fn with_required_field(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }
}

impl ToArguments for SearchArgs {
    fn to_arguments(&self) -> ArgumentSet {
        let mut args = ArgumentSet::new();
        args.push_opt("earliest_time", self.earliest_time.as_deref());
        args.push_opt("latest_time", self.latest_time.as_deref());
        args.push_opt("max_count", self.max_count);
        args.push_opt("status_buckets", self.status_buckets);
        args.push_opt("id", self.sid.as_deref());
        for field in &self.required_fields {
            args.push("rf", field);
        }
        args
    }
}

/// Paging and filtering of the results, preview or events of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsArgs {
    count: Option<u64>,
    offset: Option<u64>,
    search: Option<String>,
    fields: Vec<String>,
}

impl ResultsArgs {
    /// Creates empty arguments; the server returns its default page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of records. Zero returns all of them.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Index of the first record.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Post-processing search applied to the records, such as `| stats count`.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Restricts records to the given field. May be repeated.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}

impl ToArguments for ResultsArgs {
    fn to_arguments(&self) -> ArgumentSet {
        let mut args = ArgumentSet::new();
        args.push_opt("count", self.count);
        args.push_opt("offset", self.offset);
        args.push_opt("search", self.search.as_deref());
        for field in &self.fields {
            args.push("f", field);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_arguments_encode_nothing() {
        assert!(SearchArgs::new().to_arguments().is_empty());
        assert!(ResultsArgs::new().to_arguments().is_empty());
    }

    #[test]
    fn test_results_paging_repeats_fields() {
        let args = ResultsArgs::new()
            .with_count(100)
            .with_offset(200)
            .with_field("host")
            .with_field("count");

        assert_eq!("count=100&offset=200&f=host&f=count", args.to_arguments().encode());
    }

    #[test]
    fn test_search_id_is_sent_as_id() {
        let args = SearchArgs::new().with_sid("nightly_report").with_status_buckets(0);

        assert_eq!(Some("nightly_report"), args.to_arguments().get("id"));
        assert_eq!(Some("0"), args.to_arguments().get("status_buckets"));
    }
}
