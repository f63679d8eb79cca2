//! Command execution against one environment

use super::sink::EventSink;
use super::types::{
    AssignmentOptions, Command, CommandStats, OutageOptions, QueryOptions, ReportOptions,
    UserOptions, REPORT_FIELDS,
};
use crate::config::Environment;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::{PageWalker, SourcedRecord};
use crate::query::{DisplayValue, FilterClause, TableQuery};
use crate::record::{
    collapse_references, Event, EventBuilder, NullPolicy, RecordEnvelope, LIFECYCLE_TIME_FIELDS,
};
use crate::resolver::{ReferenceResolver, ReplacementMap};
use crate::types::{
    SOURCETYPE_ASSET, SOURCETYPE_DEFAULT, SOURCETYPE_INCIDENT, SOURCETYPE_OUTAGE, SOURCETYPE_TASK,
    SOURCETYPE_USER,
};
use tracing::{debug, info, warn};

/// How records of one walk become events
#[derive(Debug, Clone)]
struct Pipeline {
    builder: EventBuilder,
    resolve: bool,
    collapse: bool,
}

impl Pipeline {
    fn new(sourcetype: &str, policy: NullPolicy) -> Self {
        Self {
            builder: EventBuilder::new(sourcetype, policy),
            resolve: true,
            collapse: false,
        }
    }
}

/// One invocation: a client, its reference cache and the configured
/// replacements. Nothing here outlives the command.
#[derive(Debug)]
pub struct Session {
    base_url: String,
    http: HttpClient,
    resolver: ReferenceResolver,
    replacements: ReplacementMap,
    stats: CommandStats,
}

impl Session {
    /// Session for a resolved environment
    pub fn new(env: &Environment) -> Result<Self> {
        let http = HttpClient::for_environment(env)?;
        Ok(Self::with_client(&env.base_url, http, env.replacements.clone()))
    }

    /// Session over an existing client
    pub fn with_client(
        base_url: impl Into<String>,
        http: HttpClient,
        replacements: ReplacementMap,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resolver: ReferenceResolver::new(http.clone()),
            http,
            replacements,
            stats: CommandStats::default(),
        }
    }

    /// Instance base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The resolver, with whatever it has cached so far
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Output of the last run, including a run that failed part way
    pub fn stats(&self) -> CommandStats {
        self.stats
    }

    /// Run a command. Configuration problems and walks that fail before
    /// producing anything are returned as errors.
    pub async fn run(&mut self, command: &Command, sink: &mut dyn EventSink) -> Result<CommandStats> {
        command.validate()?;
        info!("Running {} against {}", command.name(), self.base_url);

        self.stats = CommandStats::default();
        match command {
            Command::Query(opts) => self.query(opts, sink).await?,
            Command::Incident(opts) => {
                self.assignment("incident", SOURCETYPE_INCIDENT, opts, sink)
                    .await?;
            }
            Command::Task(opts) => self.assignment("task", SOURCETYPE_TASK, opts, sink).await?,
            Command::User(opts) => self.user(opts, sink).await?,
            Command::Outage(opts) => self.outage(opts, sink).await?,
            Command::Report(opts) => self.report(opts, sink).await?,
        }

        info!(
            "{} finished: {} event(s) from {} walk(s)",
            command.name(),
            self.stats.events,
            self.stats.walks
        );
        Ok(self.stats)
    }

    async fn query(&mut self, opts: &QueryOptions, sink: &mut dyn EventSink) -> Result<()> {
        let url = opts.table_query()?.url(&self.base_url);
        let mut pipeline = Pipeline::new(SOURCETYPE_DEFAULT, NullPolicy::Plain);
        pipeline.builder = pipeline
            .builder
            .time_field(&opts.time_field)
            .epoch_fields(LIFECYCLE_TIME_FIELDS);
        pipeline.collapse = opts.values_only;

        self.walk(url, opts.limit, &pipeline, sink, |_| {}).await
    }

    async fn assignment(
        &mut self,
        table: &str,
        sourcetype: &str,
        opts: &AssignmentOptions,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let by = opts.assigned_by;
        // cached values must be the field resolution of this column would fetch
        let map_to = self.replacements.get(by.column()).map(str::to_string);
        let lookup = self
            .resolver
            .lookup_sys_ids(
                &self.base_url,
                by.lookup_table(),
                by.lookup_field(),
                &opts.assigned,
                map_to.as_deref(),
            )
            .await?;

        if lookup.sys_ids.is_empty() {
            warn!(
                "No {} matched {:?}; skipping {} query",
                by.lookup_table(),
                opts.assigned,
                table
            );
            return Ok(());
        }

        let mut query = TableQuery::new(table).filter(FilterClause::new(by.column(), lookup.sys_ids));
        if let Some(days) = opts.days_ago {
            query = query.days_ago("sys_created_on", days);
        }
        // the limit doubles as the page size
        let page_size = u32::try_from(opts.limit).unwrap_or(u32::MAX);
        let url = query
            .active(opts.active)
            .limit(page_size)
            .url(&self.base_url);

        let pipeline = Pipeline::new(sourcetype, NullPolicy::WithSiblings);
        self.walk(url, Some(opts.limit), &pipeline, sink, |_| {}).await
    }

    async fn user(&mut self, opts: &UserOptions, sink: &mut dyn EventSink) -> Result<()> {
        let url = TableQuery::new("sys_user")
            .filter(FilterClause::new("user_name", opts.user_names.iter().map(String::as_str)))
            .url(&self.base_url);

        let mut sys_ids = Vec::new();
        let users = Pipeline::new(SOURCETYPE_USER, NullPolicy::WithSiblings);
        self.walk(url, None, &users, sink, |record| {
            if let Some(id) = record.text("sys_id").filter(|id| !id.is_empty()) {
                sys_ids.push(id);
            }
        })
        .await?;

        if sys_ids.is_empty() {
            debug!("No users matched, skipping assets and incidents");
            return Ok(());
        }

        let url = TableQuery::new("alm_asset")
            .filter(FilterClause::new("assigned_to", sys_ids.iter().map(String::as_str)))
            .url(&self.base_url);
        let assets = Pipeline::new(SOURCETYPE_ASSET, NullPolicy::WithSiblings);
        self.walk(url, None, &assets, sink, |_| {}).await?;

        let mut query = TableQuery::new("incident")
            .filter(FilterClause::new("opened_by", sys_ids.iter().map(String::as_str)));
        if let Some(days) = opts.days_ago {
            query = query.days_ago("sys_created_on", days);
        }
        let incidents = Pipeline::new(SOURCETYPE_INCIDENT, NullPolicy::WithSiblings);
        self.walk(query.url(&self.base_url), None, &incidents, sink, |_| {})
            .await
    }

    async fn outage(&mut self, opts: &OutageOptions, sink: &mut dyn EventSink) -> Result<()> {
        let url = TableQuery::new("cmdb_ci_outage")
            .days_ago("sys_created_on", opts.days_ago)
            .url(&self.base_url);
        let pipeline = Pipeline::new(SOURCETYPE_OUTAGE, NullPolicy::WithSiblings);
        self.walk(url, None, &pipeline, sink, |_| {}).await
    }

    async fn report(&mut self, opts: &ReportOptions, sink: &mut dyn EventSink) -> Result<()> {
        let url = TableQuery::new("report_home_details")
            .filter(FilterClause::new("rep_title", [opts.report.as_str()]))
            .display_value(DisplayValue::False)
            .url(&self.base_url);

        let mut pipeline = Pipeline::new(SOURCETYPE_INCIDENT, NullPolicy::Plain);
        pipeline.resolve = false;

        self.stats.walks += 1;
        let mut reports = PageWalker::new(self.http.clone(), url, None);
        let mut found = 0u64;
        while let Some(SourcedRecord { record, .. }) = reports.next_record().await? {
            found += 1;
            let Some(filter) = record.text("rep_filter") else {
                debug!("Report row without rep_filter, skipping");
                continue;
            };

            let mut query = TableQuery::new("incident").clause(filter);
            if !opts.all_fields {
                query = query.fields(REPORT_FIELDS.iter().copied());
            }
            let url = query.url(&self.base_url);
            self.walk(url, None, &pipeline, sink, |_| {}).await?;
        }

        if let Some(e) = reports.take_last_error() {
            if found == 0 {
                return Err(e);
            }
            warn!("Report lookup ended early: {}", e);
        }
        if found == 0 {
            warn!("No report titled '{}'", opts.report);
        }
        Ok(())
    }

    /// Walk one query to exhaustion, turning each record into an event.
    ///
    /// `inspect` sees every record before resolution. A walk that fails
    /// before yielding a record is an error; a later failure only ends it.
    async fn walk<F>(
        &mut self,
        url: String,
        limit: Option<u64>,
        pipeline: &Pipeline,
        sink: &mut dyn EventSink,
        mut inspect: F,
    ) -> Result<()>
    where
        F: FnMut(&RecordEnvelope),
    {
        info!("Querying {}", url);
        self.stats.walks += 1;

        let mut walker = PageWalker::new(self.http.clone(), url, limit);
        let mut emitted = 0u64;
        while let Some(sourced) = walker.next_record().await? {
            let SourcedRecord {
                mut record,
                source,
                total_count,
            } = sourced;
            inspect(&record);

            if pipeline.resolve && !self.replacements.is_empty() {
                self.resolver.resolve_all(&mut record, &self.replacements).await;
            }
            if pipeline.collapse {
                collapse_references(&mut record);
            }

            sink.emit(pipeline.builder.build(record, &source, total_count))?;
            emitted += 1;
            self.stats.events += 1;
        }

        if let Some(e) = walker.take_last_error() {
            if emitted == 0 {
                return Err(e);
            }
            warn!("Walk ended after {} record(s): {}", emitted, e);
        }
        debug!(
            "Walk done after {} page(s), stop reason {:?}",
            walker.state().pages,
            walker.stop_reason()
        );
        Ok(())
    }
}

/// Run `command` against `env`, reporting any failure as a single error
/// event. Only a failing sink is returned as an error.
pub async fn run(env: &Environment, command: &Command, sink: &mut dyn EventSink) -> Result<CommandStats> {
    let mut session = match Session::new(env) {
        Ok(session) => session,
        Err(e) => {
            emit_failure(sink, &e)?;
            return Ok(CommandStats { events: 1, walks: 0 });
        }
    };

    match session.run(command, sink).await {
        Ok(stats) => Ok(stats),
        Err(e) => {
            emit_failure(sink, &e)?;
            let mut stats = session.stats();
            stats.events += 1;
            Ok(stats)
        }
    }
}

/// Report a failure as an error event
pub fn emit_failure(sink: &mut dyn EventSink, error: &Error) -> Result<()> {
    warn!("Command failed: {}", error);
    sink.emit(Event::error(error.to_string(), error.url()))
}
