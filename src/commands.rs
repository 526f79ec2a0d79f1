//! Subcommand implementations behind [`crate::run_app`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;
use serde::Serialize;

use crate::cli::{
    ClearArgs, Cli, ConfigArgs, DescribeArgs, EnrichArgs, FilterArg, OutputFormat, ScanArgs,
    SearchArgs, StatsArgs,
};
use crate::config::Config;
use crate::enrich::{
    BatchRunner, BatchSelection, BatchStatus, CliGenerator, DescriptionGenerator, ItemStatus,
    Orchestrator,
};
use crate::entry::{Entry, LanguagePlan};
use crate::error::ExitCode;
use crate::icons::{BundleIconRenderer, IconCache};
use crate::inventory::{EntryFilter, Inventory, InventoryStats};
use crate::output::{text, write_json, CsvOutput, JsonBatchOutput, JsonOutput, TextOutput};
use crate::progress::{Progress, ProgressCallback, PHASE_SCAN};
use crate::scanner::{default_locations, PlistManifestReader, Scanner};
use crate::signal::{self, StopSignal};
use crate::sinks::{
    CommentSink, FileSearchIndex, FinderComments, MemoryCommentSink, SearchIndexSink,
    APPS_DOMAIN,
};
use crate::store::RecordStore;

impl From<FilterArg> for EntryFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => Self::All,
            FilterArg::WithDescription => Self::WithDescription,
            FilterArg::WithoutDescription => Self::WithoutDescription,
        }
    }
}

/// State shared by every subcommand.
pub struct Session {
    config: Config,
    languages: LanguagePlan,
    store: Arc<RecordStore>,
    quiet: bool,
    accessible: bool,
}

impl Session {
    pub fn new(cli: &Cli, config: Config) -> Result<Self> {
        let store_path = config.store_path()?;
        log::debug!("Record store at {}", store_path.display());
        let languages = config.language_plan();
        log::debug!("Target languages: {:?}", languages.targets());
        Ok(Self {
            config,
            languages,
            store: Arc::new(RecordStore::open(store_path)),
            quiet: cli.quiet,
            accessible: cli.accessible,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn progress(&self, output: OutputFormat) -> Progress {
        Progress::with_accessible(self.quiet || output != OutputFormat::Text, self.accessible)
    }

    fn scanner(&self, comments: Arc<dyn CommentSink>, stop: Option<&StopSignal>) -> Scanner {
        let home = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/"));
        let mut scanner = Scanner::new(
            default_locations(&home),
            Arc::new(PlistManifestReader::new()),
            comments,
        );
        if let Some(stop) = stop {
            scanner = scanner.with_shutdown_flag(stop.flag());
        }
        scanner
    }

    fn icon_cache(&self) -> Arc<IconCache> {
        Arc::new(IconCache::new(
            Arc::new(BundleIconRenderer::new()),
            self.config.icon_cache_limits(),
        ))
    }

    fn generator(&self) -> CliGenerator {
        CliGenerator::discover(&self.config.generator_paths, self.config.generator_timeout())
    }

    fn search_index(&self) -> Result<FileSearchIndex> {
        Ok(FileSearchIndex::open(self.config.search_index_path()?))
    }

    /// Scan without icons and merge the stored records in.
    fn inventory(&self, comments: Arc<dyn CommentSink>, stop: Option<&StopSignal>) -> Inventory {
        let entries = self.scanner(comments, stop).scan_fast();
        let mut inventory = Inventory::new(entries, self.languages.system());
        inventory.merge_records(&self.store.load());
        inventory
    }

    fn orchestrator(
        &self,
        generator: Arc<dyn DescriptionGenerator>,
        comments: Arc<dyn CommentSink>,
    ) -> Result<Orchestrator> {
        Ok(Orchestrator::new(
            Arc::clone(&self.store),
            generator,
            comments,
            Arc::new(self.search_index()?),
            self.languages.clone(),
        )
        .with_inter_item_delay(self.config.inter_item_delay()))
    }
}

/// Comment sink for `--dry-run`: starts from the comments already read and
/// keeps writes in memory.
fn dry_run_comments(entries: &[Entry]) -> Arc<MemoryCommentSink> {
    Arc::new(MemoryCommentSink::with_comments(entries.iter().filter_map(
        |e| {
            e.primary_comment
                .as_ref()
                .map(|c| (e.path.clone(), c.clone()))
        },
    )))
}

fn print_entries(
    entries: &[&Entry],
    stats: &InventoryStats,
    system_language: &str,
    output: OutputFormat,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match output {
        OutputFormat::Text => {
            TextOutput::new(entries, system_language).write_to(&mut out)?;
            text::write_stats(&mut out, stats)?;
        }
        OutputFormat::Json => {
            JsonOutput::new(entries, stats, system_language, ExitCode::Success)
                .write_to(&mut out)?;
        }
        OutputFormat::Csv => CsvOutput::new(entries, system_language).write_to(&mut out)?,
    }
    out.flush()?;
    Ok(())
}

pub fn scan(session: &Session, args: &ScanArgs) -> Result<ExitCode> {
    let progress = session.progress(args.output);
    progress.on_phase_start(PHASE_SCAN, 0);

    let mut scanner = session.scanner(Arc::new(FinderComments::new()), None);
    let icons = (!args.fast).then(|| session.icon_cache());
    if let Some(cache) = &icons {
        scanner = scanner.with_icon_cache(Arc::clone(cache));
    }
    let entries = if args.fast {
        scanner.scan_fast()
    } else {
        scanner.scan()
    };
    progress.on_phase_end(PHASE_SCAN);

    if let Some(cache) = &icons {
        let stats = cache.stats();
        log::info!(
            "Icon cache: {} icons, {} ({} rendered)",
            stats.items,
            ByteSize::b(stats.bytes as u64),
            stats.renders
        );
    }

    let mut inventory = Inventory::new(entries, session.languages.system());
    inventory.merge_records(&session.store.load());
    if !args.no_save {
        session
            .store
            .save(inventory.entries())
            .with_context(|| format!("Failed to save {}", session.store.path().display()))?;
    }

    let listed = inventory.filter(args.filter.into());
    print_entries(
        &listed,
        &inventory.statistics(),
        session.languages.system(),
        args.output,
    )?;
    Ok(ExitCode::Success)
}

/// Exit code for a finished batch.
#[must_use]
pub fn batch_exit_code(status: &BatchStatus, generator_available: bool) -> ExitCode {
    if !generator_available {
        return ExitCode::GeneratorUnavailable;
    }
    match status {
        BatchStatus::Stopped(_) => ExitCode::Interrupted,
        BatchStatus::Completed(summary) if summary.failed > 0 => ExitCode::PartialSuccess,
        _ => ExitCode::Success,
    }
}

pub fn enrich(session: &Session, args: &EnrichArgs) -> Result<ExitCode> {
    let stop = signal::install_handler()?;
    let generator = Arc::new(session.generator());
    let available = generator.is_available();
    if !available {
        log::error!(
            "Description generator not found; install it or set generator_paths in {}",
            Config::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the config file".to_string())
        );
    }

    let mut inventory = session.inventory(Arc::new(FinderComments::new()), Some(&stop));
    let comments: Arc<dyn CommentSink> = if args.dry_run {
        dry_run_comments(inventory.entries())
    } else {
        Arc::new(FinderComments::new())
    };
    let orchestrator = session.orchestrator(generator, comments)?;
    let runner = BatchRunner::new(&orchestrator);

    let selection = if args.all {
        BatchSelection::All
    } else {
        BatchSelection::MissingDescriptions
    };
    let mut indices = runner.select(inventory.entries(), selection);
    if let Some(limit) = args.limit {
        indices.truncate(limit);
    }

    let progress = session.progress(args.output);
    let status = runner.run_indices(
        inventory.entries_mut(),
        &indices,
        &stop,
        Some(&progress as &dyn ProgressCallback),
    );
    let code = batch_exit_code(&status, available);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => text::write_batch_status(&mut out, &status)?,
        OutputFormat::Json => JsonBatchOutput::new(status, code).write_to(&mut out)?,
        OutputFormat::Csv => {
            let visited: Vec<&Entry> = indices
                .iter()
                .filter_map(|&i| inventory.entries().get(i))
                .collect();
            CsvOutput::new(&visited, session.languages.system()).write_to(&mut out)?;
        }
    }
    out.flush()?;
    Ok(code)
}

pub fn describe(session: &Session, args: &DescribeArgs) -> Result<ExitCode> {
    let scanner = session.scanner(Arc::new(FinderComments::new()), None);
    let Some(mut entry) = scanner.entry_for(&args.path) else {
        bail!("{} is not an application bundle", args.path.display());
    };
    if let Some(record) = session.store.record(&entry.path) {
        record.apply_to(&mut entry);
    }

    let generator = Arc::new(session.generator());
    if !generator.is_available() {
        log::error!("Description generator not found");
        return Ok(ExitCode::GeneratorUnavailable);
    }
    let comments: Arc<dyn CommentSink> = if args.dry_run {
        dry_run_comments(std::slice::from_ref(&entry))
    } else {
        Arc::new(FinderComments::new())
    };
    let orchestrator = session.orchestrator(generator, comments)?;
    let outcome = orchestrator.enrich(&mut entry);
    log::info!(
        "{}: {} fields fetched, {} failed, comment {:?}",
        entry.name,
        outcome.fetched,
        outcome.failed_fields,
        outcome.comment
    );

    let stats = Inventory::new(vec![entry.clone()], session.languages.system()).statistics();
    print_entries(&[&entry], &stats, session.languages.system(), args.output)?;
    Ok(match outcome.status() {
        ItemStatus::Failed => ExitCode::PartialSuccess,
        ItemStatus::Updated | ItemStatus::Skipped => ExitCode::Success,
    })
}

pub fn search(session: &Session, args: &SearchArgs) -> Result<ExitCode> {
    let inventory = Inventory::from_records(&session.store.load(), session.languages.system());
    let hits = inventory.search(&args.query);
    log::debug!("{} of {} records match {:?}", hits.len(), inventory.len(), args.query);
    let stats = Inventory::new(
        hits.iter().map(|e| (*e).clone()).collect(),
        session.languages.system(),
    )
    .statistics();
    print_entries(&hits, &stats, session.languages.system(), args.output)?;
    Ok(ExitCode::Success)
}

/// Everything `stats` reports.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub store_path: PathBuf,
    pub has_cached_data: bool,
    pub system_language: String,
    pub target_languages: Vec<String>,
    pub generator: Option<PathBuf>,
    pub search_index_path: PathBuf,
    pub indexed_documents: usize,
    pub inventory: InventoryStats,
}

pub fn stats(session: &Session, args: &StatsArgs) -> Result<ExitCode> {
    let index = session.search_index()?;
    let inventory = Inventory::from_records(&session.store.load(), session.languages.system());
    let generator = session.generator();
    let report = StatsReport {
        store_path: session.store.path().to_path_buf(),
        has_cached_data: session.store.has_cached_data(),
        system_language: session.languages.system().to_string(),
        target_languages: session.languages.targets().to_vec(),
        generator: generator.binary().map(Path::to_path_buf),
        search_index_path: index.path().to_path_buf(),
        indexed_documents: index.documents().len(),
        inventory: inventory.statistics(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => write_json(&mut out, &report)?,
        OutputFormat::Text | OutputFormat::Csv => {
            text::write_stats(&mut out, &report.inventory)?;
            text::write_field(&mut out, "store", &report.store_path.display().to_string())?;
            text::write_field(
                &mut out,
                "languages",
                &report.target_languages.join(", "),
            )?;
            text::write_field(
                &mut out,
                "generator",
                &report
                    .generator
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "not found".to_string()),
            )?;
            text::write_field(
                &mut out,
                "search index",
                &format!(
                    "{} ({} documents)",
                    report.search_index_path.display(),
                    report.indexed_documents
                ),
            )?;
        }
    }
    out.flush()?;
    Ok(ExitCode::Success)
}

pub fn prune(session: &Session) -> Result<ExitCode> {
    let inventory = session.inventory(Arc::new(MemoryCommentSink::new()), None);
    let live = inventory.paths();
    let before = session.store.load();
    if live.is_empty() && !before.is_empty() {
        log::warn!("Scan found no bundles; refusing to prune {} records", before.len());
        return Ok(ExitCode::Success);
    }

    let removed = session
        .store
        .prune(&live)
        .context("Failed to prune record store")?;

    let index = session.search_index()?;
    for record in before.iter().filter(|r| !live.contains(&r.path)) {
        let id = record.to_entry().search_id();
        if let Err(e) = index.delete(&id) {
            log::warn!("Failed to drop {} from the search index: {}", id, e);
        }
    }

    if !session.quiet {
        println!("Removed {removed} records for missing bundles");
    }
    Ok(ExitCode::Success)
}

pub fn clear(session: &Session, args: &ClearArgs) -> Result<ExitCode> {
    if !args.yes {
        bail!("Refusing to delete stored records without --yes");
    }
    session
        .store
        .clear()
        .context("Failed to delete the record store")?;
    session
        .search_index()?
        .delete_all(APPS_DOMAIN)
        .context("Failed to clear the search index")?;
    if !session.quiet {
        println!("Cleared {}", session.store.path().display());
    }
    Ok(ExitCode::Success)
}

pub fn config(cli: &Cli, session: &Session, args: &ConfigArgs) -> Result<ExitCode> {
    let config = session.config();
    print!("{}", config.to_toml()?);
    if args.write {
        let path = cli
            .config
            .clone()
            .or_else(Config::config_path)
            .context("Failed to determine the config file location")?;
        config.save(&path)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(ExitCode::Success)
}
