use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use pacprune::action::{Action, Executor, Privilege};
use pacprune::config::{self, DEFAULT_KEEP, DEFAULT_PACMAN_CONF, UserConfig};
use pacprune::installed::{installed_packages, parse_names};
use pacprune::scan::{self, AgeFilter, Candidate, collect_candidates, format_size};
use pacprune::select::{Filters, Selection, select, sort_paths};

/// Output options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// List each candidate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Separate listed candidates with NUL instead of newlines
    #[arg(short = 'z', long, global = true)]
    pub null: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub nocolor: bool,
}

/// Selection options shared by `dryrun`, `move` and `remove`.
#[derive(Args, Debug, Default)]
pub struct PruneArgs {
    /// Versions to keep per package [default: 3]
    #[arg(short, long, value_name = "NUM")]
    keep: Option<usize>,

    /// Only prune packages built for this architecture
    #[arg(short, long)]
    arch: Option<String>,

    /// Cache directory to prune, may be repeated [default: CacheDir from pacman.conf]
    #[arg(short, long = "cachedir", value_name = "DIR")]
    cachedir: Vec<PathBuf>,

    /// Only prune these packages (comma separated, "-" reads stdin)
    #[arg(short, long, value_delimiter = ',', value_name = "PKGS")]
    include: Vec<String>,

    /// Never prune these packages (comma separated, "-" reads stdin)
    #[arg(short = 'I', long, value_delimiter = ',', value_name = "PKGS")]
    exclude: Vec<String>,

    /// Only prune packages that are no longer installed
    #[arg(short, long)]
    uninstalled: bool,

    /// Keep packages accessed within this long, e.g. "30days"
    #[arg(long, value_name = "AGE", value_parser = parse_age_arg)]
    min_atime: Option<Duration>,

    /// Keep packages modified within this long, e.g. "30days"
    #[arg(long, value_name = "AGE", value_parser = parse_age_arg)]
    min_mtime: Option<Duration>,

    /// pacman configuration to read CacheDir from [default: /etc/pacman.conf]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn parse_age_arg(value: &str) -> Result<Duration, String> {
    scan::parse_age(value).map_err(|e| e.to_string())
}

/// Fully resolved parameters for a run.
#[derive(Debug)]
pub struct Settings {
    pub dirs: Vec<PathBuf>,
    pub selection: Selection,
    pub age: AgeFilter,
}

/// Candidates found in one cache directory.
#[derive(Debug)]
pub struct DirReport {
    pub dir: PathBuf,
    pub candidates: Vec<Candidate>,
}

impl PruneArgs {
    /// Merge flags with the user config and pacman.conf.
    pub fn resolve(&self, output: &OutputArgs) -> Result<Settings> {
        let user = UserConfig::load_default().context("Failed to load user config")?;

        if output.nocolor || user.color == Some(false) {
            colored::control::set_override(false);
        }

        self.resolve_with(&user, &mut io::stdin().lock(), installed_packages)
    }

    /// Resolve against an already loaded user config.
    ///
    /// `input` backs the "-" list values and `installed` is only called for
    /// `--uninstalled`.
    pub fn resolve_with<R, F>(
        &self,
        user: &UserConfig,
        input: &mut R,
        installed: F,
    ) -> Result<Settings>
    where
        R: Read,
        F: FnOnce() -> pacprune::Result<HashSet<String>>,
    {
        let dirs = self.cache_dirs(user)?;

        let reads_stdin = |values: &[String]| values.iter().any(|v| v.trim() == "-");
        if reads_stdin(&self.include) && reads_stdin(&self.exclude) {
            bail!("Only one of --include and --exclude can read from stdin");
        }

        let include = expand_names(&self.include, input)?;
        let mut exclude = expand_names(&self.exclude, input)?;

        if self.uninstalled {
            exclude.extend(installed().context("Failed to list installed packages")?);
        }

        let keep = self.keep.or(user.keep).unwrap_or(DEFAULT_KEEP);
        debug!(
            "keep={keep} arch={:?} include={} exclude={} dirs={:?}",
            self.arch,
            include.len(),
            exclude.len(),
            dirs
        );

        Ok(Settings {
            dirs,
            selection: Selection {
                keep,
                arch: self.arch.clone(),
                filters: Filters { include, exclude },
            },
            age: AgeFilter {
                min_atime: self.min_atime,
                min_mtime: self.min_mtime,
            },
        })
    }

    /// `--cachedir`, then `--config`, then the user's `cache_dirs`, then the
    /// user's `pacman_conf`, then `/etc/pacman.conf`.
    fn cache_dirs(&self, user: &UserConfig) -> Result<Vec<PathBuf>> {
        if !self.cachedir.is_empty() {
            return Ok(self.cachedir.clone());
        }

        let conf = match (&self.config, user.cache_dirs.is_empty()) {
            (Some(conf), _) => conf.clone(),
            (None, false) => return Ok(user.cache_dirs.clone()),
            (None, true) => user
                .pacman_conf
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PACMAN_CONF)),
        };

        config::configured_cache_dirs(&conf)
            .with_context(|| format!("Failed to read cache dirs from {}", conf.display()))
    }
}

/// Turn `--include`/`--exclude` values into a name set, reading `input` for "-".
fn expand_names<R: Read>(values: &[String], input: &mut R) -> Result<HashSet<String>> {
    let mut names = HashSet::new();

    for value in values {
        let value = value.trim();
        if value == "-" {
            let mut text = String::new();
            input
                .read_to_string(&mut text)
                .context("Failed to read package names from stdin")?;
            names.extend(parse_names(&text));
        } else if !value.is_empty() {
            names.insert(value.to_string());
        }
    }

    Ok(names)
}

/// Run the selection pass over every cache directory.
pub fn collect(settings: &Settings) -> Result<Vec<DirReport>> {
    let now = SystemTime::now();
    let mut reports = Vec::new();

    for dir in &settings.dirs {
        let files = scan::scan_cache_dir(dir)?;

        let mut paths = select(&files, &settings.selection).candidates;
        sort_paths(&mut paths);
        let paths = settings.age.apply(paths, now);

        info!("{} candidates in {}", paths.len(), dir.display());
        reports.push(DirReport {
            dir: dir.clone(),
            candidates: collect_candidates(paths),
        });
    }

    Ok(reports)
}

pub fn candidate_count(reports: &[DirReport]) -> usize {
    reports.iter().map(|r| r.candidates.len()).sum()
}

pub fn total_size(reports: &[DirReport]) -> u64 {
    reports.iter().map(|r| scan::total_size(&r.candidates)).sum()
}

/// Print the "nothing to do" notice. Returns `true` when there is nothing to do.
pub fn report_empty(reports: &[DirReport], output: &OutputArgs) -> bool {
    if candidate_count(reports) > 0 {
        return false;
    }
    if !output.quiet {
        println!(
            "{} {}",
            "==>".green().bold(),
            "no candidate packages found for pruning".bold()
        );
    }
    true
}

/// With `--verbose`, list every candidate and its sidecars on stdout.
pub fn list_candidates(reports: &[DirReport], output: &OutputArgs) -> Result<()> {
    if !output.verbose {
        return Ok(());
    }

    write_candidates(&mut io::stdout().lock(), reports, output.null)
}

/// Write candidate paths one per line, or NUL separated when `null` is set.
fn write_candidates<W: Write>(out: &mut W, reports: &[DirReport], null: bool) -> Result<()> {
    let delimiter = if null { '\0' } else { '\n' };

    for candidate in reports.iter().flat_map(|r| &r.candidates) {
        for file in candidate.files() {
            write!(out, "{}{delimiter}", file.display())?;
        }
    }
    out.flush()?;

    Ok(())
}

/// Print a closing summary line.
pub fn finish(output: &OutputArgs, message: String) {
    if !output.quiet {
        println!("\n{} {}", "==>".green().bold(), message.bold());
    }
}

/// Apply `action` to every candidate, one cache directory at a time.
pub fn execute(reports: &[DirReport], action: &Action, output: &OutputArgs) -> Result<()> {
    let verb = match action {
        Action::Move { .. } => "Moving",
        Action::Remove { .. } => "Removing",
    };

    let progress = if output.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(candidate_count(reports) as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "[{elapsed_precise}] {msg:25} [{wide_bar:.bold.cyan}] {pos}/{len} ({eta} remaining)",
            )
            .context("Invalid progress template")?
            .progress_chars("##-"),
    );
    progress.set_message(format!("{verb} packages..."));

    for report in reports.iter().filter(|r| !r.candidates.is_empty()) {
        let executor = Executor::for_cache_dir(action.clone(), &report.dir);

        for candidate in &report.candidates {
            let status = match executor.privilege() {
                // Let sudo prompt without the bar redrawing over it
                Privilege::Sudo => progress.suspend(|| executor.apply(candidate)),
                Privilege::Direct => executor.apply(candidate),
            };

            if let Err(e) = status {
                progress.abandon_with_message(format!(
                    "{} {}",
                    "✗".red().bold(),
                    format!("Failed at {}", candidate.path.display()).red()
                ));
                return Err(e.into());
            }
            progress.inc(1);
        }
    }

    progress.finish_and_clear();
    Ok(())
}

/// Human readable total for summaries.
pub fn size_summary(reports: &[DirReport]) -> String {
    format_size(total_size(reports))
}
