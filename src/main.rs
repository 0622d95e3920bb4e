//! CLI entry point for gitree

use std::collections::BTreeMap;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use gitree::config::{self, MAX_ITEMS_LIMIT, OutputFormat, UserConfig};
use gitree::export::{copy_to_clipboard, with_extension, write_export};
use gitree::interactive::select_files;
use gitree::output::zip_path;
use gitree::tree::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_ITEMS};
use gitree::{
    ContentOptions, ContentRecord, EntryOrder, Error, KindFilter, MarkdownFormatter, OutputConfig,
    TraversalResult, TreeFormatter, TreeSummary, TreeWalker, WalkerConfig, create_zip,
    load_contents, to_json_many,
};
use tracing::{info, warn};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // https://no-color.org/
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gitree")]
#[command(about = "Print a directory tree (respects .gitignore)")]
#[command(version)]
struct Args {
    /// Root paths (directories, files or wildcard patterns)
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// Descend only N levels deep
    #[arg(short = 'L', long = "max-depth", value_name = "N")]
    max_depth: Option<usize>,

    /// Show hidden files and directories
    #[arg(short = 'a', long = "hidden-items")]
    hidden_items: bool,

    /// Patterns of entries to exclude (e.g. '*.pyc' '__pycache__/')
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Apply --exclude patterns only down to depth N
    #[arg(long = "exclude-depth", value_name = "N")]
    exclude_depth: Option<usize>,

    /// Patterns of files to include (e.g. '*.rs' 'docs/')
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    include: Vec<String>,

    /// File types or extensions to include (e.g. rust py toml)
    #[arg(
        long = "include-file-types",
        alias = "include-file-type",
        num_args = 1..,
        value_name = "TYPE"
    )]
    include_file_types: Vec<String>,

    /// Ignore .gitignore rules
    #[arg(long = "no-gitignore")]
    no_gitignore: bool,

    /// Read .gitignore files only down to depth N (0 = root only)
    #[arg(long = "gitignore-depth", value_name = "N")]
    gitignore_depth: Option<usize>,

    /// Limit items shown per directory (use --no-limit for unlimited)
    #[arg(long = "max-items", value_name = "N", value_parser = parse_max_items)]
    max_items: Option<usize>,

    /// Limit entries shown in total, root included
    #[arg(long = "max-entries", value_name = "N", value_parser = parse_positive)]
    max_entries: Option<usize>,

    /// Show all items regardless of count
    #[arg(long = "no-limit")]
    no_limit: bool,

    /// Disable the total entry limit
    #[arg(long = "no-max-entries")]
    no_max_entries: bool,

    /// Hide files from the tree (only show directories)
    #[arg(short = 'd', long = "no-files", conflicts_with = "files_only")]
    no_files: bool,

    /// Show only files and the directories that lead to them
    #[arg(long = "files-only")]
    files_only: bool,

    /// List files before directories
    #[arg(long = "files-first")]
    files_first: bool,

    /// Show emojis in tree output
    #[arg(short = 'e', long)]
    emoji: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Disable colors
    #[arg(long = "no-color")]
    no_color: bool,

    /// Format for stdout, exports and the clipboard
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Save output to FILE in --format (extension added when missing)
    #[arg(short = 'o', long = "output", alias = "export", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Export tree as text to FILE
    #[arg(long = "txt", value_name = "FILE")]
    txt: Option<PathBuf>,

    /// Export tree as JSON to FILE
    #[arg(long = "json", value_name = "FILE")]
    json: Option<PathBuf>,

    /// Export tree as Markdown to FILE
    #[arg(long = "md", value_name = "FILE")]
    md: Option<PathBuf>,

    /// Refuse to replace existing output files
    #[arg(long = "no-override-files")]
    no_override_files: bool,

    /// Copy output to the clipboard instead of printing it
    #[arg(short = 'c', long)]
    copy: bool,

    /// Don't include file contents in exports
    #[arg(long = "no-contents")]
    no_contents: bool,

    /// Don't include contents of files matching PATTERN in exports
    #[arg(long = "no-contents-for", num_args = 1.., value_name = "PATTERN")]
    no_contents_for: Vec<String>,

    /// Show file sizes in Markdown output
    #[arg(long = "size")]
    size: bool,

    /// Create a zip archive of the listed files
    #[arg(short = 'z', long = "zip", value_name = "NAME")]
    zip: Option<String>,

    /// Print the number of files and directories at each level
    #[arg(short = 's', long)]
    summary: bool,

    /// Select the files to list interactively
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Number of parallel workers for loading file contents
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    jobs: usize,

    /// Create .gitree/config.json with the default settings
    #[arg(long = "init-config")]
    init_config: bool,

    /// Open .gitree/config.json in $VISUAL or $EDITOR
    #[arg(long = "config-user")]
    config_user: bool,

    /// Ignore .gitree/config.json and use built-in defaults
    #[arg(long = "no-config")]
    no_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_max_items(s: &str) -> Result<usize, String> {
    let n = parse_positive(s)?;
    if n > MAX_ITEMS_LIMIT {
        return Err(format!("must be between 1 and {}", MAX_ITEMS_LIMIT));
    }
    Ok(n)
}

fn parse_positive(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", s))?;
    if n == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(n)
}

/// Effective settings after merging flags, the config file and defaults.
struct Settings {
    walker: WalkerConfig,
    format: OutputFormat,
    output: OutputConfig,
    /// `None` when contents are left out of exports.
    contents: Option<ContentOptions>,
    override_files: bool,
    show_sizes: bool,
}

fn flag(cli: bool, file: Option<bool>) -> bool {
    cli || file.unwrap_or(false)
}

fn list(cli: &[String], file: &Option<Vec<String>>) -> Vec<String> {
    if cli.is_empty() {
        file.clone().unwrap_or_default()
    } else {
        cli.to_vec()
    }
}

/// A limit set by flag beats one from the file; a "no limit" switch beats a
/// value from the same layer.
fn limit(
    cli_off: bool,
    cli: Option<usize>,
    file_off: Option<bool>,
    file: Option<usize>,
    default: usize,
) -> Option<usize> {
    if cli_off {
        return None;
    }
    if cli.is_some() {
        return cli;
    }
    if file_off.unwrap_or(false) {
        return None;
    }
    Some(file.unwrap_or(default))
}

impl Settings {
    fn merge(args: &Args, file: &UserConfig) -> gitree::Result<Self> {
        let kind_filter = if args.files_only {
            KindFilter::FilesOnly
        } else if flag(args.no_files, file.no_files) {
            KindFilter::DirsOnly
        } else {
            KindFilter::All
        };

        let walker = WalkerConfig {
            max_depth: args.max_depth.or(file.max_depth),
            max_items: limit(
                args.no_limit,
                args.max_items,
                file.no_limit,
                file.max_items,
                DEFAULT_MAX_ITEMS,
            ),
            max_entries: limit(
                args.no_max_entries,
                args.max_entries,
                file.no_max_entries,
                file.max_entries,
                DEFAULT_MAX_ENTRIES,
            ),
            include_hidden: flag(args.hidden_items, file.hidden_items),
            kind_filter,
            excludes: list(&args.exclude, &file.exclude),
            exclude_depth: args.exclude_depth.or(file.exclude_depth),
            includes: list(&args.include, &file.include),
            include_file_types: list(&args.include_file_types, &file.include_file_types),
            respect_ignore_files: !flag(args.no_gitignore, file.no_gitignore),
            ignore_depth: args.gitignore_depth.or(file.gitignore_depth),
            order: if flag(args.files_first, file.files_first) {
                EntryOrder::FilesFirst
            } else {
                EntryOrder::Name
            },
            selection: None,
        };
        walker.validate()?;

        let use_color = match args.color {
            ColorMode::Always => true,
            _ if flag(args.no_color, file.no_color) => false,
            mode => should_use_color(mode),
        };

        let contents = if flag(args.no_contents, file.no_contents) {
            None
        } else {
            let patterns = list(&args.no_contents_for, &file.no_contents_for);
            Some(ContentOptions::new(args.jobs, &patterns)?)
        };

        Ok(Self {
            walker,
            format: args
                .format
                .or_else(|| file.output_format())
                .unwrap_or_default(),
            output: OutputConfig {
                use_color,
                emoji: flag(args.emoji, file.emoji),
            },
            contents,
            override_files: !args.no_override_files && file.override_files.unwrap_or(true),
            show_sizes: args.size,
        })
    }

    /// Export targets: `--output` in the chosen format plus the per-format flags.
    fn exports(&self, args: &Args) -> Vec<(PathBuf, OutputFormat)> {
        let mut targets = Vec::new();
        if let Some(path) = &args.output {
            targets.push((with_extension(path, self.format), self.format));
        }
        for (path, format) in [
            (&args.txt, OutputFormat::Txt),
            (&args.json, OutputFormat::Json),
            (&args.md, OutputFormat::Md),
        ] {
            if let Some(path) = path {
                targets.push((with_extension(path, format), format));
            }
        }
        targets
    }
}

fn setup_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("gitree: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> gitree::Result<()> {
    let cwd = std::env::current_dir()?;

    if args.init_config || args.config_user {
        if args.init_config && config::init(&cwd)? {
            println!("Created {}", config::config_path(&cwd).display());
        }
        if args.config_user {
            config::open_in_editor(&cwd)?;
        }
        return Ok(());
    }

    let file = if args.no_config {
        UserConfig::default()
    } else {
        UserConfig::load(&cwd)?.unwrap_or_default()
    };
    let settings = Settings::merge(args, &file)?;

    let mut targets: Vec<(PathBuf, WalkerConfig)> = resolve_roots(&args.paths)?
        .into_iter()
        .map(|root| (root, settings.walker.clone()))
        .collect();

    if args.interactive {
        let mut chosen = Vec::new();
        for (root, mut config) in targets {
            match select_files(&root, &config)? {
                None => return Ok(()),
                Some(selection) if selection.is_empty() => {
                    info!("nothing selected under {}", root.display());
                }
                Some(selection) => {
                    config.selection = Some(selection);
                    chosen.push((root, config));
                }
            }
        }
        if chosen.is_empty() {
            return Ok(());
        }
        targets = chosen;
    }

    if let Some(name) = &args.zip {
        return run_zip(&cwd.join(zip_path(name)), targets);
    }

    let results = targets
        .into_iter()
        .map(|(root, config)| TreeWalker::new(config)?.walk(&root))
        .collect::<gitree::Result<Vec<_>>>()?;

    warn_unmatched_includes(&results, &settings.walker);

    let exports = settings.exports(args);
    let contents = match &settings.contents {
        Some(options) if !exports.is_empty() || args.copy => Some(
            results
                .iter()
                .flat_map(|result| load_contents(result, options))
                .collect::<BTreeMap<_, _>>(),
        ),
        _ => None,
    };

    for (path, format) in &exports {
        let text = render(&results, *format, contents.as_ref(), &settings)?;
        write_export(path, &text, settings.override_files)?;
        info!("wrote {}", path.display());
    }

    let mut copied = false;
    if args.copy {
        let text = render(&results, settings.format, contents.as_ref(), &settings)?;
        match copy_to_clipboard(&text) {
            Ok(tool) => {
                info!("copied to clipboard with {}", tool);
                copied = true;
            }
            Err(e) => warn!("{}", e),
        }
    }

    if !copied {
        print_results(&results, &settings)?;
    }

    if args.summary {
        for result in &results {
            println!();
            TreeSummary::from_result(result).print(settings.output.use_color)?;
        }
    }
    Ok(())
}

fn run_zip(path: &Path, targets: Vec<(PathBuf, WalkerConfig)>) -> gitree::Result<()> {
    let results = targets
        .into_iter()
        .map(|(root, config)| {
            let config = WalkerConfig {
                max_items: None,
                max_entries: None,
                ..config
            };
            TreeWalker::new(config)?.walk(&root)
        })
        .collect::<gitree::Result<Vec<_>>>()?;

    let written = create_zip(path, &results)?;
    println!("Created {} ({} files)", path.display(), written);
    Ok(())
}

fn warn_unmatched_includes(results: &[TraversalResult], config: &WalkerConfig) {
    for result in results {
        let (types, patterns): (Vec<&str>, Vec<&str>) = result
            .unmatched_includes
            .iter()
            .map(String::as_str)
            .partition(|name| config.include_file_types.iter().any(|t| t == name));
        if !patterns.is_empty() {
            eprintln!(
                "gitree: warning: no files found matching --include patterns: {}",
                patterns.join(", ")
            );
        }
        if !types.is_empty() {
            eprintln!(
                "gitree: warning: no files found matching --include-file-types: {}",
                types.join(", ")
            );
        }
    }
}

fn render(
    results: &[TraversalResult],
    format: OutputFormat,
    contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
    settings: &Settings,
) -> gitree::Result<String> {
    let headers = results.len() > 1;
    let text = match format {
        OutputFormat::Json => {
            let mut json = to_json_many(results, contents).map_err(io::Error::other)?;
            json.push('\n');
            json
        }
        OutputFormat::Txt => {
            let formatter = TreeFormatter::new(OutputConfig {
                use_color: false,
                emoji: settings.output.emoji,
            });
            let mut text = String::new();
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    text.push('\n');
                }
                if headers {
                    text.push_str(&format!("{}\n", result.root.path().display()));
                }
                text.push_str(&formatter.format(result, contents));
            }
            text
        }
        OutputFormat::Md => {
            let formatter = MarkdownFormatter::new().with_sizes(settings.show_sizes);
            let mut text = String::new();
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    text.push('\n');
                }
                if headers {
                    text.push_str(&format!("## {}\n\n", result.root.path().display()));
                }
                text.push_str(&formatter.format(result, contents));
            }
            text
        }
    };
    Ok(text)
}

fn print_results(results: &[TraversalResult], settings: &Settings) -> gitree::Result<()> {
    if settings.format != OutputFormat::Txt {
        print!("{}", render(results, settings.format, None, settings)?);
        return Ok(());
    }

    let formatter = TreeFormatter::new(settings.output.clone());
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if results.len() > 1 {
            println!("{}", result.root.path().display());
        }
        formatter.print(result, None)?;
    }
    Ok(())
}

/// Expand the positional paths into distinct directory roots.
///
/// Wildcards are expanded, files stand for their parent directory, and a root
/// inside another root is folded into it.
fn resolve_roots(paths: &[String]) -> gitree::Result<Vec<PathBuf>> {
    let mut roots = Vec::new();
    for raw in paths {
        if raw.contains(['*', '?', '[']) {
            let entries = glob::glob(raw).map_err(|e| {
                Error::config(format!("invalid path pattern '{}': {}", raw, e))
            })?;
            let mut matched = false;
            for entry in entries {
                match entry {
                    Ok(path) => {
                        matched = true;
                        add_root(&mut roots, &path)?;
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            if !matched {
                warn!("no matches found for pattern: {}", raw);
            }
        } else {
            add_root(&mut roots, Path::new(raw))?;
        }
    }

    if roots.is_empty() {
        return Err(Error::config("no paths to list"));
    }
    Ok(roots)
}

fn add_root(roots: &mut Vec<PathBuf>, path: &Path) -> gitree::Result<()> {
    let mut root = path.canonicalize().map_err(|source| Error::RootNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    if root.is_file() {
        if let Some(parent) = root.parent() {
            root = parent.to_path_buf();
        }
    }

    if roots.iter().any(|r| root.starts_with(r)) {
        return Ok(());
    }
    let first_nested = roots.iter().position(|r| r.starts_with(&root));
    roots.retain(|r| !r.starts_with(&root));
    match first_nested {
        Some(i) => roots.insert(i, root),
        None => roots.push(root),
    }
    Ok(())
}
