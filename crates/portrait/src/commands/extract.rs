//! Extract command - Write component metadata for matching sources

use clap::{Args, ValueEnum};
use glob::Pattern;
use ignore::Walk;
use portrait_croquis::{extract_components, read_metadata, ExtractOptions, ExtractedComponent, DEFAULT_EXPORT};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::config::{load_config, ConfigFormat, ExtractConfig};

const DEFAULT_PATTERN: &str = "./**/*.vue";

/// Extensions a component can live in.
const SOURCE_EXTENSIONS: &[&str] = &["vue", "js", "mjs", "jsx", "ts", "mts", "tsx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Generated object literal
    #[default]
    Js,
    /// Metadata as JSON
    Json,
}

impl From<ConfigFormat> for OutputFormat {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Js => Self::Js,
            ConfigFormat::Json => Self::Json,
        }
    }
}

#[derive(Args, Default)]
pub struct ExtractArgs {
    /// Glob pattern(s) to match source files (default: ./**/*.vue)
    pub patterns: Vec<String>,

    /// Output directory; metadata is printed to stdout when unset
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Interpolation delimiters
    #[arg(long, num_args = 2, value_names = ["OPEN", "CLOSE"])]
    pub delimiters: Option<Vec<String>>,

    /// Re-read generated code and fail if it does not reproduce the metadata
    #[arg(long)]
    pub verify: bool,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Continue on errors
    #[arg(long)]
    pub continue_on_error: bool,
}

/// Command line merged over `portrait.config.json`.
#[derive(Debug, PartialEq)]
struct Settings {
    patterns: Vec<String>,
    out_dir: Option<PathBuf>,
    format: OutputFormat,
    delimiters: Option<(String, String)>,
}

impl Settings {
    fn resolve(args: &ExtractArgs, config: ExtractConfig) -> Self {
        let patterns = if !args.patterns.is_empty() {
            args.patterns.clone()
        } else {
            config
                .patterns
                .filter(|patterns| !patterns.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_PATTERN.to_string()])
        };
        let delimiters = match args.delimiters.as_deref() {
            Some([open, close]) => Some((open.clone(), close.clone())),
            _ => config.delimiters,
        };
        Self {
            patterns,
            out_dir: args.out_dir.clone().or(config.out_dir),
            format: args.format.or(config.format.map(OutputFormat::from)).unwrap_or_default(),
            delimiters,
        }
    }
}

#[derive(Debug)]
struct ExtractStats {
    success: AtomicUsize,
    failed: AtomicUsize,
    components: AtomicUsize,
}

impl ExtractStats {
    fn new() -> Self {
        Self {
            success: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            components: AtomicUsize::new(0),
        }
    }
}

pub fn run(args: ExtractArgs) {
    let start = Instant::now();
    let settings = Settings::resolve(&args, load_config(None).extract);
    tracing::debug!("extract settings: {settings:?}");

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            eprintln!("Failed to configure thread pool: {}", e);
            std::process::exit(1);
        }
    }

    let files = collect_files(&settings.patterns);
    if files.is_empty() {
        eprintln!("No source files found matching the patterns");
        std::process::exit(1);
    }

    let stats = ExtractStats::new();
    let results: Vec<_> = files
        .par_iter()
        .map(|path| match extract_file(path, &settings, args.verify) {
            Ok(components) => {
                stats.success.fetch_add(1, Ordering::Relaxed);
                stats.components.fetch_add(components.len(), Ordering::Relaxed);
                Some((path.clone(), components))
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("Error extracting {}: {}", path.display(), e);

                if !args.continue_on_error {
                    std::process::exit(1);
                }

                None
            }
        })
        .collect();

    for (path, components) in results.into_iter().flatten() {
        if let Err(e) = write_output(&path, &components, &settings) {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            eprintln!("Failed to write output for {}: {}", path.display(), e);
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let success = stats.success.load(Ordering::Relaxed);
    let failed = stats.failed.load(Ordering::Relaxed);
    let components = stats.components.load(Ordering::Relaxed);

    if failed > 0 {
        eprintln!("✗ {} file(s) failed, {} extracted in {:.4}s", failed, success, elapsed);
        std::process::exit(1);
    }
    let file_word = if success == 1 { "file" } else { "files" };
    eprintln!(
        "✓ {} component(s) from {} {} extracted in {:.4}s",
        components, success, file_word, elapsed
    );
}

fn extract_file(path: &Path, settings: &Settings, verify: bool) -> Result<Vec<ExtractedComponent>, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    let options = ExtractOptions {
        filename: path.to_string_lossy().into_owned(),
        delimiters: settings.delimiters.clone(),
        ..Default::default()
    };
    let components = extract_components(&source, &options).map_err(|e| e.to_string())?;

    if verify {
        for component in &components {
            let read = read_metadata(&component.code).map_err(|e| e.to_string())?;
            if read != component.metadata {
                return Err(format!(
                    "generated code for `{}` does not read back to the same metadata",
                    component.export_name
                ));
            }
        }
    }
    Ok(components)
}

fn write_output(path: &Path, components: &[ExtractedComponent], settings: &Settings) -> std::io::Result<()> {
    let Some(out_dir) = &settings.out_dir else {
        for component in components {
            match settings.format {
                OutputFormat::Js => println!("// {} ({})\n{}", path.display(), component.export_name, component.code),
                OutputFormat::Json => println!("{}", render_json(component)),
            }
        }
        return Ok(());
    };

    for component in components {
        let out_path = out_dir.join(output_path(path, &component.export_name, settings.format));
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = match settings.format {
            OutputFormat::Js => format!("export default {}\n", component.code),
            OutputFormat::Json => render_json(component),
        };
        fs::write(&out_path, content)?;
    }
    Ok(())
}

fn render_json(component: &ExtractedComponent) -> String {
    serde_json::to_string_pretty(&component.metadata).unwrap_or_default()
}

/// `src/A.vue` → `src/A.js`, named exports → `src/A.Name.js`.
fn output_path(path: &Path, export_name: &str, format: OutputFormat) -> PathBuf {
    let ext = match format {
        OutputFormat::Js => "js",
        OutputFormat::Json => "json",
    };
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect();
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let filename = if export_name == DEFAULT_EXPORT {
        format!("{stem}.{ext}")
    } else {
        format!("{stem}.{export_name}.{ext}")
    };
    relative.with_file_name(filename)
}

fn collect_files(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for pattern in patterns {
        let (root, matcher) = parse_pattern(pattern);
        let matcher = match Pattern::new(&matcher) {
            Ok(matcher) => matcher,
            Err(e) => {
                eprintln!("Invalid pattern {}: {}", pattern, e);
                continue;
            }
        };

        for entry in Walk::new(&root).flatten() {
            let path = entry.path();
            if is_source_file(path) && pattern_matches(path, &matcher) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Split a pattern into the directory to walk and the glob to match.
fn parse_pattern(pattern: &str) -> (String, String) {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);

    if let Some(pos) = pattern.find(['*', '?', '[']) {
        let root = pattern[..pos].rfind('/').map_or(".", |slash| &pattern[..slash]);
        let root = if root.is_empty() { "." } else { root };
        return (root.to_string(), pattern.to_string());
    }

    let path = Path::new(pattern);
    if path.is_dir() {
        let dir = pattern.trim_end_matches('/');
        return (dir.to_string(), format!("{}/**/*", dir));
    }

    match path.parent().map(|p| p.to_string_lossy()) {
        Some(parent) if !parent.is_empty() => (parent.into_owned(), pattern.to_string()),
        _ => (".".to_string(), pattern.to_string()),
    }
}

fn pattern_matches(path: &Path, pattern: &Pattern) -> bool {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let path_str = path_str.strip_prefix("./").unwrap_or(&path_str);
    pattern.matches(path_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        assert_eq!(
            parse_pattern("./**/*.vue"),
            (".".to_string(), "**/*.vue".to_string())
        );
        assert_eq!(
            parse_pattern("src/components/**/*.ts"),
            ("src/components".to_string(), "src/components/**/*.ts".to_string())
        );
        assert_eq!(
            parse_pattern("src/App.vue"),
            ("src".to_string(), "src/App.vue".to_string())
        );
    }

    #[test]
    fn test_pattern_matches() {
        let pattern = Pattern::new("src/**/*.vue").unwrap();
        assert!(pattern_matches(Path::new("./src/components/App.vue"), &pattern));
        assert!(pattern_matches(Path::new("src/App.vue"), &pattern));
        assert!(!pattern_matches(Path::new("lib/App.vue"), &pattern));
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("a/B.vue")));
        assert!(is_source_file(Path::new("a/b.tsx")));
        assert!(!is_source_file(Path::new("a/b.css")));
        assert!(!is_source_file(Path::new("Makefile")));
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("./src/App.vue"), DEFAULT_EXPORT, OutputFormat::Js),
            PathBuf::from("src/App.js")
        );
        assert_eq!(
            output_path(Path::new("src/widgets.ts"), "Button", OutputFormat::Json),
            PathBuf::from("src/widgets.Button.json")
        );
    }

    #[test]
    fn test_settings_fall_back_to_config() {
        let config = ExtractConfig {
            patterns: Some(vec!["src/**/*.vue".to_string()]),
            out_dir: Some(PathBuf::from("meta")),
            format: Some(ConfigFormat::Json),
            delimiters: Some(("${".to_string(), "}".to_string())),
        };
        let settings = Settings::resolve(&ExtractArgs::default(), config);
        assert_eq!(
            settings,
            Settings {
                patterns: vec!["src/**/*.vue".to_string()],
                out_dir: Some(PathBuf::from("meta")),
                format: OutputFormat::Json,
                delimiters: Some(("${".to_string(), "}".to_string())),
            }
        );
    }

    #[test]
    fn test_settings_flags_override_config() {
        let args = ExtractArgs {
            patterns: vec!["lib/*.ts".to_string()],
            out_dir: Some(PathBuf::from("out")),
            format: Some(OutputFormat::Js),
            delimiters: Some(vec!["[[".to_string(), "]]".to_string()]),
            ..Default::default()
        };
        let config = ExtractConfig {
            patterns: Some(vec!["src/**/*.vue".to_string()]),
            out_dir: Some(PathBuf::from("meta")),
            format: Some(ConfigFormat::Json),
            delimiters: None,
        };
        let settings = Settings::resolve(&args, config);
        assert_eq!(settings.patterns, ["lib/*.ts"]);
        assert_eq!(settings.out_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.format, OutputFormat::Js);
        assert_eq!(settings.delimiters, Some(("[[".to_string(), "]]".to_string())));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::resolve(&ExtractArgs::default(), ExtractConfig::default());
        assert_eq!(settings.patterns, [DEFAULT_PATTERN]);
        assert_eq!(settings.format, OutputFormat::Js);
        assert!(settings.out_dir.is_none());
    }

    #[test]
    fn test_extract_file_with_verify() {
        let dir = std::env::temp_dir().join(format!("portrait-extract-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Counter.vue");
        fs::write(
            &path,
            "<template><button @click=\"inc\">{{ count }}</button></template>\n<script>\nexport default {\n  props: { step: Number },\n  data() { return { count: 0 } },\n  methods: { inc() { this.$emit('change', this.count) } },\n}\n</script>\n",
        )
        .unwrap();

        let settings = Settings::resolve(&ExtractArgs::default(), ExtractConfig::default());
        let components = extract_file(&path, &settings, true).unwrap();
        assert_eq!(components.len(), 1);
        assert!(components[0].metadata.emits.contains_key("change"));

        fs::remove_dir_all(&dir).ok();
    }
}
