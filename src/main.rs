use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use anyhow::{Context, Result, bail};
use clap::{ArgAction, ColorChoice, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use comfy_table::{ContentArrangement, Table};
use is_terminal::IsTerminal;
use serde::Deserialize;
mod slug;
mod report;
mod render;
mod template;
mod minify;

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

const DEFAULT_WORLD: &str = "Vunira";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TEMPLATES_DIR: &str = "templates";
const DEFAULT_OUT_DIR: &str = "dist";

#[derive(Clone, Copy, Debug, ValueEnum, Deserialize)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Clone, Copy, Debug, ValueEnum, Deserialize)]
enum LogFormat { Text, Json }

#[derive(Parser, Debug)]
#[command(
    name = "bosswatch",
    about = "Boss status page generator for Tibia game worlds",
    long_about = "Boss status page generator for Tibia game worlds: reads the latest prediction feed for a world, renders the pending and recently-killed boss tables, fills the page template, and writes a minified HTML page per world.",
    after_long_help = "Examples:\n  bosswatch\n  bosswatch Antica --print\n  bosswatch Secura --no-minify --open\n  bosswatch --all --data-dir ./data --out-dir ./public\n  bosswatch --completions bash --completions-out bosswatch.bash",
    color = ColorChoice::Auto
)]
struct Args {
    /// Game world to render (config file world, then Vunira, when omitted)
    world: Option<String>,
    #[arg(long, default_value_t = false, conflicts_with = "world", help = "Render every world that has a data directory")]
    all: bool,
    #[arg(long)]
    data_dir: Option<String>,
    #[arg(long)]
    templates_dir: Option<String>,
    #[arg(long)]
    out_dir: Option<String>,
    /// Template file (default <templates-dir>/index.html)
    #[arg(long)]
    template: Option<String>,
    #[arg(long, default_value_t = false, help = "Write the page without minifying it")]
    no_minify: bool,
    #[arg(long, default_value_t = false, help = "Print the boss tables to the terminal as well")]
    print: bool,
    #[arg(long, default_value_t = false, help = "Open the generated page with the default handler")]
    open: bool,
    #[arg(long)]
    config: Option<String>,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            world: None,
            all: false,
            data_dir: None,
            templates_dir: None,
            out_dir: None,
            template: None,
            no_minify: false,
            print: false,
            open: false,
            config: None,
            quiet: false,
            verbose: 0,
            log_level: None,
            log_format: None,
            log_path: None,
            no_color: false,
            force_color: false,
            completions: None,
            completions_out: None,
        }
    }
}

#[derive(Deserialize)]
struct AppConfig {
    world: Option<String>,
    data_dir: Option<String>,
    templates_dir: Option<String>,
    out_dir: Option<String>,
    template: Option<String>,
    minify: Option<bool>,
    print: Option<bool>,
    open: Option<bool>,
    force_color: Option<bool>,
    log_format: Option<LogFormat>,
    log_path: Option<String>,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            if let Ok(mut f) = std::fs::File::create(path) { clap_complete::generate(sh, &mut cmd, "bosswatch", &mut f); } else { clap_complete::generate(sh, &mut cmd, "bosswatch", &mut std::io::stdout()); }
        } else {
            clap_complete::generate(sh, &mut cmd, "bosswatch", &mut std::io::stdout());
        }
        return Ok(());
    }
    if let Some(p) = args.config.as_ref()
        && let Ok(s) = std::fs::read_to_string(p)
        && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    else {
        let def = "bosswatch.toml";
        if let Ok(s) = std::fs::read_to_string(def)
            && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    }
    {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if args.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if let Some(lvl) = args.log_level {
            let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
            builder.filter_level(f);
        } else if args.verbose > 0 {
            let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            builder.filter_level(f);
        }
        if let Some(fmt) = args.log_format {
            match fmt {
                LogFormat::Json => {
                    builder.format(|buf, record| {
                        use std::io::Write;
                        let ts = chrono::Local::now().to_rfc3339();
                        let obj = serde_json::json!({
                            "ts": ts,
                            "level": record.level().to_string(),
                            "target": record.target(),
                            "msg": record.args().to_string(),
                        });
                        writeln!(buf, "{}", obj)
                    });
                }
                LogFormat::Text => {
                    builder.format(|buf, record| {
                        use std::io::Write;
                        let ts = chrono::Local::now().format("%H:%M:%S");
                        writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                    });
                }
            }
        }
        if let Some(path) = args.log_path.as_ref() {
            match std::fs::File::create(path) {
                Ok(f) => {
                    builder.target(env_logger::Target::Pipe(Box::new(f)));
                }
                Err(e) => {
                    eprintln!("Failed to open log file {}: {}", path, e);
                }
            }
        }
        builder.init();
    }
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    let _ = ENABLE_COLOR.set(enable_color);
    let data_dir = args.data_dir.clone().unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    let templates_dir = args.templates_dir.clone().unwrap_or_else(|| DEFAULT_TEMPLATES_DIR.to_string());
    let out_dir = args.out_dir.clone().unwrap_or_else(|| DEFAULT_OUT_DIR.to_string());
    let template_file = match args.template.as_ref() {
        Some(p) => PathBuf::from(p),
        None => Path::new(&templates_dir).join("index.html"),
    };
    let template = std::fs::read_to_string(&template_file)
        .with_context(|| format!("failed to read template {}", template_file.display()))?;
    log::debug!("Template: {}", template_file.display());
    if args.all {
        let worlds = discover_worlds(&data_dir)?;
        log::info!("Rendering {} worlds from {}", worlds.len(), data_dir);
        let mut failed = 0usize;
        for world in &worlds {
            match generate_world(world, &template, &data_dir, &out_dir, !args.no_minify) {
                Ok((path, rep)) => {
                    if args.print { print_report(world, &rep); }
                    if !args.quiet { println!("{}", paint(&format!("Page generated: {}", path.display()), "1;36")); }
                    if args.open { open_file_default(path); }
                }
                Err(e) => {
                    log::error!("{}: {:#}", world, e);
                    failed += 1;
                }
            }
        }
        if failed > 0 { bail!("{} of {} worlds failed", failed, worlds.len()); }
    } else {
        let world = resolve_world(&args);
        let (path, rep) = generate_world(&world, &template, &data_dir, &out_dir, !args.no_minify)?;
        if args.print { print_report(&world, &rep); }
        if !args.quiet { println!("{}", paint(&format!("Page generated: {}", path.display()), "1;36")); }
        if args.open { open_file_default(path); }
    }
    Ok(())
}

fn resolve_world(args: &Args) -> String {
    args.world.clone().unwrap_or_else(|| DEFAULT_WORLD.to_string())
}

/// Reads one world's feed, renders the page, and writes it under the output
/// directory as `<world-slug>.html`.
fn generate_world(world: &str, template: &str, data_dir: &str, out_dir: &str, minify: bool) -> Result<(PathBuf, report::BossReport)> {
    let world_slug = world.to_lowercase();
    let data_file = data_path(data_dir, &world_slug);
    let json = std::fs::read_to_string(&data_file)
        .with_context(|| format!("failed to read {}", data_file.display()))?;
    let rep = report::parse_report(&json)
        .with_context(|| format!("invalid report {}", data_file.display()))?;
    log::debug!("{}: {} bosses, feed updated {}", world, rep.bosses.len(), rep.timestamp);
    let page = build_page(template, world, &rep, minify);
    let out_file = out_path(out_dir, &world_slug);
    if let Some(parent) = out_file.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&out_file, &page).with_context(|| format!("failed to write {}", out_file.display()))?;
    Ok((out_file, rep))
}

// Pure pipeline over already-read inputs; everything that touches the
// filesystem stays in generate_world.
fn build_page(template: &str, world: &str, rep: &report::BossReport, minify: bool) -> String {
    let body = render::render_report(rep);
    let page = template::compose(template, world, &body);
    if minify { minify::minify_document(page) } else { page }
}

fn data_path(data_dir: &str, world_slug: &str) -> PathBuf {
    Path::new(data_dir).join(world_slug).join("latest.json")
}

fn out_path(out_dir: &str, world_slug: &str) -> PathBuf {
    Path::new(out_dir).join(format!("{}.html", world_slug))
}

/// Every direct subdirectory of the data directory is a world; directory
/// names are lowercase world slugs, so they are title-cased back.
fn discover_worlds(data_dir: &str) -> Result<Vec<String>> {
    let mut worlds: Vec<String> = Vec::new();
    for de in walkdir::WalkDir::new(data_dir).min_depth(1).max_depth(1).into_iter().filter_map(Result::ok) {
        if !de.file_type().is_dir() { continue; }
        if let Some(name) = de.file_name().to_str() { worlds.push(slug::title_case_words(name)); }
    }
    worlds.sort();
    if worlds.is_empty() { bail!("no world data directories under {}", data_dir); }
    Ok(worlds)
}

fn print_report(world: &str, rep: &report::BossReport) {
    println!("{}", paint(&format!("{} | last updated {}", world, rep.timestamp), "1;36"));
    for (heading, want_killed) in [(render::KILLED_HEADING, true), (render::CHECK_HEADING, false)] {
        let group: Vec<&report::BossRecord> = rep.bosses.iter().filter(|b| b.killed == want_killed).collect();
        if group.is_empty() { continue; }
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![paint("Boss", "1"), paint("Confidence", "1")]);
        for b in group {
            let slugs = slug::derive(&b.name);
            table.add_row(vec![slugs.display, render::chance_label(b.chance)]);
        }
        println!("{}", paint(heading, "1"));
        println!("{table}");
    }
}

fn apply_config(args: &mut Args, cfg: AppConfig) {
    if args.world.is_none() && let Some(v) = cfg.world { args.world = Some(v); }
    if args.data_dir.is_none() && let Some(v) = cfg.data_dir { args.data_dir = Some(v); }
    if args.templates_dir.is_none() && let Some(v) = cfg.templates_dir { args.templates_dir = Some(v); }
    if args.out_dir.is_none() && let Some(v) = cfg.out_dir { args.out_dir = Some(v); }
    if args.template.is_none() && let Some(v) = cfg.template { args.template = Some(v); }
    if let Some(v) = cfg.minify { args.no_minify = !v; }
    if let Some(v) = cfg.print { args.print = v; }
    if let Some(v) = cfg.open { args.open = v; }
    if let Some(v) = cfg.force_color { args.force_color = v; }
    if args.log_format.is_none() && let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&true) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}

#[cfg(target_os = "windows")]
fn open_file_default(p: PathBuf) {
    let mut s = p.to_string_lossy().into_owned();
    if s.starts_with("\\\\?\\") { s = s.trim_start_matches("\\\\?\\").to_string(); }
    if s.ends_with('\\') || s.ends_with('/') { s = s.trim_end_matches(['\\', '/']).to_string(); }
    let _ = std::process::Command::new("explorer").arg(&s).spawn()
        .or_else(|_| std::process::Command::new("cmd").args(["/C", "start", "", &s]).spawn())
        .map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}

#[cfg(not(target_os = "windows"))]
fn open_file_default(p: PathBuf) {
    let s = p.to_string_lossy().into_owned();
    let _ = std::process::Command::new("xdg-open").arg(&s).spawn().map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_defaults_to_vunira() {
        assert_eq!(resolve_world(&Args::default()), "Vunira");
        let args = Args { world: Some("Secura".to_string()), ..Default::default() };
        assert_eq!(resolve_world(&args), "Secura");
    }

    #[test]
    fn paths_follow_the_world_slug() {
        assert_eq!(data_path("data", "vunira"), PathBuf::from("data/vunira/latest.json"));
        assert_eq!(out_path("dist", "vunira"), PathBuf::from("dist/vunira.html"));
    }

    #[test]
    fn config_fills_gaps_but_cli_wins() {
        let mut args = Args { world: Some("Antica".to_string()), ..Default::default() };
        let cfg: AppConfig = toml::from_str("world = \"Premia\"\ndata_dir = \"/srv/boss-data\"\nminify = false\n").unwrap();
        apply_config(&mut args, cfg);
        assert_eq!(args.world.as_deref(), Some("Antica"));
        assert_eq!(args.data_dir.as_deref(), Some("/srv/boss-data"));
        assert!(args.no_minify);
    }

    #[test]
    fn config_world_applies_when_cli_omits_it() {
        let mut args = Args::default();
        let cfg: AppConfig = toml::from_str("world = \"Premia\"\nminify = true\n").unwrap();
        apply_config(&mut args, cfg);
        assert_eq!(args.world.as_deref(), Some("Premia"));
        assert!(!args.no_minify);
    }

    #[test]
    fn config_log_format_is_parsed() {
        let mut args = Args::default();
        let cfg: AppConfig = toml::from_str("log_format = \"Json\"").unwrap();
        apply_config(&mut args, cfg);
        assert!(matches!(args.log_format, Some(LogFormat::Json)));
    }

    #[test]
    fn config_log_format_does_not_override_cli() {
        let mut args = Args { log_format: Some(LogFormat::Text), ..Default::default() };
        let cfg: AppConfig = toml::from_str("log_format = \"Json\"").unwrap();
        apply_config(&mut args, cfg);
        assert!(matches!(args.log_format, Some(LogFormat::Text)));
    }

    #[test]
    fn build_page_substitutes_every_world_token() {
        let rep = report::parse_report(r#"{ "bosses": [ { "name": "Dharalion", "chance": 42.0 } ], "timestamp": "t" }"#).unwrap();
        let template = "<title>%%%WORLD%%% bosses</title><h1>%%%WORLD%%%</h1>%%%DATA%%%";
        let page = build_page(template, "Vunira", &rep, false);
        assert_eq!(page.matches("Vunira").count(), 2);
        assert!(page.contains("42.00%"));
        assert!(!page.contains("%%%DATA%%%"));
    }

    #[test]
    fn build_page_minifies_when_asked() {
        let rep = report::parse_report(r#"{ "bosses": [], "timestamp": "t" }"#).unwrap();
        let template = "<html><head>\n  <title>%%%WORLD%%%</title>\n</head><body>\n  %%%DATA%%%\n</body></html>";
        let plain = build_page(template, "Vunira", &rep, false);
        let min = build_page(template, "Vunira", &rep, true);
        assert!(min.len() < plain.len());
        assert!(min.contains("Vunira"));
        assert!(min.contains("Last updated on"));
    }

    #[test]
    fn generate_world_writes_the_page() {
        let dir = std::env::temp_dir().join("bosswatch_gen_test");
        let data_root = dir.join("data");
        let out_root = dir.join("dist");
        std::fs::create_dir_all(data_root.join("testia")).unwrap();
        std::fs::write(
            data_root.join("testia").join("latest.json"),
            r#"{ "bosses": [ { "name": "Dharalion", "chance": 42.0 } ], "timestamp": "t" }"#,
        ).unwrap();
        let template = "<html><head><title>%%%WORLD%%%</title></head><body>%%%DATA%%%</body></html>";
        let (path, rep) = generate_world("Testia", template, &data_root.to_string_lossy(), &out_root.to_string_lossy(), false).unwrap();
        assert!(path.ends_with("testia.html"));
        assert_eq!(rep.bosses.len(), 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<title>Testia</title>"));
        assert!(written.contains("Bosses to check"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn generate_world_fails_on_missing_data() {
        let dir = std::env::temp_dir().join("bosswatch_missing_test");
        let _ = std::fs::create_dir_all(&dir);
        let err = generate_world("Nowhere", "%%%DATA%%%", &dir.to_string_lossy(), &dir.to_string_lossy(), false).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_worlds_lists_and_title_cases_directories() {
        let dir = std::env::temp_dir().join("bosswatch_worlds_test");
        std::fs::create_dir_all(dir.join("vunira")).unwrap();
        std::fs::create_dir_all(dir.join("premia")).unwrap();
        std::fs::write(dir.join("notes.txt"), "x").unwrap();
        let worlds = discover_worlds(&dir.to_string_lossy()).unwrap();
        assert_eq!(worlds, vec!["Premia".to_string(), "Vunira".to_string()]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_worlds_fails_when_empty() {
        let dir = std::env::temp_dir().join("bosswatch_empty_test");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(discover_worlds(&dir.to_string_lossy()).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
