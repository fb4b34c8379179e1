//! pacebar - CLI entry point
//!
//! Renders Claude usage pace gauges as a menu-bar icon PNG, either on a
//! timer (`run`), once (`once`), or from hand-entered numbers (`preview`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pacebar::app::{self, PreviewInput};
use pacebar::config::{default, xdg, Config, ConfigLoader};
use pacebar::gauge::raster::{is_valid_scale, Palette, Theme, MAX_SCALE};
use pacebar::logging;
use pacebar::sink::FileSink;

/// Menu-bar pace gauges for Claude usage
#[derive(Parser)]
#[command(name = "pacebar")]
#[command(version, about = "Menu-bar pace gauges for Claude usage windows")]
struct Cli {
    /// Configuration file (defaults to the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the pacebar CLI
#[derive(Subcommand)]
enum Commands {
    /// Refresh on a timer until interrupted (SIGUSR1 refreshes immediately)
    Run,

    /// Refresh once, write the icon, and print the detail view
    Once {
        /// Print the detail view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render hand-entered usage without fetching
    Preview {
        /// 5-hour utilization percentage
        #[arg(long, default_value_t = 0.0)]
        five_hour: f64,
        /// 7-day utilization percentage
        #[arg(long, default_value_t = 0.0)]
        seven_day: f64,
        /// Time until the 5-hour window resets (e.g. "2h 10m")
        #[arg(long, value_parser = humantime::parse_duration)]
        five_hour_reset: Option<Duration>,
        /// Time until the 7-day window resets (e.g. "3days")
        #[arg(long, value_parser = humantime::parse_duration)]
        seven_day_reset: Option<Duration>,
        /// Cumulative overage in cents
        #[arg(long, default_value_t = 0.0)]
        extra_cents: f64,
        /// Overage since today's baseline, in cents
        #[arg(long, default_value_t = 0.0)]
        delta_cents: f64,
        /// Output PNG path
        #[arg(long, default_value = "pacebar-preview.png")]
        out: PathBuf,
        /// Also write popover gauges and detail text to this directory
        #[arg(long)]
        popover_dir: Option<PathBuf>,
        /// Device pixels per point (at most 8)
        #[arg(long, default_value_t = 2.0, value_parser = parse_scale)]
        scale: f64,
        /// Menu bar appearance: dark or light
        #[arg(long, default_value = "dark", value_parser = parse_theme)]
        theme: Theme,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate,
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    match s.to_ascii_lowercase().as_str() {
        "dark" => Ok(Theme::Dark),
        "light" => Ok(Theme::Light),
        other => Err(format!("unknown theme '{other}', expected dark or light")),
    }
}

fn parse_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s.parse().map_err(|e| format!("invalid scale '{s}': {e}"))?;
    if is_valid_scale(scale) {
        Ok(scale)
    } else {
        Err(format!(
            "scale {scale} out of range, expected greater than 0 and at most {MAX_SCALE}"
        ))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => run_config_command(action, cli.config.as_deref()),
        Commands::Run => with_config(cli.config.as_deref(), |config| {
            app::run(&config).map_err(|e| e.to_string())
        }),
        Commands::Once { json } => with_config(cli.config.as_deref(), |config| {
            let view = app::once(&config).map_err(|e| e.to_string())?;
            if json {
                let out = serde_json::to_string_pretty(&view).map_err(|e| e.to_string())?;
                println!("{out}");
            } else {
                println!("{view}");
            }
            Ok(())
        }),
        Commands::Preview {
            five_hour,
            seven_day,
            five_hour_reset,
            seven_day_reset,
            extra_cents,
            delta_cents,
            out,
            popover_dir,
            scale,
            theme,
        } => {
            let input = PreviewInput {
                five_hour_pct: five_hour,
                seven_day_pct: seven_day,
                five_hour_reset,
                seven_day_reset,
                extra_usage_cents: extra_cents,
                overage_delta_cents: delta_cents,
            };
            let mut sink = FileSink::new(out.clone(), Palette::for_theme(theme), scale);
            if let Some(dir) = popover_dir {
                sink = sink.with_popover_dir(dir);
            }
            match app::preview(&input, &mut sink) {
                Ok(view) => {
                    println!("{view}");
                    println!("Wrote {}", out.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Load configuration, initialise logging, then run `f`.
fn with_config<F>(path: Option<&Path>, f: F) -> ExitCode
where
    F: FnOnce(Config) -> Result<(), String>,
{
    let config = match ConfigLoader::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config.log) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    match f(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_config_command(action: ConfigAction, path: Option<&Path>) -> ExitCode {
    let result = match action {
        ConfigAction::Init { force } => default::create_default_config(force).map(|path| {
            println!("Created configuration at {}", path.display());
        }),
        ConfigAction::Path => {
            let shown = path.map(Path::to_path_buf).unwrap_or_else(xdg::config_path);
            println!("{}", shown.display());
            Ok(())
        }
        ConfigAction::Validate => ConfigLoader::load(path).map(|config| {
            println!("Configuration is valid");
            println!("{config:#?}");
        }),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses() {
        let cli = Cli::try_parse_from(["pacebar", "run"]).expect("run should parse");
        assert!(matches!(cli.command, Commands::Run));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["pacebar", "once", "--config", "/tmp/p.toml"])
            .expect("--config after subcommand should parse");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
    }

    #[test]
    fn test_once_json_parses() {
        let cli = Cli::try_parse_from(["pacebar", "once", "--json"]).expect("should parse");
        match cli.command {
            Commands::Once { json } => assert!(json),
            _ => panic!("expected Once command"),
        }
    }

    #[test]
    fn test_preview_parses_durations_and_theme() {
        let cli = Cli::try_parse_from([
            "pacebar",
            "preview",
            "--five-hour",
            "72",
            "--five-hour-reset",
            "2h 10m",
            "--theme",
            "light",
        ])
        .expect("preview should parse");
        match cli.command {
            Commands::Preview {
                five_hour,
                five_hour_reset,
                seven_day_reset,
                theme,
                out,
                ..
            } => {
                assert_eq!(five_hour, 72.0);
                assert_eq!(five_hour_reset, Some(Duration::from_secs(7800)));
                assert_eq!(seven_day_reset, None);
                assert_eq!(theme, Theme::Light);
                assert_eq!(out, PathBuf::from("pacebar-preview.png"));
            }
            _ => panic!("expected Preview command"),
        }
    }

    #[test]
    fn test_preview_rejects_bad_duration() {
        let result = Cli::try_parse_from(["pacebar", "preview", "--five-hour-reset", "later"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_preview_rejects_unknown_theme() {
        let result = Cli::try_parse_from(["pacebar", "preview", "--theme", "sepia"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_preview_scale_must_be_in_range() {
        for bad in ["1e6", "0", "-1", "NaN", "inf", "big"] {
            let result = Cli::try_parse_from(["pacebar", "preview", "--scale", bad]);
            assert!(result.is_err(), "--scale {bad} should be rejected");
        }
        let cli = Cli::try_parse_from(["pacebar", "preview", "--scale", "8"])
            .expect("upper bound is inclusive");
        match cli.command {
            Commands::Preview { scale, .. } => assert_eq!(scale, 8.0),
            _ => panic!("expected Preview command"),
        }
    }

    #[test]
    fn test_config_init_force_parses() {
        let cli = Cli::try_parse_from(["pacebar", "config", "init", "--force"])
            .expect("config init --force should parse");
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { force },
            } => assert!(force),
            _ => panic!("expected Config Init"),
        }
    }

    #[test]
    fn test_config_without_action_fails() {
        assert!(Cli::try_parse_from(["pacebar", "config"]).is_err());
    }
}
