// CLI module - command-line argument parsing and handlers
//
// superdash [PAGE | --json FILE | --demo]        open the dashboard
// superdash state [PAGE | --json FILE | --demo]  print the initial state as JSON
// superdash config --show|--path|--reset|--edit|--update

use crate::bootstrap::BootstrapSource;
use crate::config::{Config, VERSION};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// superdash - terminal dashboard viewer
#[derive(Parser, Debug)]
#[command(name = "superdash")]
#[command(version = VERSION)]
#[command(about = "Render a dashboard from its bootstrap payload in the terminal", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where to read the bootstrap payload from
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct SourceArgs {
    /// HTML host page with the bootstrap element
    #[arg(value_name = "PAGE", conflicts_with_all = ["json", "demo"])]
    pub page: Option<PathBuf>,

    /// Raw JSON bootstrap payload
    #[arg(long, value_name = "FILE", conflicts_with = "demo")]
    pub json: Option<PathBuf>,

    /// Use the bundled demo dashboard
    #[arg(long)]
    pub demo: bool,
}

impl SourceArgs {
    pub fn resolve(&self) -> Result<BootstrapSource> {
        match (&self.page, &self.json, self.demo) {
            (Some(page), _, _) => Ok(BootstrapSource::Page(page.clone())),
            (None, Some(json), _) => Ok(BootstrapSource::Json(json.clone())),
            (None, None, true) => Ok(BootstrapSource::Demo),
            (None, None, false) => {
                bail!("No bootstrap source given. Pass a host PAGE, --json FILE or --demo")
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the derived initial state as JSON and exit
    State {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Rewrite config with the current layout (preserves user values)
        #[arg(long)]
        update: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle `config` flags
pub fn handle_config(show: bool, reset: bool, edit: bool, update: bool, path: bool) {
    if path {
        handle_config_path();
    } else if show {
        handle_config_show();
    } else if reset {
        handle_config_reset();
    } else if edit {
        handle_config_edit();
    } else if update {
        handle_config_update();
    } else {
        println!("Usage: superdash config [--show|--reset|--edit|--update|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --edit    Open config file in $EDITOR");
        println!("  --update  Rewrite config with the current layout (preserves user values)");
        println!("  --path    Show config file path");
    }
}

fn config_path_or_exit() -> PathBuf {
    match Config::config_path() {
        Some(path) => path,
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_path() {
    println!("{}", config_path_or_exit().display());
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    let path = config_path_or_exit();
    if path.exists() {
        println!("# Source: {}", path.display());
    } else {
        println!("# Source: defaults (no config file)");
    }
}

fn handle_config_reset() {
    let path = config_path_or_exit();

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    if let Err(e) = Config::default().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

fn handle_config_edit() {
    let path = config_path_or_exit();

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening {} with {}", path.display(), editor);

    match Command::new(&editor).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("Editor exited with status: {}", s);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to launch editor '{}': {}", editor, e);
            eprintln!("Set $EDITOR environment variable to your preferred editor");
            std::process::exit(1);
        }
    }
}

fn handle_config_update() {
    let path = config_path_or_exit();

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
        return;
    }

    let backup_path = path.with_extension("toml.bak");
    if let Err(e) = std::fs::copy(&path, &backup_path) {
        eprintln!("Warning: Could not create backup: {}", e);
    } else {
        println!("Backup created: {}", backup_path.display());
    }

    if let Err(e) = Config::from_file().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config updated with latest structure: {}", path.display());
    println!("Your values have been preserved.");
}
