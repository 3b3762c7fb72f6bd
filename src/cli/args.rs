//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::paths::AssetCategory;

/// Asset pipeline for static sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Source directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Destination directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dist: Option<PathBuf>,

    /// Config file path (default: lathe.toml)
    #[arg(short = 'C', long, default_value = "lathe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Subcommand; `watch` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clean the destination and run every transform once
    #[command(visible_alias = "b")]
    Build,

    /// Build, then watch sources and serve the destination with live reload
    #[command(visible_alias = "w")]
    Watch {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Compile HTML pages only
    Html,

    /// Compile stylesheets only
    Css,

    /// Compile scripts only
    Js,

    /// Optimize images only
    Images,

    /// Rebuild the icon sprite only
    #[command(name = "svg-sprites", visible_alias = "sprites")]
    SvgSprites,

    /// Copy fonts only
    Fonts,

    /// Copy server pages only
    Php,
}

impl Commands {
    /// Category behind a single-task command, `None` for the composites.
    pub const fn category(&self) -> Option<AssetCategory> {
        match self {
            Self::Html => Some(AssetCategory::Markup),
            Self::Css => Some(AssetCategory::Styles),
            Self::Js => Some(AssetCategory::Scripts),
            Self::Images => Some(AssetCategory::Images),
            Self::SvgSprites => Some(AssetCategory::VectorIcons),
            Self::Fonts => Some(AssetCategory::Fonts),
            Self::Php => Some(AssetCategory::ServerPages),
            Self::Build | Self::Watch { .. } => None,
        }
    }
}
