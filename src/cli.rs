//! Command-line surface (spec §6): thin argument parsing only, no
//! business logic — everything here delegates to [`crate::array`],
//! [`crate::repos`] and [`crate::context`].
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "repocat", version, about = "Client-side repository metadata engine")]
pub struct Args {
    /// Increase logging output (can be used multiple times)
    #[arg(short, long, global = true, action(ArgAction::Count))]
    pub verbose: u8,
    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,
    #[command(subcommand)]
    pub subcommand: SubCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubCommand {
    /// Download a package's RPM to the current directory
    #[command(name = "download")]
    Download {
        name: String,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List every package visible across all enabled stores
    #[command(name = "getpackages")]
    GetPackages,
    /// List the files owned by an installed package
    #[command(name = "getfiles")]
    GetFiles { name: String },
    /// Resolve a name to exactly one package
    #[command(name = "resolve")]
    Resolve { name: String },
    /// Search package names for a substring
    #[command(name = "searchname")]
    SearchName { needle: String },
    /// Search names, summaries and descriptions for a substring
    #[command(name = "searchdetails")]
    SearchDetails { needle: String },
    /// Find packages owning a given file path
    #[command(name = "searchfile")]
    SearchFile { path: String },
    /// Find packages belonging to a given group
    #[command(name = "searchgroup")]
    SearchGroup { group: String },
    /// Find packages that provide a given name or file
    #[command(name = "whatprovides")]
    WhatProvides { name: String },
    /// List the packages a given package depends on
    #[command(name = "getdepends")]
    GetDepends { name: String },
    /// List configured repositories and whether they're enabled
    #[command(name = "repolist")]
    Repolist,
    /// Print the full record for a resolved package
    #[command(name = "getdetails")]
    GetDetails { name: String },
    /// Remove cached metadata for every remote store
    #[command(name = "clean")]
    Clean,
    /// List installed packages with a newer candidate available
    #[command(name = "get-updates")]
    GetUpdates,
}
