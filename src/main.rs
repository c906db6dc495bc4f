use clap::Parser;
use env_logger::Env;
use repocat::cli::{Args, SubCommand};
use repocat::context::Context;
use repocat::download::Download;
use repocat::errors::*;
use repocat::package::Group;
use repocat::repos::Repos;
use repocat::state::State;
use repocat::store::remote::StoreRemote;
use repocat::store::Store;
use repocat::array::ContinueOnError;
use repocat::{array, config, metadata};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "/etc/repocat/repocat.conf";

fn main() {
    let args = Args::parse();
    let log_level = match args.verbose {
        0 => "repocat=info",
        1 => "info,repocat=debug",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(err) = try_main(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main(args: Args) -> Result<()> {
    let config = config::Config::new();
    let profile = args.profile.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if profile.exists() {
        config.set_filename(Some(&profile))?;
    }
    let ctx = Context::from_config(config)?;

    let download = Arc::new(Download::new(
        ctx.config.get_duration("connection_timeout")?,
        None,
        ctx.config.get_bool("network")?,
    )?);
    let cache_root = PathBuf::from(ctx.config.get_string("cachedir")?);
    let reposdir = PathBuf::from(ctx.config.get_string("reposdir")?);
    let retries = ctx.config.get_uint("retries")? as u32;
    let metadata_expire = ctx.config.get_duration("metadata_expire")?;

    let repos = Repos::new(cache_root, download.clone(), retries, metadata_expire);
    let remotes: Vec<Arc<StoreRemote>> = if reposdir.is_dir() {
        repos.load_dir(&reposdir)?.into_iter().map(Arc::new).collect()
    } else {
        Vec::new()
    };

    let state = State::root();

    match args.subcommand {
        SubCommand::Repolist => {
            for remote in &remotes {
                println!("{}\t{}", remote.id(), if remote.enabled() { "enabled" } else { "disabled" });
            }
            return Ok(());
        }
        SubCommand::Clean => {
            for remote in &remotes {
                if let Err(e) = remote.clean() {
                    warn!("{}: {e}", remote.id());
                }
            }
            return Ok(());
        }
        _ => {}
    }

    refresh_enabled(&remotes, &state);

    let mut stores: Vec<Store> = vec![Store::Local(ctx.rpmdb.clone())];
    stores.extend(remotes.iter().cloned().map(Store::Remote));
    let array = array::StoreArray::new(stores);

    match args.subcommand {
        SubCommand::Download { name, output_dir } => {
            let path = array.download(&name, &output_dir, &state)?;
            println!("{}", path.display());
        }
        SubCommand::GetPackages => {
            for pkg in array.get_packages(&ContinueOnError)? {
                println!("{}", pkg.nevra());
            }
        }
        SubCommand::GetFiles { name } => {
            for path in ctx.rpmdb.query_files(&name)? {
                println!("{path}");
            }
        }
        SubCommand::Resolve { name } => {
            println!("{}", array.resolve(&name, &ContinueOnError)?.nevra());
        }
        SubCommand::SearchName { needle } => {
            for pkg in array.search_name(&needle, &ContinueOnError)? {
                println!("{}", pkg.nevra());
            }
        }
        SubCommand::SearchDetails { needle } => {
            for pkg in array.search_details(&needle, &ContinueOnError)? {
                println!("{}\t{}", pkg.nevra(), pkg.summary);
            }
        }
        SubCommand::SearchFile { path } => {
            for pkg in array.search_file(&path, &ContinueOnError)? {
                println!("{}", pkg.nevra());
            }
        }
        SubCommand::SearchGroup { group } => {
            let group =
                Group::from_str(&group).map_err(|e| Error::Malformed(format!("invalid group `{group}`: {e}")))?;
            for pkg in array.search_group(group, &ContinueOnError)? {
                println!("{}", pkg.nevra());
            }
        }
        SubCommand::WhatProvides { name } => {
            for pkg in array.what_provides(&name, &ContinueOnError)? {
                println!("{}", pkg.nevra());
            }
        }
        SubCommand::GetDepends { name } => {
            let pkg = array.resolve(&name, &ContinueOnError)?;
            for dep in array.get_depends(&pkg, &ContinueOnError)? {
                println!("{}", dep.nevra());
            }
        }
        SubCommand::GetDetails { name } => {
            let pkg = array.resolve(&name, &ContinueOnError)?;
            println!("name: {}", pkg.name());
            println!("evr: {}", pkg.evr());
            println!("arch: {}", pkg.arch());
            println!("source: {}", pkg.source());
            println!("summary: {}", pkg.summary);
            println!("license: {}", pkg.license);
            println!("url: {}", pkg.url);
            println!("size: {}", pkg.size);
        }
        SubCommand::GetUpdates => {
            let advisories = collect_advisories(&remotes);
            let basearch = ctx.config.get_string("basearch")?;
            for update in array.get_updates(&advisories, &basearch, &ContinueOnError)? {
                let security = if update.is_security() { " [security]" } else { "" };
                println!("{} -> {}{}", update.installed.nevra(), update.available.nevra(), security);
            }
        }
        SubCommand::Repolist | SubCommand::Clean => unreachable!("handled above"),
    }
    Ok(())
}

/// Loads metadata for every enabled remote, logging and skipping a store
/// that fails rather than aborting the whole command (spec §7: a
/// per-store failure during fan-out is reported against that store's id
/// and iteration continues).
fn refresh_enabled(remotes: &[Arc<StoreRemote>], state: &Arc<State>) {
    for remote in remotes {
        if !remote.enabled() {
            continue;
        }
        if let Err(e) = remote.refresh(state) {
            warn!("{}: {e}", remote.id());
        }
    }
}

fn collect_advisories(remotes: &[Arc<StoreRemote>]) -> Vec<metadata::updateinfo::Advisory> {
    let mut advisories = Vec::new();
    for remote in remotes {
        if let Some(handle) = remote.handle(metadata::MetadataKind::Updateinfo) {
            if let Ok(xml) = std::fs::read_to_string(&handle.local_path) {
                if let Ok(mut parsed) = metadata::updateinfo::parse(&xml) {
                    advisories.append(&mut parsed);
                }
            }
        }
    }
    advisories
}
