// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Triton CLI entrypoint.
//!
//! Thin harness over the editor core: list, fetch, publish, delete and watch
//! posts in the configured repository. Repository coordinates are remembered
//! in the state directory after first use; the bearer token comes from
//! `TRITON_TOKEN` and is never persisted. `--demo` runs against a seeded
//! in-memory repository instead of the network.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use triton::format::file_meta;
use triton::format::slug::POSTS_DIR;
use triton::model::{newest_first_posts, Post};
use triton::ops::{self, PublishOptions};
use triton::remote::{ContentHost, GithubHost, MemoryHost, RepoCoordinates};
use triton::store::{SlotStore, CONFIG_SLOT};
use triton::sync::{ListingWatcher, SyncEvent};

const TOKEN_ENV: &str = "TRITON_TOKEN";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 60;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--state-dir <dir>] [--repo <owner/name>] [--branch <name>] [--demo] <command>\n\nCommands:\n  check                          verify repository access\n  list                           newest-first listing of {POSTS_DIR}\n  show <path>                    fetch a post and print the raw document\n  publish <file> [--overwrite]   publish a local document through the protocol\n  delete <path> --yes            delete a remote post\n  watch [--interval <secs>]      poll the listing and print change events\n\nRepository coordinates are remembered in the state directory after first\nuse. The bearer token is read from {TOKEN_ENV}; without it only read\ncommands work. --demo swaps the network for a seeded in-memory repository."
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Check,
    List,
    Show { path: String },
    Publish { file: String, overwrite: bool },
    Delete { path: String, yes: bool },
    Watch { interval_secs: u64 },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    state_dir: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
    demo: bool,
    command: Option<Command>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state-dir" => {
                if options.state_dir.is_some() {
                    return Err(());
                }
                options.state_dir = Some(args.next().ok_or(())?);
            }
            "--repo" => {
                if options.repo.is_some() {
                    return Err(());
                }
                options.repo = Some(args.next().ok_or(())?);
            }
            "--branch" => {
                if options.branch.is_some() {
                    return Err(());
                }
                options.branch = Some(args.next().ok_or(())?);
            }
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "check" | "list" | "show" | "publish" | "delete" | "watch" => {
                if options.command.is_some() {
                    return Err(());
                }
                options.command = Some(parse_command(&arg, &mut args)?);
            }
            _ => return Err(()),
        }
    }

    if options.command.is_none() {
        return Err(());
    }

    Ok(options)
}

fn parse_command(
    name: &str,
    args: &mut impl Iterator<Item = String>,
) -> Result<Command, ()> {
    match name {
        "check" => expect_no_more(args).map(|()| Command::Check),
        "list" => expect_no_more(args).map(|()| Command::List),
        "show" => {
            let path = args.next().ok_or(())?;
            expect_no_more(args)?;
            Ok(Command::Show { path })
        }
        "publish" => {
            let file = args.next().ok_or(())?;
            let mut overwrite = false;
            for arg in args.by_ref() {
                match arg.as_str() {
                    "--overwrite" if !overwrite => overwrite = true,
                    _ => return Err(()),
                }
            }
            Ok(Command::Publish { file, overwrite })
        }
        "delete" => {
            let path = args.next().ok_or(())?;
            let mut yes = false;
            for arg in args.by_ref() {
                match arg.as_str() {
                    "--yes" if !yes => yes = true,
                    _ => return Err(()),
                }
            }
            Ok(Command::Delete { path, yes })
        }
        "watch" => {
            let mut interval_secs = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--interval" if interval_secs.is_none() => {
                        let raw = args.next().ok_or(())?;
                        let secs: u64 = raw.parse().map_err(|_| ())?;
                        if secs == 0 {
                            return Err(());
                        }
                        interval_secs = Some(secs);
                    }
                    _ => return Err(()),
                }
            }
            Ok(Command::Watch {
                interval_secs: interval_secs.unwrap_or(DEFAULT_WATCH_INTERVAL_SECS),
            })
        }
        _ => Err(()),
    }
}

fn expect_no_more(args: &mut impl Iterator<Item = String>) -> Result<(), ()> {
    match args.next() {
        Some(_) => Err(()),
        None => Ok(()),
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".triton"))
        .unwrap_or_else(|| PathBuf::from(".triton"))
}

fn resolve_coordinates(
    slots: &SlotStore,
    options: &CliOptions,
) -> Result<RepoCoordinates, Box<dyn Error>> {
    let saved: Option<RepoCoordinates> = slots
        .read(CONFIG_SLOT)
        .and_then(|raw| serde_json::from_str(&raw).ok());

    let coordinates = match (&options.repo, saved) {
        (Some(repo), saved) => {
            let (owner, name) = repo
                .split_once('/')
                .ok_or("--repo expects <owner/name>")?;
            if owner.is_empty() || name.is_empty() {
                return Err("--repo expects <owner/name>".into());
            }
            let branch = options
                .branch
                .clone()
                .or(saved.map(|config| config.branch))
                .unwrap_or_else(|| DEFAULT_BRANCH.to_owned());
            RepoCoordinates {
                owner: owner.to_owned(),
                repo: name.to_owned(),
                branch,
            }
        }
        (None, Some(mut saved)) => {
            if let Some(branch) = &options.branch {
                saved.branch = branch.clone();
            }
            saved
        }
        (None, None) => {
            return Err("no repository configured; pass --repo <owner/name>".into());
        }
    };

    if let Ok(json) = serde_json::to_string(&coordinates) {
        slots.write(CONFIG_SLOT, &json);
    }
    Ok(coordinates)
}

async fn run_command<H: ContentHost>(
    host: &H,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Check => {
            let info = host.repo_info().await?;
            println!("connected: {}", info.full_name);
        }
        Command::List => {
            let entries = host.list_dir(POSTS_DIR).await?.unwrap_or_default();
            let posts = newest_first_posts(entries);
            if posts.is_empty() {
                println!("no posts");
                return Ok(());
            }
            for entry in posts {
                let meta = file_meta(&entry.path);
                let date = if meta.date.is_empty() { "-".to_owned() } else { meta.date };
                println!("{date}  {}  {}", entry.content_hash, entry.path);
            }
        }
        Command::Show { path } => {
            let file = host
                .get_file(&path)
                .await?
                .ok_or_else(|| format!("'{path}' was not found remotely"))?;
            print!("{}", file.content);
        }
        Command::Publish { file, overwrite } => {
            let raw = std::fs::read_to_string(&file)?;
            let mut post = ops::post_from_document(&file, &raw);

            let options = PublishOptions {
                overwrite_target: overwrite,
            };
            let published = ops::publish(&mut post, host, &options).await?;
            let verb = if published.created { "created" } else { "updated" };
            println!("{verb} {} @ {}", published.path, published.hash);
            if let Some(leftover) = published.leftover {
                eprintln!("warning: {leftover}");
            }
        }
        Command::Delete { path, yes } => {
            if !yes {
                return Err("pass --yes to confirm deletion".into());
            }
            let mut post = Post::new();
            post.bind(path, None);
            let deleted = ops::delete(&mut post, host).await?;
            println!("deleted {deleted}");
        }
        Command::Watch { interval_secs } => {
            let watcher = ListingWatcher::new(Duration::from_secs(interval_secs));
            let (events, mut incoming) = mpsc::channel(8);

            let printer = async {
                while let Some(event) = incoming.recv().await {
                    match event {
                        SyncEvent::Changed { entries } => {
                            println!("listing changed ({} posts):", entries.len());
                            for entry in entries {
                                println!("  {} @ {}", entry.path, entry.content_hash);
                            }
                        }
                        SyncEvent::Checked { at } => println!("unchanged (checked {at})"),
                        SyncEvent::Failed { message } => eprintln!("poll failed: {message}"),
                    }
                }
            };

            tokio::select! {
                _ = watcher.run(host, events) => {}
                _ = printer => {}
            }
        }
    }
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();

        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "triton".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };
        let command = options.command.clone().expect("command parsed");

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        if options.demo {
            let host = MemoryHost::seeded();
            return runtime.block_on(run_command(&host, command));
        }

        let state_dir = options
            .state_dir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(default_state_dir);
        let slots = SlotStore::new(state_dir);
        let coordinates = resolve_coordinates(&slots, &options)?;
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());

        let host = GithubHost::new(coordinates, token);
        runtime.block_on(run_command(&host, command))
    })();

    if let Err(err) = result {
        eprintln!("triton: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, Command};

    fn parse(args: &[&str]) -> Result<super::CliOptions, ()> {
        parse_options(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn rejects_empty_args() {
        parse(&[]).unwrap_err();
    }

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse(&["check"]).unwrap().command, Some(Command::Check));
        assert_eq!(parse(&["list"]).unwrap().command, Some(Command::List));
    }

    #[test]
    fn parses_global_flags_before_the_command() {
        let options = parse(&[
            "--state-dir",
            "/tmp/state",
            "--repo",
            "someone/site",
            "--branch",
            "main",
            "list",
        ])
        .unwrap();
        assert_eq!(options.state_dir.as_deref(), Some("/tmp/state"));
        assert_eq!(options.repo.as_deref(), Some("someone/site"));
        assert_eq!(options.branch.as_deref(), Some("main"));
        assert_eq!(options.command, Some(Command::List));
    }

    #[test]
    fn parses_demo_flag() {
        let options = parse(&["--demo", "list"]).unwrap();
        assert!(options.demo);
    }

    #[test]
    fn parses_show_with_path() {
        let options = parse(&["show", "_posts/2024-01-05-x.md"]).unwrap();
        assert_eq!(
            options.command,
            Some(Command::Show {
                path: "_posts/2024-01-05-x.md".to_owned()
            })
        );
    }

    #[test]
    fn parses_publish_with_overwrite() {
        let options = parse(&["publish", "post.md", "--overwrite"]).unwrap();
        assert_eq!(
            options.command,
            Some(Command::Publish {
                file: "post.md".to_owned(),
                overwrite: true
            })
        );

        let options = parse(&["publish", "post.md"]).unwrap();
        assert_eq!(
            options.command,
            Some(Command::Publish {
                file: "post.md".to_owned(),
                overwrite: false
            })
        );
    }

    #[test]
    fn parses_delete_with_confirmation_flag() {
        let options = parse(&["delete", "_posts/x.md", "--yes"]).unwrap();
        assert_eq!(
            options.command,
            Some(Command::Delete {
                path: "_posts/x.md".to_owned(),
                yes: true
            })
        );
    }

    #[test]
    fn parses_watch_interval() {
        let options = parse(&["watch", "--interval", "5"]).unwrap();
        assert_eq!(options.command, Some(Command::Watch { interval_secs: 5 }));

        let options = parse(&["watch"]).unwrap();
        assert_eq!(options.command, Some(Command::Watch { interval_secs: 60 }));
    }

    #[test]
    fn rejects_zero_watch_interval() {
        parse(&["watch", "--interval", "0"]).unwrap_err();
    }

    #[test]
    fn rejects_missing_operands_and_unknown_flags() {
        parse(&["show"]).unwrap_err();
        parse(&["publish"]).unwrap_err();
        parse(&["delete"]).unwrap_err();
        parse(&["--repo"]).unwrap_err();
        parse(&["--nope", "list"]).unwrap_err();
        parse(&["list", "extra"]).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags_and_commands() {
        parse(&["--demo", "--demo", "list"]).unwrap_err();
        parse(&["--repo", "a/b", "--repo", "c/d", "list"]).unwrap_err();
        parse(&["list", "check"]).unwrap_err();
        parse(&["publish", "f.md", "--overwrite", "--overwrite"]).unwrap_err();
    }
}
