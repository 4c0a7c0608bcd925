mod cli;

use plexsync::{
    cleanup::{self, Confirm, NoConfirm, TerminalConfirm},
    config::{self, Config},
    error::{AppError, AppResult},
    filter::{NameFilter, RenameTemplate},
    migrate::{self, CollectionOptions, MetadataOptions, MigrateOptions, PlaylistOptions},
    plex::{MediaServer, PlexAccount, PlexClient, PlexTvSignIn},
    scanner,
    shares::{self, CodePrompt, SyncOptions, TerminalPrompt},
};

use clap::Parser;
use cli::{Cli, Commands, MigrateArgs, ScanArgs, ShareArgs};

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive the level from the flags
    let quiet = matches!(&cli.command, Commands::ScanSd(args) if args.is_quiet());
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.debug {
            "plexsync=debug".to_string()
        } else if quiet {
            "plexsync=warn".to_string()
        } else {
            "plexsync=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let code = match run(cli) {
        Ok(()) => plexsync::error::EXIT_OK,
        Err(e) => {
            tracing::error!("{:#}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> AppResult<()> {
    let mut config = config::resolve_config(cli.config.as_deref())?;
    if cli.insecure {
        config.http.verify_tls = false;
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)?;

    let result = rt.block_on(async move {
        tokio::select! {
            result = dispatch(cli.command, config) => result,
            _ = tokio::signal::ctrl_c() => Err(AppError::Interrupted),
        }
    });
    // A prompt may still be waiting on its blocking thread.
    rt.shutdown_background();
    result
}

async fn dispatch(command: Commands, config: Config) -> AppResult<()> {
    match command {
        Commands::ScanSd(args) => scan_sd(args, config).await,
        Commands::SyncShares(args) => sync_shares(args, config).await,
        Commands::Migrate(args) => migrate(args, config).await,
    }
}

async fn connect(url: &str, token: &str, config: &Config) -> AppResult<PlexClient> {
    PlexClient::connect(url, token, &config.http)
        .await
        .map_err(|e| AppError::connection(url, e))
}

async fn scan_sd(args: ScanArgs, mut config: Config) -> AppResult<()> {
    if args.url.is_some() {
        config.server.url = args.url.clone();
    }
    if args.token.is_some() {
        config.server.token = args.token.clone();
    }
    let (url, token) = config.server.credentials().ok_or_else(|| {
        AppError::missing_credentials(
            "Missing PLEX_URL or PLEX_API_TOKEN. Create a .env file or export the variables.",
        )
    })?;
    let server = connect(url, token, &config).await?;

    let section = scanner::find_section(&server, &args.library).await?;
    tracing::info!(
        "Scanning library {} ({}) for SD videos",
        section.title,
        section.kind
    );

    let rows = scanner::scan_section(&server, &section, args.threshold).await?;
    let paths = scanner::unique_paths(&rows);

    if args.deletes() {
        if paths.is_empty() {
            tracing::info!("No SD file paths found to delete.");
            return Ok(());
        }
        let confirm: Box<dyn Confirm> = if args.delete_no_confirm {
            println!("Deleting files without confirmation. Use with care.");
            Box::new(NoConfirm)
        } else {
            Box::new(TerminalConfirm)
        };
        // Prompts block; keep them off the runtime thread so Ctrl-C is seen.
        let targets = paths.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            cleanup::delete_paths(&targets, confirm.as_ref())
        })
        .await
        .map_err(anyhow::Error::from)??;
        println!("Deleted {} of {} file(s).", outcome.deleted, paths.len());

        if let Some(csv) = &args.csv {
            scanner::write_paths_csv(csv, &paths)
                .map_err(|e| AppError::output(csv.display(), e))?;
            tracing::info!("Wrote CSV of targeted paths to {}", csv.display());
        }
        return Ok(());
    }

    if args.paths_only {
        for path in &paths {
            println!("{}", path);
        }
        if let Some(csv) = &args.csv {
            scanner::write_paths_csv(csv, &paths)
                .map_err(|e| AppError::output(csv.display(), e))?;
        }
        return Ok(());
    }

    if rows.is_empty() {
        tracing::info!("No SD items found.");
        return Ok(());
    }

    for row in &rows {
        println!("{}", scanner::format_row(row));
    }
    tracing::info!("Found {} SD items", rows.len());

    if let Some(csv) = &args.csv {
        scanner::write_rows_csv(csv, &rows).map_err(|e| AppError::output(csv.display(), e))?;
        tracing::info!("Wrote CSV to {}", csv.display());
    }

    Ok(())
}

/// Look up a server by resource name and open a verified connection.
async fn connect_named(account: &PlexAccount, name: &str, config: &Config) -> AppResult<PlexClient> {
    let resource = account.resource(name).await?;
    account
        .connect(&resource, &config.http)
        .await
        .map_err(|e| AppError::connection(format!("server '{}'", name), e))
}

async fn sync_shares(args: ShareArgs, config: Config) -> AppResult<()> {
    let mut account_config = config.account.clone();
    if let Some(source) = args.source {
        account_config.source_server = source;
    }
    if let Some(dest) = args.dest {
        account_config.dest_server = dest;
    }
    if args.mfa_code.is_some() {
        account_config.mfa_code = args.mfa_code;
    }

    let sign_in = PlexTvSignIn::new(&account_config, &config.http)?;
    let prompt: Option<&dyn CodePrompt> = if args.non_interactive {
        None
    } else {
        Some(&TerminalPrompt)
    };
    let token = shares::authenticate(&sign_in, &account_config, prompt).await?;
    let account = PlexAccount::new(&token, &account_config, &config.http)?;

    let source = connect_named(&account, &account_config.source_server, &config).await?;
    let dest = connect_named(&account, &account_config.dest_server, &config).await?;

    println!("Source server: {} ({})", source.name(), source.machine_id());
    println!("Destination server: {} ({})", dest.name(), dest.machine_id());
    if args.apply {
        println!("Mode: APPLY changes");
    } else {
        println!("Mode: DRY RUN (no changes will be made)");
    }

    let opts = SyncOptions {
        apply: args.apply,
        only_users: args.only_user,
    };
    let summary =
        shares::sync_shares(&account, source.machine_id(), dest.machine_id(), &opts).await?;
    println!("\n{}", summary);
    Ok(())
}

fn migrate_options(args: &MigrateArgs, config: &Config) -> AppResult<MigrateOptions> {
    let playlists = if args.no_playlists {
        None
    } else {
        Some(PlaylistOptions {
            filter: NameFilter::new(args.include.as_deref(), args.exclude.as_deref())?,
            materialize_smart: args.materialize_smart,
            rename: RenameTemplate::new(&args.rename_template),
            replace: args.replace,
            batch_size: args.batch_size.unwrap_or(config.migrate.batch_size),
            dry_run: args.dry_run,
        })
    };

    let collections = if args.collections {
        Some(CollectionOptions {
            filter: NameFilter::new(
                args.collection_include.as_deref(),
                args.collection_exclude.as_deref(),
            )?,
            rename: RenameTemplate::new(&args.collection_rename_template),
            replace: args.replace,
            dry_run: args.dry_run,
        })
    } else {
        None
    };

    let metadata = if args.sync_metadata {
        let fields: Vec<String> = args
            .fields
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Some(MetadataOptions {
            fields: if fields.is_empty() {
                config.migrate.fields.clone()
            } else {
                fields
            },
            artwork: args.artwork,
            lock_fields: args.lock_fields,
            filter: NameFilter::new(args.meta_include.as_deref(), args.meta_exclude.as_deref())?,
            dry_run: args.dry_run,
        })
    } else {
        None
    };

    Ok(MigrateOptions {
        playlists,
        collections,
        metadata,
    })
}

async fn migrate(args: MigrateArgs, mut config: Config) -> AppResult<()> {
    if args.source_url.is_some() {
        config.source.url = args.source_url.clone();
    }
    if args.source_token.is_some() {
        config.source.token = args.source_token.clone();
    }
    if args.dest_url.is_some() {
        config.dest.url = args.dest_url.clone();
    }
    if args.dest_token.is_some() {
        config.dest.token = args.dest_token.clone();
    }

    let (source_url, source_token) = config.source.credentials().ok_or_else(|| {
        AppError::missing_credentials(
            "Source URL and token are required. Use --source-url and --source-token or set SRC_PLEX_URL and SRC_PLEX_TOKEN.",
        )
    })?;
    let (dest_url, dest_token) = config.dest.credentials().ok_or_else(|| {
        AppError::missing_credentials(
            "Destination URL and token are required. Use --dest-url and --dest-token or set DEST_PLEX_URL and DEST_PLEX_TOKEN.",
        )
    })?;

    let opts = migrate_options(&args, &config)?;

    tracing::info!("Connecting to source Plex...");
    let source = connect(source_url, source_token, &config).await?;
    tracing::info!("Connecting to destination Plex...");
    let dest = connect(dest_url, dest_token, &config).await?;

    if args.dry_run {
        tracing::info!("Dry run: nothing will be written to '{}'", dest.name());
    }

    let summary = migrate::run(&source, &dest, &opts).await?;
    for line in summary.lines() {
        println!("{}", line);
    }
    Ok(())
}
