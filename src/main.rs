use clap::Parser;
use promptdex::{
    CatalogDb,
    SearchField,
    cli::{Cli, Command, IndexAction, RepoAction, WeightsAction},
    error,
    import,
    mcp,
    scorer,
    search,
    settings,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("PROMPTDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let catalog = CatalogDb::open_default(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Repo { action } => match action {
            RepoAction::Add { name, location } => {
                repo_add(&catalog, &name, &location)?;
            }
            RepoAction::Remove { name } => {
                repo_remove(&catalog, &name)?;
            }
            RepoAction::List { json } => {
                repo_list(&catalog, json)?;
            }
        },
        Command::Index { action } => match action {
            IndexAction::Import { repo, files } => {
                let docs = import::load_catalog_files(&files)?;
                let count = import::import_documents(&catalog, &repo, docs)?;
                println!("Imported {count} template(s) into '{repo}'");
            }
            IndexAction::Status { json } => {
                cmd_status(&catalog, json)?;
            }
        },
        Command::Search(args) => {
            let weights = settings::load_weights(&catalog)?;
            let limit = settings::max_results(&catalog)?;
            let results =
                search::execute_search(&args, &catalog, weights, limit)?;

            if args.json {
                let query = args.query.as_deref().unwrap_or_default();
                println!("{}", search::format_json(&results, query)?);
            } else if args.ids {
                if !results.is_empty() {
                    println!("{}", search::format_ids(&results));
                }
            } else {
                println!("{}", search::format_human(&results));
            }
        }
        Command::Show(args) => {
            let doc = search::resolve_reference(&catalog, &args.reference)?;
            if args.json {
                println!("{}", serde_json::to_string(&doc)?);
            } else {
                print!("{}", search::format_document(&doc));
            }
        }
        Command::Weights { action } => match action {
            WeightsAction::Show { json } => {
                weights_show(&catalog, json)?;
            }
            WeightsAction::Set { field, value } => {
                let field: SearchField = field.parse()?;
                let weight = scorer::parse_weight(&value)?;
                settings::store_weight(&catalog, field, weight)?;
                println!("Set {field} weight to {weight}");
            }
            WeightsAction::Clear => {
                settings::clear_weights(&catalog)?;
                println!("Cleared stored weights");
            }
            WeightsAction::Limit { max_results } => {
                settings::store_max_results(&catalog, max_results)?;
                println!("Default max results set to {max_results}");
            }
        },
        Command::Mcp => {
            mcp::run_mcp(catalog)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn repo_add(
    catalog: &CatalogDb,
    name: &str,
    location: &str,
) -> error::Result<()> {
    if name.is_empty() || name.contains(['\0', ':']) {
        return Err(error::Error::Config(format!(
            "invalid repository name '{name}'"
        )));
    }

    // Check for duplicate repository name
    if catalog.get_repository(name)?.is_some() {
        return Err(error::Error::Config(format!(
            "repository '{name}' already exists"
        )));
    }

    catalog.set_repository(name, location)?;

    println!("Added repository '{name}' -> {location}");
    Ok(())
}

fn repo_remove(catalog: &CatalogDb, name: &str) -> error::Result<()> {
    if !catalog.remove_repository(name)? {
        return Err(error::Error::NotFound {
            kind: "repository",
            name: name.to_string(),
        });
    }
    println!("Removed repository '{name}'");
    Ok(())
}

fn repo_list(catalog: &CatalogDb, json: bool) -> error::Result<()> {
    let repos = catalog.list_repositories()?;

    if json {
        let items: Vec<_> = repos
            .iter()
            .map(|(name, location)| {
                serde_json::json!({ "name": name, "location": location })
            })
            .collect();
        println!("{}", serde_json::to_string(&items)?);
    } else if repos.is_empty() {
        println!("No repositories registered.");
    } else {
        for (name, location) in &repos {
            println!("{name}\t{location}");
        }
    }
    Ok(())
}

fn weights_show(catalog: &CatalogDb, json: bool) -> error::Result<()> {
    let weights = settings::load_weights(catalog)?;

    if json {
        println!("{}", serde_json::to_string(&weights)?);
    } else {
        for field in SearchField::ALL {
            println!("{field}\t{}", weights.get(field));
        }
    }
    Ok(())
}

fn cmd_status(catalog: &CatalogDb, json: bool) -> error::Result<()> {
    let repos = catalog.list_repositories()?;
    let docs = catalog.list_documents()?;

    if json {
        let status = serde_json::json!({
            "catalog": catalog.path(),
            "maxResults": settings::max_results(catalog)?,
            "repositories": repos.len(),
            "templates": docs.len(),
        });
        println!("{}", serde_json::to_string(&status)?);
    } else {
        println!("Catalog: {}", catalog.path().display());
        println!("Repositories: {}", repos.len());
        for (name, location) in &repos {
            let count = docs.iter().filter(|d| d.source_group == *name).count();
            println!("  {name}: {location} ({count} templates)");
        }
        let orphaned = docs
            .iter()
            .filter(|d| !repos.iter().any(|(name, _)| *name == d.source_group))
            .count();
        if orphaned > 0 {
            eprintln!(
                "Warning: {orphaned} template(s) belong to unregistered repositories"
            );
        }
        println!("Templates: {}", catalog.document_count()?);
    }
    Ok(())
}
