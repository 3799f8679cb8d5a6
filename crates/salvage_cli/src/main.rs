//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `salvage_core` linkage.
//! - Run one compatibility search against a configured catalog.
//!
//! Usage: `salvage_cli [CONFIG [PROP_EXPR [TYPE [NAME]]]]`

use salvage_core::{
    find_compatible, init_logging, merge_peers, open_db, CoreConfig, Federation, PartQuery,
    PartSearchService, PeerRepository, SqliteLocationRepository, SqlitePartRepository,
    SqlitePeerRepository, TemplateRegistry,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("salvage_core ping={}", salvage_core::ping());
    println!("salvage_core version={}", salvage_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(config_path) = args.first() else {
        return ExitCode::SUCCESS;
    };
    let arg = |index: usize| args.get(index).map(String::as_str).unwrap_or("");

    match run_search(config_path, arg(1), arg(2), arg(3)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_search(
    config_path: &str,
    prop_expression: &str,
    type_name: &str,
    name: &str,
) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::load(config_path)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let registry = TemplateRegistry::load_dir(&config.templates_dir, config.strict_types)?;
    println!("templates loaded={}", registry.len());

    let conn = open_db(&config.db_path)?;
    let query = PartQuery::parse(type_name, name, prop_expression)?;
    let search = PartSearchService::new(
        SqlitePartRepository::try_new(&conn)?,
        SqliteLocationRepository::try_new(&conn)?,
    );

    let federation = if config.federation.enabled {
        let stored = SqlitePeerRepository::try_new(&conn)?.list_peers()?;
        let peers = merge_peers(config.federation.peers(), stored);
        Some(Federation::from_peers(peers, config.federation.timeout())?)
    } else {
        None
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let hits = runtime.block_on(find_compatible(&search, federation.as_ref(), &query))?;

    for hit in &hits {
        println!(
            "#{} [{}] {} type={} location={} props={}",
            hit.id,
            hit.source,
            hit.name,
            hit.type_name,
            hit.location.as_deref().unwrap_or("-"),
            hit.props.len()
        );
    }
    println!("results={}", hits.len());
    Ok(())
}
