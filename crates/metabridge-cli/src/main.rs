//! Metabridge Command-Line Tool
//!
//! Validates type mapping tables and shows the catalog queries a search
//! compiles to, without contacting a catalog.

mod commands;
mod formatter;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formatter::OutputFormat;
use metabridge_core::MappingTable;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Metabridge Command-Line Tool
#[derive(Parser, Debug)]
#[command(name = "metabridge")]
#[command(version, about = "Catalog to open-metadata mapping tool")]
pub struct Args {
    /// Output format
    #[arg(long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a mapping table and list the types it maps
    Inspect {
        /// Mapping table (JSON)
        mapping: PathBuf,
    },

    /// Compile an entity search into catalog queries
    Compile {
        /// Mapping table (JSON)
        mapping: PathBuf,

        /// Open-metadata entity type to search
        #[arg(short = 't', long)]
        type_name: Option<String>,

        /// Match property as name=value (repeatable)
        #[arg(short = 'p', long = "property", value_parser = commands::parse_property)]
        properties: Vec<(String, String)>,

        /// Match any property instead of all
        #[arg(long)]
        any: bool,

        /// Free-text value search; overrides match properties
        #[arg(short = 'v', long, conflicts_with = "properties")]
        value: Option<String>,

        /// First result to return
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Results per page; 0 is unlimited
        #[arg(long, default_value_t = 0)]
        page_size: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("metabridge=info,metabridge_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(args.format);
    match args.command {
        Command::Inspect { mapping } => {
            let table = MappingTable::from_path(&mapping)?;
            info!(path = %mapping.display(), records = table.len(), "Mapping table is valid");
            println!("{}", formatter.format_mapping(&commands::inspect(&table))?);
        }
        Command::Compile {
            mapping,
            type_name,
            properties,
            any,
            value,
            from,
            page_size,
        } => {
            let table = MappingTable::from_path(&mapping)?;
            let request = commands::SearchRequest {
                type_name,
                properties,
                any,
                value,
                from,
                page_size,
            };
            println!("{}", formatter.format_plan(&commands::compile(&table, &request))?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_compile() {
        let args = Args::try_parse_from([
            "metabridge",
            "compile",
            "map.json",
            "-t",
            "RelationalTable",
            "-p",
            "owner=finance",
            "-p",
            "name=orders",
            "--page-size",
            "5",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        match args.command {
            Command::Compile {
                type_name,
                properties,
                page_size,
                value,
                ..
            } => {
                assert_eq!(type_name.as_deref(), Some("RelationalTable"));
                assert_eq!(
                    properties,
                    vec![
                        ("owner".to_string(), "finance".to_string()),
                        ("name".to_string(), "orders".to_string()),
                    ]
                );
                assert_eq!(page_size, 5);
                assert_eq!(value, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_value_conflicts_with_properties() {
        let parsed = Args::try_parse_from([
            "metabridge",
            "compile",
            "map.json",
            "-p",
            "owner=finance",
            "-v",
            "orders",
        ]);
        assert!(parsed.is_err());
    }
}
