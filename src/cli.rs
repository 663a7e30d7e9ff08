use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::export::ExportFormat;
use crate::resources::Resource;

#[derive(Parser)]
#[command(name = "pb-admin")]
#[command(about = "Admin console for the power bank rental network: terminal dashboard and scriptable CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the terminal dashboard
    Tui,

    /// Store an access token (and optional CSRF token) in local storage
    Login {
        /// Bearer access token
        #[arg(short, long)]
        token: String,

        /// CSRF token sent with mutating requests
        #[arg(long)]
        csrf: Option<String>,
    },

    /// Remove stored tokens
    Logout,

    /// List the resources this console knows about
    Resources,

    /// List records of a resource
    List {
        /// Resource name, e.g. stations, discounts, late-fees
        resource: String,

        /// Page number (paginated resources only)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Search text
        #[arg(short, long)]
        search: Option<String>,

        /// Extra query filters as key=value
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Output format (table, csv, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show one record
    Show {
        resource: String,

        /// Record key (serial number for stations, id otherwise)
        key: String,
    },

    /// Create a record from key=value fields
    Create {
        resource: String,

        /// Field values as key=value
        #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Update a record; unspecified fields keep their current values
    Update {
        resource: String,

        key: String,

        /// Field values as key=value
        #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Delete a record
    Delete {
        resource: String,

        key: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Commands {
    pub fn parse_resource(resource: &str) -> Result<Resource> {
        Ok(resource.parse::<Resource>()?)
    }

    pub fn parse_format(format: &str) -> Result<ExportFormat> {
        format.parse()
    }

    /// `key=value` filter arguments
    pub fn parse_filters(filters: &[String]) -> Result<Vec<(String, String)>> {
        filters
            .iter()
            .map(|pair| {
                pair.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .filter(|(k, _)| !k.is_empty())
                    .ok_or_else(|| anyhow!("Expected key=value, got '{}'", pair))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_fields() {
        let cli = Cli::try_parse_from([
            "pb-admin", "create", "discounts", "-f", "discount_percent=25", "--field", "status=active",
        ])
        .unwrap();
        match cli.command {
            Commands::Create { resource, fields } => {
                assert_eq!(resource, "discounts");
                assert_eq!(fields, vec!["discount_percent=25", "status=active"]);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["pb-admin", "list", "stations"]).unwrap();
        match cli.command {
            Commands::List { page, format, search, .. } => {
                assert_eq!(page, 1);
                assert_eq!(format, "table");
                assert!(search.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_filters() {
        let parsed = Commands::parse_filters(&["status=active".to_string()]).unwrap();
        assert_eq!(parsed, vec![("status".to_string(), "active".to_string())]);
        assert!(Commands::parse_filters(&["=x".to_string()]).is_err());
        assert!(Commands::parse_filters(&["status".to_string()]).is_err());
        assert!(Commands::parse_resource("late-fees").is_ok());
        assert!(Commands::parse_resource("unicorns").is_err());
    }
}
