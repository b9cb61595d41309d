//! Command line of `ha-server`.

use clap::{Parser, Subcommand};
use ha_02_contagion_filter::FilterKind;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::container::ServerConfig;

/// Epidose health authority server
#[derive(Parser, Debug)]
#[command(name = "ha-server", version)]
#[command(about = "Collects contagious seeds and serves the contagion filter")]
pub struct Cli {
    /// Run in debug mode (enables GET /shutdown)
    #[arg(short, long)]
    pub debug: bool,

    /// Database file
    #[arg(short = 'D', long)]
    pub database: Option<PathBuf>,

    /// Filter file served to clients
    #[arg(short, long)]
    pub filter: Option<PathBuf>,

    /// Address to bind to
    #[arg(short, long = "server-name")]
    pub server_name: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Membership structure to publish (cuckoo or bloom)
    #[arg(long)]
    pub filter_kind: Option<FilterKind>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a single-use reporting token signed with the configured secret
    IssueToken {
        /// Hours until the token expires
        #[arg(long, default_value_t = 72)]
        ttl_hours: i64,
    },
}

impl Cli {
    /// Flags override whatever the environment set.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(path) = &self.database {
            config.storage.database = path.clone();
        }
        if let Some(path) = &self.filter {
            config.storage.filter = path.clone();
        }
        if let Some(host) = self.server_name {
            config.network.host = host;
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(kind) = self.filter_kind {
            config.filter.kind = kind;
        }
        config.debug |= self.debug;
        config.verbose |= self.verbose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "ha-server", "-d", "-D", "/tmp/db", "-f", "/tmp/filter", "-s", "0.0.0.0", "-p", "80",
            "-v",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        cli.apply(&mut config);

        assert!(config.debug);
        assert!(config.verbose);
        assert_eq!(config.storage.database, PathBuf::from("/tmp/db"));
        assert_eq!(config.storage.filter, PathBuf::from("/tmp/filter"));
        assert_eq!(config.gateway().http_addr().to_string(), "0.0.0.0:80");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags_keep_env_values_when_absent() {
        let cli = Cli::try_parse_from(["ha-server"]).unwrap();
        let mut config = ServerConfig::default();
        config.network.port = 7000;
        cli.apply(&mut config);
        assert_eq!(config.network.port, 7000);
        assert!(!config.debug);
    }

    #[test]
    fn test_filter_kind() {
        let cli = Cli::try_parse_from(["ha-server", "--filter-kind", "bloom"]).unwrap();
        assert_eq!(cli.filter_kind, Some(FilterKind::Bloom));
        assert!(Cli::try_parse_from(["ha-server", "--filter-kind", "xor"]).is_err());
    }

    #[test]
    fn test_issue_token_subcommand() {
        let cli = Cli::try_parse_from(["ha-server", "issue-token", "--ttl-hours", "2"]).unwrap();
        assert_eq!(cli.command, Some(Command::IssueToken { ttl_hours: 2 }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
