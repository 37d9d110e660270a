use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agroadmin", bin_name = "agroadmin", version)]
#[command(
    about = "Back-office tooling for the agribusiness directory: archive, recycle bin, purge, contact import",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to $AGROADMIN_HOME, then the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Which lifecycle view to list.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(multiple = false)]
pub struct ViewArgs {
    /// Show archived records
    #[arg(long)]
    pub archived: bool,

    /// Show the recycle bin
    #[arg(long)]
    pub deleted: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a collection (active records by default)
    #[command(alias = "ls")]
    List {
        /// Collection name, e.g. presentations, documents, products
        collection: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Toggle records between active and archived (`1` archives, `a1` unarchives)
    Archive {
        collection: String,

        /// Indexes (e.g. 1 a2 1-3) or a title search
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Move records to the recycle bin
    #[command(alias = "rm")]
    Delete {
        collection: String,

        /// Indexes (e.g. 1 a2 1-3) or a title search
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Bring records back from the recycle bin
    Restore {
        collection: String,

        /// Bin indexes (e.g. 1 or d1, 1-3) or a title search
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Permanently remove records from the recycle bin
    Purge {
        collection: String,

        /// Bin indexes (e.g. 1 or d1, 1-3) or a title search
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Permanently remove everything in a collection's recycle bin
    EmptyBin {
        collection: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Import contacts from a .csv, .xlsx or .xls file
    Import {
        file: PathBuf,
    },

    /// Show which lifecycle features a collection's table supports
    Probe {
        collection: String,
    },

    /// Distance between two points, or the companies nearest to one
    Distance {
        /// Origin as "lat,lng"
        #[arg(allow_hyphen_values = true)]
        origin: String,

        /// Destination as "lat,lng"; omit to rank companies instead
        #[arg(allow_hyphen_values = true)]
        destination: Option<String>,

        /// How many companies to show when ranking
        #[arg(long, default_value_t = agroadmin::api::DEFAULT_NEAREST_LIMIT)]
        limit: usize,
    },

    /// Print a map search link for a place
    Map {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Provision the default tables and config in the data directory
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_views() {
        let cli = Cli::try_parse_from(["agroadmin", "list", "products", "--deleted"]).unwrap();
        match cli.command {
            Commands::List { collection, view } => {
                assert_eq!(collection, "products");
                assert!(view.deleted && !view.archived);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["agroadmin", "list", "products", "--deleted", "--archived"])
            .is_err());
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["agroadmin", "distance", "-23.55,-46.63", "-22.9,-47.06"]).unwrap();
        match cli.command {
            Commands::Distance {
                origin,
                destination,
                limit,
            } => {
                assert_eq!(origin, "-23.55,-46.63");
                assert_eq!(destination.as_deref(), Some("-22.9,-47.06"));
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "agroadmin",
            "purge",
            "products",
            "1",
            "--yes",
            "--data-dir",
            "/tmp/x",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }
}
