//! Runtime context for CLI commands

use anyhow::{Context, Result};
use sf_core::{Config, Ledger};
use sf_db::DuckDbBackend;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Loaded project: configuration, ledger, and the selected target
pub(crate) struct RuntimeContext {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Every migration unit, in order
    pub ledger: Ledger,

    /// Target from `--target` or `SF_TARGET`
    pub target: Option<String>,
}

impl RuntimeContext {
    /// Load config and ledger from global arguments
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };

        let migrations_dir = config.migrations_path_absolute(&root);
        let ledger = Ledger::load(&migrations_dir).with_context(|| {
            format!("Failed to load migrations from {}", migrations_dir.display())
        })?;

        let target = Config::resolve_target(args.target.as_deref());

        Ok(Self {
            root,
            config,
            ledger,
            target,
        })
    }

    /// Open the database of the selected target.
    ///
    /// Relative file paths resolve against the project root.
    pub fn connect(&self) -> Result<DuckDbBackend> {
        let db_config = self
            .config
            .get_database_config(self.target.as_deref())
            .context("Failed to resolve database target")?;

        let opened = if db_config.path == ":memory:" {
            DuckDbBackend::in_memory()
        } else {
            DuckDbBackend::from_path(&self.root.join(&db_config.path))
        };
        let db = opened.context("Failed to connect to database")?;
        log::debug!("Connected to {} at {}", db_config.db_type, db_config.path);
        Ok(db)
    }

    /// Absolute path of the declared snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.config.snapshot_path_absolute(&self.root)
    }
}
