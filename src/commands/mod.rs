use std::path::{Path, PathBuf};

use lpkit::{Corpus, LocalStorage, LpkitConfig};

pub type CmdResult<T> = lpkit::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Corpus root: holds `lpkit.json` and the documents directory.
    pub root: PathBuf,
}

/// Everything a command needs to look at the corpus.
pub(crate) struct Workspace {
    pub config: LpkitConfig,
    pub storage: LocalStorage,
    pub corpus: Corpus,
}

impl Workspace {
    pub fn open(root: &Path) -> lpkit::Result<Self> {
        let config = LpkitConfig::load(root)?;
        let storage = LocalStorage::open(config.documents_path(root))?;
        let corpus = Corpus::load(&storage, &config)?;
        Ok(Self {
            config,
            storage,
            corpus,
        })
    }
}

pub mod index;
pub mod ranges;
pub mod refs;
pub mod renumber;
pub mod validate;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (lpkit::Result<serde_json::Value>, i32) {
    crate::tty::status("lpkit is working...");

    match command {
        crate::Commands::Validate(args) => dispatch!(args, global, validate),
        crate::Commands::Renumber(args) => dispatch!(args, global, renumber),
        crate::Commands::Index(args) => dispatch!(args, global, index),
        crate::Commands::Refs(args) => dispatch!(args, global, refs),
        crate::Commands::Ranges(args) => dispatch!(args, global, ranges),
    }
}
