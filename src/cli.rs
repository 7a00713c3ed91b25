use std::fs;
use std::path::{Path, PathBuf};
use serde::Deserialize;

use clap::{Parser, Subcommand};

use arkmod::archive::DEFAULT_CHUNK_SIZE;
use arkmod::install::InstallError;
use arkmod::steamcmd::ARK_APP_ID;

#[derive(Parser)]
#[command(name = "arkmod")]
#[command(about = "Download and install ARK workshop mods on a dedicated server")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Unpack a single .z archive
    Unpack {
        src: PathBuf,
        /// Defaults to the source without its .z extension
        dst: Option<PathBuf>,
    },

    /// Pack a file into a .z archive
    Pack {
        src: PathBuf,
        /// Defaults to the source with .z appended
        dst: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Write the .mod file of an extracted mod directory
    Modfile {
        dir: PathBuf,
        mod_id: String,
    },

    /// Download mods through SteamCMD and install them on the server
    Install {
        /// IDs of the mods to download
        #[arg(long, num_args = 1..)]
        modids: Vec<String>,

        /// Update the mods already installed on the server
        #[arg(long)]
        update: bool,

        /// Don't delete the SteamCMD content between runs
        #[arg(long)]
        preserve: bool,

        /// Create a <map>.txt file holding the mod id
        #[arg(long)]
        namefile: bool,

        /// Path to SteamCMD
        #[arg(long)]
        steamcmd: Option<PathBuf>,

        /// Game server home directory, the current directory otherwise
        #[arg(long)]
        workingdir: Option<PathBuf>,
    },
}

// Configuration, command line flags win over it
#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub steamcmd: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub app_id: u32,
    pub preserve: bool,
    pub name_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            steamcmd: None,
            working_dir: None,
            app_id: ARK_APP_ID,
            preserve: false,
            name_file: false,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config, InstallError> {
        match path {
            None => Ok(Config::default()),
            Some(p) => Ok(toml::from_str(&fs::read_to_string(p)?)?),
        }
    }
}
