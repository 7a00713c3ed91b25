use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use arkmod::archive::{pack_file, unpack_file};
use arkmod::install::{parse_mod_id, write_mod_file, InstallError, Installer, Server};
use arkmod::steamcmd::SteamCmd;

mod cli;
use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::Config;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Parse the cli
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), InstallError> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Unpack { src, dst } => {
            let dst = match dst {
                Some(d) => d,
                None if src.extension().map_or(false, |e| e == "z") => src.with_extension(""),
                None => {
                    return Err(InstallError::Usage(format!(
                        "{} has no .z extension, give a destination",
                        src.display()
                    )))
                }
            };
            unpack_file(&src, &dst)?;
        }
        Commands::Pack {
            src,
            dst,
            chunk_size,
        } => {
            let dst = dst.unwrap_or_else(|| {
                let mut name = OsString::from(src.as_os_str());
                name.push(".z");
                PathBuf::from(name)
            });
            pack_file(&src, &dst, chunk_size)?;
        }
        Commands::Modfile { dir, mod_id } => {
            write_mod_file(&dir, parse_mod_id(&mod_id)?)?;
        }
        Commands::Install {
            modids,
            update,
            preserve,
            namefile,
            steamcmd,
            workingdir,
        } => {
            if modids.is_empty() && !update {
                return Err(InstallError::Usage(
                    "no mod id given and --update not selected".to_string(),
                ));
            }

            let working_dir = match workingdir.or(config.working_dir) {
                Some(d) => d,
                None => env::current_dir()?,
            };
            let server = Server::open(&working_dir)?;

            let steamcmd = SteamCmd::locate(
                steamcmd.or(config.steamcmd).as_deref(),
                server.root(),
                config.app_id,
            )
            .ok_or(InstallError::SteamCmdNotFound)?;

            if !(preserve || config.preserve) {
                steamcmd.clear_cache();
            }

            let installer = Installer::new(server, steamcmd, namefile || config.name_file);

            let mut mods = Vec::new();
            if update {
                let installed = installer.server().installed_mods()?;
                if installed.is_empty() {
                    info!("No installed mods found, skipping update");
                }
                mods.extend(installed);
            }
            mods.extend(modids);

            let mut failed = 0;
            for mod_id in mods.iter() {
                match installer.install(mod_id) {
                    Ok(_) => info!("Mod {} installation finished", mod_id),
                    Err(e) => {
                        warn!("There was a problem installing mod {}: {}", mod_id, e);
                        failed += 1;
                    }
                }
            }

            if failed > 0 {
                return Err(InstallError::Incomplete {
                    failed,
                    total: mods.len(),
                });
            }
        }
    }
    Ok(())
}
