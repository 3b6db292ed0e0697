use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser as ClapParser, Subcommand};
use serde::Serialize;

use saverest::config::app_config::{AppConfig, AppConfigReader};
use saverest::fixtures;
use saverest::subsystem::resources::player::Megaset;
use saverest::subsystem::save_state::{ObjectHub, PlayerSnapshot};
use saverest::{Nls, SaveHeader, SaveManager};

#[derive(ClapParser, Debug)]
#[command(version, about = "Inspect and manage save slots")]
struct Args {
    /// JSON configuration, created with defaults when missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save directory, overrides the configuration
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Description encoding, overrides the configuration
    #[arg(short, long)]
    lang: Option<Nls>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List populated slots
    List,
    /// Dump a slot's header as YAML, without validating it
    Show { slot: u16 },
    /// Check a slot's checksum and globals length
    Verify {
        slot: u16,
        #[arg(long, default_value_t = fixtures::DEMO_GLOBALS_LEN as u32)]
        var_length: u32,
    },
    /// Delete a slot file
    Delete { slot: u16 },
    /// Write a save of the built-in demo world
    Demo {
        slot: u16,
        #[arg(short = 'm', long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, Serialize)]
struct HeaderSummary {
    slot: u16,
    file: String,
    description: String,
    checksum: String,
    var_length: u32,
    screen_id: u32,
    run_list_id: u32,
    feet_x: u32,
    feet_y: u32,
    music_id: u32,
    megaset: String,
    player_hub: ObjectHub,
    player: PlayerSnapshot,
}

impl HeaderSummary {
    fn new(saves: &SaveManager, slot: u16, header: &SaveHeader) -> Self {
        Self {
            slot,
            file: saves.get_save_path(slot).display().to_string(),
            description: header.description(saves.nls()),
            checksum: format!("0x{:08X}", header.checksum),
            var_length: header.var_length,
            screen_id: header.screen_id,
            run_list_id: header.run_list_id,
            feet_x: header.feet_x,
            feet_y: header.feet_y,
            music_id: header.music_id,
            megaset: format!("{:?}", Megaset::from(header.player.mega.megaset_res)),
            player_hub: header.player_hub,
            player: header.player,
        }
    }
}

fn app_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfigReader::read_or_create_default(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.dir {
        config.save_config.save_dir = dir.clone();
    }
    if let Some(lang) = args.lang {
        config.save_config.nls = lang;
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = app_config(&args)?;
    let saves = saverest::boot(&config);

    match args.command {
        Command::List => {
            let slots = saves.list_saves();
            log::debug!("list: {} populated slots", slots.len());
            if slots.is_empty() {
                println!("no saves in {}", saves.save_dir().display());
            }
            for info in slots {
                println!("{:03}  {}", info.slot, info.description);
            }
        }
        Command::Show { slot } => {
            let header = saves.read_header(slot)?;
            let summary = HeaderSummary::new(&saves, slot, &header);
            print!("{}", serde_yaml::to_string(&summary)?);
        }
        Command::Verify { slot, var_length } => match saves.verify_slot(slot, var_length) {
            Ok(header) => println!("slot {}: OK \"{}\"", slot, header.description(saves.nls())),
            Err(e) => {
                log::warn!("verify: slot {} rejected: {}", slot, e);
                bail!("slot {}: {} ({})", slot, e.code(), e)
            }
        },
        Command::Delete { slot } => {
            saves.delete_save(slot)?;
            log::info!("delete: {}", saves.get_save_path(slot).display());
            println!("slot {} deleted", slot);
        }
        Command::Demo { slot, description } => {
            let mut game = fixtures::demo_world(config.save_config.clone())?;
            game.save_game(slot, &description)?;
            log::debug!("demo: {} bytes per save", game.find_buffer_size()?);
            println!("wrote {}", saves.get_save_path(slot).display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path, rest: &[&str]) -> Args {
        let dir = dir.to_str().unwrap();
        let mut argv = vec!["savetool", "--dir", dir];
        argv.extend_from_slice(rest);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_lang() {
        let args = Args::try_parse_from(["savetool", "-l", "sjis", "list"]).unwrap();
        assert_eq!(args.lang, Some(Nls::ShiftJIS));
        assert!(Args::try_parse_from(["savetool", "-l", "klingon", "list"]).is_err());
    }

    #[test]
    fn test_demo_show_verify_delete() {
        let dir = tempfile::tempdir().unwrap();
        run(args(dir.path(), &["demo", "3", "-m", "Before bridge"])).unwrap();
        assert!(dir.path().join("savegame.003").is_file());

        run(args(dir.path(), &["list"])).unwrap();
        run(args(dir.path(), &["show", "3"])).unwrap();
        run(args(dir.path(), &["verify", "3"])).unwrap();
        assert!(run(args(dir.path(), &["verify", "3", "--var-length", "100"])).is_err());

        run(args(dir.path(), &["delete", "3"])).unwrap();
        assert!(!dir.path().join("savegame.003").exists());
        assert!(run(args(dir.path(), &["show", "3"])).is_err());
    }

    #[test]
    fn test_list_and_delete_on_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        run(args(dir.path(), &["list"])).unwrap();
        assert!(run(args(dir.path(), &["delete", "7"])).is_err());
    }

    #[test]
    fn test_summary_yaml() {
        let saves = SaveManager::default();
        let mut header = SaveHeader::default();
        header.set_description("Quay", Nls::Latin1);
        header.player.mega.megaset_res = 1366;
        header.checksum = 0xBEEF;

        let yaml = serde_yaml::to_string(&HeaderSummary::new(&saves, 1, &header)).unwrap();
        assert!(yaml.contains("description: Quay"));
        assert!(yaml.contains("checksum: '0x0000BEEF'") || yaml.contains("checksum: 0x0000BEEF"));
        assert!(yaml.contains("megaset: NicoA"));
    }
}
