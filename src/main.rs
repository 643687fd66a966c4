// Disable console on Windows for non-dev builds.
#![cfg_attr(not(feature = "dev"), windows_subsystem = "windows")]

use bevy::prelude::*;
use clap::Parser;
use snake_jukebox::{cmdline::Args, AppPlugin};

fn main() -> AppExit {
    let args = Args::parse();
    match args.settings() {
        Ok(settings) => App::new().add_plugins(AppPlugin { settings }).run(),
        Err(err) => {
            eprintln!("snake-jukebox: {err}");
            AppExit::error()
        }
    }
}
