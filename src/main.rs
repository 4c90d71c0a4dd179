#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod prelude;
mod quantity;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command, perch, swoop},
    prelude::*,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Swoop(args) => swoop(&args).await,
        Command::Perch(args) => perch(&args).await,
    }
}
