/// Command-line parsing for the `terrastl` binary
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use terrastl_core::{StlFormat, TerrainKind};

use crate::config::{Overrides, RunConfig};

pub const USAGE: &str = "\
Usage: terrastl [OPTIONS]
       terrastl --inspect <FILE.stl>

Generate a terrain height-field and save it as an STL file.

Options:
  --width <N>          grid columns (>= 2)
  --height <N>         grid rows (>= 2)
  --max-height <F>     highest elevation (> 0)
  --kind <KIND>        flat, random, sine, hill or valley
  --scale <F>          elevation multiplier
  --cell-size <F>      spacing between grid vertices
  --seed <N>           seed for random terrain
  --binary             write binary STL
  --ascii              write ASCII STL (default)
  -o, --output <PATH>  destination file (default terrain.stl)
  --config <FILE>      JSON configuration; flags override it
  --inspect <FILE>     print a summary of an existing STL file
  -h, --help           show this message";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Export(ExportArgs),
    Inspect(PathBuf),
    Help,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportArgs {
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
}

impl ExportArgs {
    /// Loads the config file (if any) and applies the flags on top.
    pub fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        config.apply(&self.overrides);
        Ok(config)
    }
}

/// Parses arguments, without the program name.
pub fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut export = ExportArgs::default();
    let mut inspect = None;

    while let Some(arg) = args.next() {
        let o = &mut export.overrides;
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--binary" => o.format = Some(StlFormat::Binary),
            "--ascii" => o.format = Some(StlFormat::Ascii),
            "--width" => o.width = Some(value(&arg, args.next())?),
            "--height" => o.height = Some(value(&arg, args.next())?),
            "--max-height" => o.max_height = Some(value(&arg, args.next())?),
            "--kind" => o.kind = Some(value::<TerrainKind>(&arg, args.next())?),
            "--scale" => o.scale = Some(value(&arg, args.next())?),
            "--cell-size" => o.cell_size = Some(value(&arg, args.next())?),
            "--seed" => o.seed = Some(value(&arg, args.next())?),
            "-o" | "--output" => o.output = Some(value(&arg, args.next())?),
            "--config" => export.config = Some(value(&arg, args.next())?),
            "--inspect" => inspect = Some(value::<PathBuf>(&arg, args.next())?),
            other => bail!("unknown argument `{}`\n\n{}", other, USAGE),
        }
    }

    match inspect {
        Some(path) => Ok(Command::Inspect(path)),
        None => Ok(Command::Export(export)),
    }
}

fn value<T>(flag: &str, raw: Option<String>) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw.ok_or_else(|| anyhow!("`{}` expects a value", flag))?;
    raw.parse::<T>()
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("invalid value `{}` for `{}`", raw, flag))
}
