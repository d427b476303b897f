/// Styled terminal output for run results
use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use terrastl_core::StlFormat;

use crate::args::USAGE;
use crate::{Inspection, RunOutcome};

fn format_name(format: StlFormat) -> &'static str {
    match format {
        StlFormat::Ascii => "ASCII",
        StlFormat::Binary => "binary",
    }
}

fn label<W: Write>(out: &mut W, color: Color, text: &str) -> io::Result<()> {
    queue!(out, SetForegroundColor(color), Print(text), ResetColor)
}

pub fn print_outcome<W: Write>(out: &mut W, outcome: &RunOutcome) -> io::Result<()> {
    match outcome {
        RunOutcome::Saved {
            path,
            format,
            triangles,
            bytes,
        } => {
            label(out, Color::Green, "saved")?;
            queue!(
                out,
                Print(format!(
                    " {} ({} STL, {} triangles, {} bytes)\n",
                    path.display(),
                    format_name(*format),
                    triangles,
                    bytes
                ))
            )?;
        }
        RunOutcome::Empty => {
            label(out, Color::Yellow, "warning")?;
            queue!(out, Print(": nothing to export, no file written\n"))?;
        }
    }
    out.flush()
}

pub fn print_inspection<W: Write>(out: &mut W, inspection: &Inspection) -> io::Result<()> {
    label(out, Color::Cyan, &inspection.path.display().to_string())?;
    queue!(
        out,
        Print(format!(
            "\n  name:   {}\n  facets: {}\n",
            inspection.name.as_deref().unwrap_or("-"),
            inspection.facets
        ))
    )?;

    if let Some((min, max)) = &inspection.bounds {
        queue!(
            out,
            Print(format!(
                "  bounds: ({}, {}, {}) .. ({}, {}, {})\n",
                min.x, min.y, min.z, max.x, max.y, max.z
            ))
        )?;
    }
    out.flush()
}

pub fn print_usage<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, Print(USAGE), Print("\n"))?;
    out.flush()
}
