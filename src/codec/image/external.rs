//! Stages backed by external optimizer binaries.
//!
//! Each binary reads the image on stdin and writes the result to stdout.
//! A binary that is not installed fails the file, not the run.

use crate::codec::CodecError;
use crate::utils::exec::Cmd;

pub fn gifsicle(input: &[u8], level: u8, interlaced: bool) -> Result<Vec<u8>, CodecError> {
    let cmd = Cmd::new("gifsicle")
        .arg(format!("-O{level}"))
        .arg(if interlaced { "--interlace" } else { "" })
        .stdin(input);
    run("gifsicle", cmd)
}

pub fn pngquant(input: &[u8], quality: (u8, u8), speed: u8) -> Result<Vec<u8>, CodecError> {
    let (min, max) = quality;
    let cmd = Cmd::new("pngquant")
        .arg(format!("--quality={min}-{max}"))
        .args(["--speed", &speed.to_string(), "-"])
        .stdin(input);
    run("pngquant", cmd)
}

pub fn jpegtran(input: &[u8], progressive: bool) -> Result<Vec<u8>, CodecError> {
    let cmd = Cmd::new("jpegtran")
        .args(["-copy", "none", "-optimize"])
        .arg(if progressive { "-progressive" } else { "" })
        .stdin(input);
    run("jpegtran", cmd)
}

fn run(codec: &'static str, cmd: Cmd) -> Result<Vec<u8>, CodecError> {
    let output = cmd
        .run()
        .map_err(|e| CodecError::failed(codec, format!("{e:#}")))?;
    if output.stdout.is_empty() {
        return Err(CodecError::failed(codec, "produced no output"));
    }
    Ok(output.stdout)
}
