#[macro_use]
extern crate arrayref;

use std::env;
use std::fs::File;
use std::io;
use std::io::Read;
use std::process;

use zinc_arm7::{disassemble_arm, disassemble_thumb};

struct Options {
    filename: String,
    thumb: bool,
    base: u32,
}

fn usage() -> ! {
    eprintln!("usage: disasm <file> [--thumb] [--base <hex address>]");
    process::exit(2);
}

fn parse_args() -> Options {
    let mut args = env::args().skip(1);
    let mut filename = None;
    let mut thumb = false;
    let mut base = 0x0800_0000;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--thumb" => thumb = true,
            "--base" => {
                let value = args.next().unwrap_or_else(|| usage());
                let digits = value.trim_start_matches("0x");
                base = u32::from_str_radix(digits, 16).unwrap_or_else(|_| usage());
            }
            _ if filename.is_none() => filename = Some(arg),
            _ => usage(),
        }
    }
    Options {
        filename: filename.unwrap_or_else(|| usage()),
        thumb,
        base,
    }
}

fn main() -> Result<(), io::Error> {
    let opts = parse_args();
    let mut file = File::open(&opts.filename)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    if opts.thumb {
        for (i, chunk) in data.chunks_exact(2).enumerate() {
            let addr = opts.base.wrapping_add(i as u32 * 2);
            let half = u16::from_le_bytes(*array_ref![chunk, 0, 2]);
            println!("{:08x}: {:04x}     {}", addr, half, disassemble_thumb(half, addr));
        }
    } else {
        for (i, chunk) in data.chunks_exact(4).enumerate() {
            let addr = opts.base.wrapping_add(i as u32 * 4);
            let word = u32::from_le_bytes(*array_ref![chunk, 0, 4]);
            println!("{:08x}: {:08x} {}", addr, word, disassemble_arm(word, addr));
        }
    }
    Ok(())
}
