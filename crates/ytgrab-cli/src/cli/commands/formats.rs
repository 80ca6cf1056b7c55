//! `ytgrab formats`: print the format code table.

use anyhow::Result;
use ytgrab_core::format::Format;

pub fn run_formats(code: Option<&str>) -> Result<()> {
    match code {
        Some(code) => {
            let format: Format = code.parse()?;
            if let Some(info) = format.info() {
                println!("{}", info);
            }
        }
        None => {
            println!("code ext   res      codecs       kind");
            for info in Format::all() {
                println!("{}", info);
            }
        }
    }
    Ok(())
}
