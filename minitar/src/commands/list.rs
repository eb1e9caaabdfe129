use std::path::PathBuf;

use anyhow::{Context, Result};
use minitar_format::EntryInfo;

pub fn run(archive: PathBuf, verbose: bool, json: bool) -> Result<()> {
    let context = || format!("Failed to list archive `{}`", archive.display());

    if json {
        let entries = minitar_format::list_entries(&archive).with_context(context)?;
        let value = entries.iter().map(to_json).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if verbose {
        let entries = minitar_format::list_entries(&archive).with_context(context)?;
        for entry in entries.iter() {
            println!(
                "-{}  {:<17}  {:>10}  {:<20}  {}",
                mode_string(entry.mode),
                format!("{}/{}", entry.username, entry.groupname),
                size(entry.size),
                time(entry.mtime),
                entry.name,
            );
        }
    } else {
        for name in minitar_format::list(&archive).with_context(context)? {
            println!("{}", name);
        }
    }

    Ok(())
}

fn to_json(entry: &EntryInfo) -> serde_json::Value {
    serde_json::json!({
        "name": entry.name,
        "size": entry.size,
        "mode": format!("{:04o}", entry.mode),
        "uid": entry.uid,
        "gid": entry.gid,
        "owner": entry.username,
        "group": entry.groupname,
        "mtime": time(entry.mtime),
        "offset": entry.offset,
    })
}

macro_rules! add {
    ($ident:ident, $value:tt => $s:ident) => {
        if $ident {
            $s.push($value);
        } else {
            $s.push('-');
        }
    };
}

#[inline(always)]
fn mode_string(mode: u32) -> String {
    let or = (mode & 0o400) > 0;
    let ow = (mode & 0o200) > 0;
    let ox = (mode & 0o100) > 0;
    let gr = (mode & 0o040) > 0;
    let gw = (mode & 0o020) > 0;
    let gx = (mode & 0o010) > 0;
    let ar = (mode & 0o004) > 0;
    let aw = (mode & 0o002) > 0;
    let ax = (mode & 0o001) > 0;

    let mut s = String::new();
    add!(or, 'r' => s);
    add!(ow, 'w' => s);
    add!(ox, 'x' => s);
    add!(gr, 'r' => s);
    add!(gw, 'w' => s);
    add!(gx, 'x' => s);
    add!(ar, 'r' => s);
    add!(aw, 'w' => s);
    add!(ax, 'x' => s);

    s
}

#[inline(always)]
fn size(bytes: u64) -> String {
    use humansize::{file_size_opts as options, FileSize};

    bytes
        .file_size(options::BINARY)
        .unwrap_or_else(|_| bytes.to_string())
}

#[inline(always)]
fn time(mtime: u64) -> String {
    let time = std::time::UNIX_EPOCH + std::time::Duration::new(mtime, 0);
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
